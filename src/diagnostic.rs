use std::fmt::Display;

use crate::span::Location;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiagnosticKind {
    #[error("Invalid operator")]
    InvalidOperator,
    #[error("Unexpected character")]
    UnexpectedCharacter,
    #[error("Invalid floating point literal.")]
    InvalidFloat,
    #[error("Unexpected token\n    Wanted: {wanted}\n    Given:  {given}")]
    UnexpectedToken { wanted: String, given: String },
    #[error("Expected clause")]
    ExpectedClause,
    #[error("Unresolved type\n    Name: {0}")]
    UnresolvedType(String),
    #[error("Unresolved function\n    Pattern: {0}")]
    UnresolvedFunction(String),
    #[error("Type mismatch\n    Wanted: {wanted}\n    Given:  {given}")]
    TypeMismatch { wanted: String, given: String },
    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Location,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Renders the diagnostic with the offending source line and a caret
    /// under the error column.
    pub fn render(&self, source: &str) -> String {
        let mut pos = self.location.pos.min(source.len());
        // Errors at end of input point just past the last visible line.
        if source[pos..].trim().is_empty() {
            pos = source[..pos].trim_end().len();
        }
        let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[line_start..]
            .find(['\n', '\r'])
            .map_or(source.len(), |i| line_start + i);
        let full_line = &source[line_start..line_end];
        let line = full_line.trim_start();
        let indent = full_line.len() - line.len();

        let prefix = format!("{} ", self.location);
        let column = source
            .get(line_start + indent..pos)
            .map_or(0, |s| s.chars().count());
        let pad = " ".repeat(prefix.chars().count() + column);

        format!(
            "Compilation error: {}\n\n{prefix}{line}\n{pad}^\n",
            self.kind
        )
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

/// Ordered sink shared by every compilation phase.
#[derive(Debug, Default)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, location: Location, kind: DiagnosticKind) {
        tracing::debug!(%location, %kind, "diagnostic");
        self.list.push(Diagnostic { kind, location });
    }

    pub fn has_errors(&self) -> bool {
        !self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.list.first()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.list
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_render_points_at_column() {
        let source = "linje et\n    Print Q.\n";
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::InvalidOperator,
            location: Location {
                pos: 19,
                row: 1,
                col: 10,
                file: Rc::from("prog.dk"),
            },
        };
        let expected = "Compilation error: Invalid operator\n\nprog.dk(2:11) Print Q.\n                    ^\n";
        assert_eq!(diagnostic.render(source), expected);
    }

    #[test]
    fn test_render_end_of_input_uses_last_line() {
        let source = "Goddag.\n    Farvel\n";
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::InvalidOperator,
            location: Location {
                pos: source.len(),
                row: 2,
                col: 0,
                file: Rc::from("prog.dk"),
            },
        };
        let expected = "Compilation error: Invalid operator\n\nprog.dk(3:1) Farvel\n                   ^\n";
        assert_eq!(diagnostic.render(source), expected);
    }
}
