use std::fmt::Display;

use crate::span::Location;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClausePart<'src> {
    Word(&'src str),
    Literal(Literal),
    List(ClauseList<'src>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause<'src> {
    pub parts: Vec<ClausePart<'src>>,
    pub location: Location,
}

/// One or more clauses separated by `,` [og].
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseList<'src> {
    pub clauses: Vec<Clause<'src>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'src> {
    Declaration {
        name: &'src str,
        type_name: &'src str,
        location: Location,
    },
    Expression(ClauseList<'src>),
    If {
        condition: ClauseList<'src>,
        then: Vec<Statement<'src>>,
        otherwise: Option<Vec<Statement<'src>>>,
    },
    While {
        condition: ClauseList<'src>,
        body: Vec<Statement<'src>>,
    },
    Return(ClauseList<'src>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPart<'src> {
    pub name: &'src str,
    pub type_name: Option<&'src str>,
}

impl PatternPart<'_> {
    pub fn is_parameter(&self) -> bool {
        self.type_name.is_some()
    }
}

/// A function's call signature: words interleaved with typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern<'src> {
    pub parts: Vec<PatternPart<'src>>,
}

impl<'src> Pattern<'src> {
    /// Builds a pattern from the compact `word name:type word` notation used
    /// for builtin functions.
    pub fn from_spec(spec: &'src str) -> Self {
        let parts = spec
            .split_whitespace()
            .map(|part| match part.split_once(':') {
                Some((name, type_name)) => PatternPart {
                    name,
                    type_name: Some(type_name),
                },
                None => PatternPart {
                    name: part,
                    type_name: None,
                },
            })
            .collect();
        Self { parts }
    }

    pub fn parameters(&self) -> impl Iterator<Item = &PatternPart<'src>> {
        self.parts.iter().filter(|part| part.is_parameter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function<'src> {
    pub pattern: Pattern<'src>,
    pub return_type_name: &'src str,
    pub body: Vec<Statement<'src>>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module<'src> {
    pub functions: Vec<Function<'src>>,
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{value}"),
            Literal::Float(value) => {
                let text = value.to_string().replace('.', ",");
                if text.contains(',') {
                    write!(f, "{text}")
                } else {
                    write!(f, "{text},0")
                }
            }
            Literal::Boolean(true) => write!(f, "sand"),
            Literal::Boolean(false) => write!(f, "falsk"),
        }
    }
}

impl Display for ClausePart<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClausePart::Word(word) => write!(f, "{word}"),
            ClausePart::Literal(literal) => write!(f, "{literal}"),
            ClausePart::List(list) => write!(f, "({list})"),
        }
    }
}

impl Display for Clause<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl Display for ClauseList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", og ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

fn write_block(f: &mut std::fmt::Formatter<'_>, statements: &[Statement]) -> std::fmt::Result {
    writeln!(f, "Goddag.")?;
    for statement in statements {
        writeln!(f, "{statement}")?;
    }
    write!(f, "Farvel.")
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Declaration {
                name, type_name, ..
            } => write!(f, "Lad {name} være et {type_name}."),
            Statement::Expression(list) => write!(f, "{list}."),
            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                writeln!(f, "Hvis {condition}.")?;
                write_block(f, then)?;
                if let Some(otherwise) = otherwise {
                    writeln!(f, "\nEllers.")?;
                    write_block(f, otherwise)?;
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                writeln!(f, "Imens {condition}.")?;
                write_block(f, body)
            }
            Statement::Return(list) => write!(f, "Tilbagegiv {list}."),
        }
    }
}

impl Display for Pattern<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match part.type_name {
                Some(type_name) => write!(f, "({} som {type_name})", part.name)?,
                None => write!(f, "{}", part.name)?,
            }
        }
        Ok(())
    }
}

impl Display for Function<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Offentlig funktion {} tilbagegiver {}.",
            self.pattern, self.return_type_name
        )?;
        write_block(f, &self.body)
    }
}

impl Display for Module<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for function in &self.functions {
            writeln!(f, "{function}")?;
        }
        Ok(())
    }
}
