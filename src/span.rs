use std::{fmt::Display, rc::Rc};

/// A position in a source file. Rows and columns are zero based and counted
/// in bytes; they are rendered one based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pos: usize,
    pub row: usize,
    pub col: usize,
    pub file: Rc<str>,
}

impl Location {
    pub fn start(file: Rc<str>) -> Self {
        Self {
            pos: 0,
            row: 0,
            col: 0,
            file,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}:{})", self.file, self.row + 1, self.col + 1)
    }
}
