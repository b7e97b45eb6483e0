use serde::Serialize;
use std::fmt;

/// A position inside a schema file.
///
/// Positions order by file name first, then line, then column, which is the
/// order errors are reported in.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Pos {
    pub file:   String,
    pub line:   usize,
    pub column: usize,
}

impl Pos {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Pos {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.file.is_empty() {
            write!(f, "{}:", self.file)?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_file() {
        let pos = Pos::new("foo.mprot", 3, 7);
        assert_eq!(pos.to_string(), "foo.mprot:3:7");
    }

    #[test]
    fn test_display_without_file() {
        let pos = Pos::new("", 12, 1);
        assert_eq!(pos.to_string(), "12:1");
    }

    #[test]
    fn test_ordering() {
        let a = Pos::new("a.mprot", 9, 9);
        let b = Pos::new("b.mprot", 1, 1);
        let c = Pos::new("b.mprot", 1, 2);
        assert!(a < b);
        assert!(b < c);
    }
}
