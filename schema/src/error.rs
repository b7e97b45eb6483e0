use crate::pos::Pos;
use std::fmt;
use thiserror::Error;

/// A single positioned error produced while tokenizing, parsing, resolving or
/// validating a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {text}")]
pub struct Error {
    pub pos:  Pos,
    pub text: String,
}

/// All recoverable errors collected for one or more schema files.
///
/// Every stage appends to the list instead of stopping at the first problem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<Error>);

impl ErrorList {
    pub fn new() -> Self {
        ErrorList(Vec::new())
    }

    pub fn add(&mut self, pos: Pos, text: impl Into<String>) {
        self.0.push(Error {
            pos,
            text: text.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Appends all errors of `other`.
    pub fn append(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    /// Sorts by position. The sort is stable, so errors at the same position
    /// keep the order they were reported in.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| a.pos.cmp(&b.pos));
    }

    pub fn texts(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.text.as_str()).collect()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("no errors"),
            1 => write!(f, "{}", self.0[0]),
            2 => write!(f, "{} (and 1 more error)", self.0[0]),
            n => write!(f, "{} (and {} more errors)", self.0[0], n - 1),
        }
    }
}

impl std::error::Error for ErrorList {}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error {
            pos:  Pos::new("file", 2, 4),
            text: "foobar".into(),
        };
        assert_eq!(err.to_string(), "file:2:4: foobar");
    }

    #[test]
    fn test_error_list_display() {
        let mut errs = ErrorList::new();
        assert_eq!(errs.to_string(), "no errors");
        assert!(errs.is_empty());

        errs.add(Pos::new("", 2, 4), "foo");
        assert_eq!(errs.to_string(), "2:4: foo");

        errs.add(Pos::new("", 3, 1), "bar");
        assert_eq!(errs.to_string(), "2:4: foo (and 1 more error)");

        errs.add(Pos::new("", 4, 3), "baz");
        assert_eq!(errs.to_string(), "2:4: foo (and 2 more errors)");
        assert_eq!(errs.len(), 3);
    }

    #[test]
    fn test_sort_by_file_line_column() {
        let mut errs = ErrorList::new();
        errs.add(Pos::new("b", 1, 1), "third");
        errs.add(Pos::new("a", 2, 1), "second");
        errs.add(Pos::new("a", 1, 5), "first");
        errs.sort();
        assert_eq!(errs.texts(), vec!["first", "second", "third"]);
    }
}
