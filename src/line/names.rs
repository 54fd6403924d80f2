use crate::error::{LineError, line_err};

const fn is_control(c: char) -> bool {
    matches!(
        c,
        '\0' | '\u{0001}'
            | '\u{0002}'
            | '\u{0003}'
            | '\u{0004}'
            | '\u{0005}'
            | '\u{0006}'
            | '\u{0007}'
            | '\u{0008}'
            | '\u{0009}'
            | '\u{000b}'
            | '\u{000c}'
            | '\u{000e}'
            | '\u{000f}'
            | '\u{007f}'
            | '\r'
            | '\n'
    )
}

fn bom_error(kind: &str, name: &str, index: usize) -> LineError {
    line_err!(
        InvalidName,
        "Bad string {name:?}: {kind} names can't contain a UTF-8 BOM character, which was found at byte position {index}."
    )
}

fn char_error(kind: &str, name: &str, c: char, index: usize) -> LineError {
    line_err!(
        InvalidName,
        "Bad string {name:?}: {kind} names can't contain a {c:?} character, which was found at byte position {index}."
    )
}

/// A validated table name.
///
/// Passing a `TableName` to a [`LineWriter`](super::LineWriter) skips
/// re-validation on every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableName<'a> {
    name: &'a str,
}

impl<'a> TableName<'a> {
    /// Validate a table name.
    pub fn new(name: &'a str) -> Result<Self, LineError> {
        if name.is_empty() {
            return Err(line_err!(
                InvalidName,
                "Table names must have a non-zero length."
            ));
        }
        let last = name.len() - 1;
        let mut prev = '\0';
        for (index, c) in name.char_indices() {
            match c {
                '.' if index == 0 || index == last || prev == '.' => {
                    return Err(line_err!(
                        InvalidName,
                        "Bad string {name:?}: Found invalid dot `.` at position {index}."
                    ));
                }
                '?' | ',' | '\'' | '"' | '\\' | '/' | ':' | ')' | '(' | '+' | '*' | '%' | '~' => {
                    return Err(char_error("Table", name, c, index));
                }
                c if is_control(c) => return Err(char_error("Table", name, c, index)),
                '\u{feff}' => return Err(bom_error("Table", name, index)),
                _ => {}
            }
            prev = c;
        }
        Ok(Self { name })
    }

    /// Wrap a name that was validated earlier.
    pub fn new_unchecked(name: &'a str) -> Self {
        Self { name }
    }

    /// The underlying string.
    pub fn as_str(&self) -> &'a str {
        self.name
    }
}

impl<'a> TryFrom<&'a str> for TableName<'a> {
    type Error = LineError;

    fn try_from(name: &'a str) -> Result<Self, LineError> {
        Self::new(name)
    }
}

impl AsRef<str> for TableName<'_> {
    fn as_ref(&self) -> &str {
        self.name
    }
}

/// A validated column (symbol or field) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnName<'a> {
    name: &'a str,
}

impl<'a> ColumnName<'a> {
    /// Validate a column name.
    pub fn new(name: &'a str) -> Result<Self, LineError> {
        if name.is_empty() {
            return Err(line_err!(
                InvalidName,
                "Column names must have a non-zero length."
            ));
        }
        for (index, c) in name.char_indices() {
            match c {
                '?' | '.' | ',' | '\'' | '"' | '\\' | '/' | ':' | ')' | '(' | '+' | '-' | '*'
                | '%' | '~' => return Err(char_error("Column", name, c, index)),
                c if is_control(c) => return Err(char_error("Column", name, c, index)),
                '\u{feff}' => return Err(bom_error("Column", name, index)),
                _ => {}
            }
        }
        Ok(Self { name })
    }

    /// Wrap a name that was validated earlier.
    pub fn new_unchecked(name: &'a str) -> Self {
        Self { name }
    }

    /// The underlying string.
    pub fn as_str(&self) -> &'a str {
        self.name
    }
}

impl<'a> TryFrom<&'a str> for ColumnName<'a> {
    type Error = LineError;

    fn try_from(name: &'a str) -> Result<Self, LineError> {
        Self::new(name)
    }
}

impl AsRef<str> for ColumnName<'_> {
    fn as_ref(&self) -> &str {
        self.name
    }
}
