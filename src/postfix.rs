//! Ordered key=value annotations appended to the meter line.
//!
//! A [`Postfix`] is owned and mutated by the caller; the meter stores only a
//! rendered snapshot of it (see [`Meter::set_postfix`]). Insertion order is
//! newest-first: [`add`](Postfix::add) prepends, so the most recently added
//! pair renders first. That is a long-standing display quirk consumers have
//! come to rely on, and it is kept as-is.
//!
//! [`Meter::set_postfix`]: crate::Meter::set_postfix

use std::fmt;

use compact_str::CompactString;

use crate::format::format_general;

/// A single postfix value: text, integer, or float.
///
/// Floats render with three significant digits; the other variants render
/// verbatim.
#[derive(Clone, Debug, PartialEq)]
pub enum PostfixValue {
    /// Free-form text.
    Text(CompactString),
    /// A signed integer, rendered in full.
    Int(i64),
    /// A float, rendered with three significant digits.
    Float(f64),
}

impl fmt::Display for PostfixValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&format_general(*value, 3)),
        }
    }
}

/// An ordered list of key=value pairs for the meter's trailing annotations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Postfix {
    entries: Vec<(CompactString, PostfixValue)>,
}

impl Postfix {
    /// Creates an empty postfix list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a text entry. The newest entry renders first.
    pub fn add(&mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) {
        self.entries
            .insert(0, (key.into(), PostfixValue::Text(value.into())));
    }

    /// Prepends an integer entry.
    pub fn add_int(&mut self, key: impl Into<CompactString>, value: i64) {
        self.entries.insert(0, (key.into(), PostfixValue::Int(value)));
    }

    /// Prepends a float entry, rendered with three significant digits.
    pub fn add_float(&mut self, key: impl Into<CompactString>, value: f64) {
        self.entries
            .insert(0, (key.into(), PostfixValue::Float(value)));
    }

    /// Renders the list as `"k1=v1, k2=v2, ..."` in current list order.
    ///
    /// Returns an empty string for an empty list.
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_string());
        }
        out
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Postfix;

    /// Insertion Order
    /// `add` prepends, so the newest entry renders first.
    #[test]
    fn test_newest_first() {
        let mut postfix = Postfix::new();
        postfix.add("a", "1");
        postfix.add("b", "2");

        assert_eq!(postfix.format(), "b=2, a=1");
    }

    /// Value Rendering
    /// Text verbatim, integers in full, floats at three significant digits.
    #[test]
    fn test_value_rendering() {
        let mut postfix = Postfix::new();
        postfix.add_float("loss", 0.123456);
        postfix.add_int("epoch", 7);
        postfix.add("stage", "train");

        assert_eq!(postfix.format(), "stage=train, epoch=7, loss=0.123");
    }

    /// Empty List
    /// Formats to the empty string, and `clear` returns to that state.
    #[test]
    fn test_empty_and_clear() {
        let mut postfix = Postfix::new();
        assert_eq!(postfix.format(), "");
        assert!(postfix.is_empty());

        postfix.add("k", "v");
        assert_eq!(postfix.len(), 1);

        postfix.clear();
        assert!(postfix.is_empty());
        assert_eq!(postfix.format(), "");
    }
}
