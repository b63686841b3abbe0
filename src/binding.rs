use std::cell::{Cell, RefCell};
use std::fmt;

use crate::error::{MenuError, Result};
use crate::options::OptionValue;

/// Kind of value an item shows. Drives read, display format, commit parsing
/// and how many columns the value takes while being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Byte,
    Integer,
    Boolean,
    Text,
    Float,
    Double,
    Select,
    Callback,
    None,
}

pub const BYTE_EDIT_WIDTH: usize = 3;
pub const INTEGER_EDIT_WIDTH: usize = 6;
pub const FLOAT_EDIT_WIDTH: usize = 12;

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Byte => "byte",
            ScalarKind::Integer => "integer",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Text => "text",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Select => "select",
            ScalarKind::Callback => "callback",
            ScalarKind::None => "none",
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ScalarKind::Float | ScalarKind::Double)
    }

    /// Columns the value occupies while it is being edited. Text uses the
    /// configured buffer capacity; kinds that are never edited in place take
    /// no columns.
    pub fn edit_width(self, text_capacity: usize) -> usize {
        match self {
            ScalarKind::Byte => BYTE_EDIT_WIDTH,
            ScalarKind::Integer => INTEGER_EDIT_WIDTH,
            ScalarKind::Boolean => 1,
            ScalarKind::Text => text_capacity,
            ScalarKind::Float | ScalarKind::Double => FLOAT_EDIT_WIDTH,
            ScalarKind::Select | ScalarKind::Callback | ScalarKind::None => 0,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-owning reference to a caller-owned variable.
///
/// The variable lives in a `Cell` (or `RefCell` for text) owned by the
/// surrounding program; the `'a` borrow keeps it alive for as long as any item
/// bound to it.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Byte(&'a Cell<u8>),
    Integer(&'a Cell<i16>),
    Boolean(&'a Cell<bool>),
    Text(&'a RefCell<String>),
    Float(&'a Cell<f32>),
    Double(&'a Cell<f64>),
}

impl<'a> Binding<'a> {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Binding::Byte(_) => ScalarKind::Byte,
            Binding::Integer(_) => ScalarKind::Integer,
            Binding::Boolean(_) => ScalarKind::Boolean,
            Binding::Text(_) => ScalarKind::Text,
            Binding::Float(_) => ScalarKind::Float,
            Binding::Double(_) => ScalarKind::Double,
        }
    }

    /// Formats the current value. `precision` is the number of digits after
    /// the decimal point and is ignored for non-floating kinds.
    pub fn display(&self, precision: u8) -> String {
        match self {
            Binding::Byte(cell) => cell.get().to_string(),
            Binding::Integer(cell) => cell.get().to_string(),
            Binding::Boolean(cell) => String::from(if cell.get() { "on" } else { "off" }),
            Binding::Text(cell) => cell.borrow().clone(),
            Binding::Float(cell) => format!("{:.*}", usize::from(precision), cell.get()),
            Binding::Double(cell) => format!("{:.*}", usize::from(precision), cell.get()),
        }
    }

    /// Parses `input` by the binding's kind and writes it into the variable.
    /// Nothing is written when parsing fails.
    pub fn commit(&self, input: &str, text_capacity: usize) -> Result<()> {
        let parse_err = || MenuError::Parse {
            kind: self.kind(),
            input: input.to_string(),
        };
        let trimmed = input.trim();

        match self {
            Binding::Byte(cell) => cell.set(trimmed.parse().map_err(|_| parse_err())?),
            Binding::Integer(cell) => cell.set(trimmed.parse().map_err(|_| parse_err())?),
            Binding::Boolean(cell) => cell.set(parse_bool(trimmed).ok_or_else(parse_err)?),
            Binding::Float(cell) => cell.set(parse_finite_f32(trimmed).ok_or_else(parse_err)?),
            Binding::Double(cell) => cell.set(parse_finite(trimmed).ok_or_else(parse_err)?),
            Binding::Text(cell) => {
                // Edited buffers are padded with spaces on screen.
                let text = input.trim_end();
                check_text_len(text, text_capacity)?;
                *cell.borrow_mut() = text.to_string();
            }
        }
        Ok(())
    }

    /// Stores an option value. The option kind must match the variable kind
    /// and text must fit the buffer.
    pub fn store_option(&self, value: &OptionValue, text_capacity: usize) -> Result<()> {
        match (self, value) {
            (Binding::Byte(cell), OptionValue::Byte(v)) => cell.set(*v),
            (Binding::Integer(cell), OptionValue::Integer(v)) => cell.set(*v),
            (Binding::Float(cell), OptionValue::Float(v)) => cell.set(*v),
            (Binding::Double(cell), OptionValue::Double(v)) => cell.set(*v),
            (Binding::Text(cell), OptionValue::Text(v)) => {
                check_text_len(v, text_capacity)?;
                *cell.borrow_mut() = v.clone();
            }
            _ => {
                return Err(MenuError::OptionKindMismatch {
                    option: value.kind(),
                    binding: self.kind(),
                })
            }
        }
        Ok(())
    }

    /// Whether the variable currently holds `value`.
    pub fn holds(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Binding::Byte(cell), OptionValue::Byte(v)) => cell.get() == *v,
            (Binding::Integer(cell), OptionValue::Integer(v)) => cell.get() == *v,
            (Binding::Float(cell), OptionValue::Float(v)) => cell.get() == *v,
            (Binding::Double(cell), OptionValue::Double(v)) => cell.get() == *v,
            (Binding::Text(cell), OptionValue::Text(v)) => *cell.borrow() == *v,
            _ => false,
        }
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_finite(input: &str) -> Option<f64> {
    input.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Values beyond the `f32` range parse to infinity, so the narrow type is
/// parsed directly.
fn parse_finite_f32(input: &str) -> Option<f32> {
    input.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Rejects text longer than a buffer of `capacity` characters.
pub fn check_text_len(text: &str, capacity: usize) -> Result<()> {
    let len = text.chars().count();
    if len > capacity {
        return Err(MenuError::TextTooLong { len, capacity });
    }
    Ok(())
}

impl<'a> From<&'a Cell<u8>> for Binding<'a> {
    fn from(cell: &'a Cell<u8>) -> Self {
        Binding::Byte(cell)
    }
}

impl<'a> From<&'a Cell<i16>> for Binding<'a> {
    fn from(cell: &'a Cell<i16>) -> Self {
        Binding::Integer(cell)
    }
}

impl<'a> From<&'a Cell<bool>> for Binding<'a> {
    fn from(cell: &'a Cell<bool>) -> Self {
        Binding::Boolean(cell)
    }
}

impl<'a> From<&'a RefCell<String>> for Binding<'a> {
    fn from(cell: &'a RefCell<String>) -> Self {
        Binding::Text(cell)
    }
}

impl<'a> From<&'a Cell<f32>> for Binding<'a> {
    fn from(cell: &'a Cell<f32>) -> Self {
        Binding::Float(cell)
    }
}

impl<'a> From<&'a Cell<f64>> for Binding<'a> {
    fn from(cell: &'a Cell<f64>) -> Self {
        Binding::Double(cell)
    }
}

/// A variable that an option select may be bound to. Selects do not drive
/// booleans, so there is no conversion from `Cell<bool>`.
#[derive(Debug, Clone, Copy)]
pub struct SelectTarget<'a>(Binding<'a>);

impl<'a> SelectTarget<'a> {
    pub fn binding(self) -> Binding<'a> {
        self.0
    }
}

impl<'a> From<&'a Cell<u8>> for SelectTarget<'a> {
    fn from(cell: &'a Cell<u8>) -> Self {
        SelectTarget(Binding::Byte(cell))
    }
}

impl<'a> From<&'a Cell<i16>> for SelectTarget<'a> {
    fn from(cell: &'a Cell<i16>) -> Self {
        SelectTarget(Binding::Integer(cell))
    }
}

impl<'a> From<&'a RefCell<String>> for SelectTarget<'a> {
    fn from(cell: &'a RefCell<String>) -> Self {
        SelectTarget(Binding::Text(cell))
    }
}

impl<'a> From<&'a Cell<f32>> for SelectTarget<'a> {
    fn from(cell: &'a Cell<f32>) -> Self {
        SelectTarget(Binding::Float(cell))
    }
}

impl<'a> From<&'a Cell<f64>> for SelectTarget<'a> {
    fn from(cell: &'a Cell<f64>) -> Self {
        SelectTarget(Binding::Double(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_storage_type() {
        let byte = Cell::new(0u8);
        let text = RefCell::new(String::new());
        let double = Cell::new(0.0f64);

        assert_eq!(Binding::from(&byte).kind(), ScalarKind::Byte);
        assert_eq!(Binding::from(&text).kind(), ScalarKind::Text);
        assert_eq!(Binding::from(&double).kind(), ScalarKind::Double);
        assert_eq!(SelectTarget::from(&double).binding().kind(), ScalarKind::Double);
    }

    #[test]
    fn display_uses_precision_only_for_floats() {
        let float = Cell::new(1.23456f32);
        let int = Cell::new(-42i16);
        let flag = Cell::new(true);

        assert_eq!(Binding::from(&float).display(2), "1.23");
        assert_eq!(Binding::from(&float).display(0), "1");
        assert_eq!(Binding::from(&int).display(5), "-42");
        assert_eq!(Binding::from(&flag).display(3), "on");
    }

    #[test]
    fn commit_parses_and_writes() {
        let byte = Cell::new(0u8);
        let flag = Cell::new(false);
        let double = Cell::new(0.0f64);

        Binding::from(&byte).commit(" 200 ", 16).unwrap();
        Binding::from(&flag).commit("On", 16).unwrap();
        Binding::from(&double).commit("2.5", 16).unwrap();

        assert_eq!(byte.get(), 200);
        assert!(flag.get());
        assert_eq!(double.get(), 2.5);
    }

    #[test]
    fn failed_commit_leaves_value_untouched() {
        let byte = Cell::new(7u8);
        let err = Binding::from(&byte).commit("300", 16).unwrap_err();

        assert_eq!(
            err,
            MenuError::Parse {
                kind: ScalarKind::Byte,
                input: "300".to_string()
            }
        );
        assert_eq!(byte.get(), 7);

        let float = Cell::new(1.0f32);
        assert!(Binding::from(&float).commit("inf", 16).is_err());
        assert_eq!(float.get(), 1.0);
    }

    #[test]
    fn float_overflow_is_a_parse_error() {
        let float = Cell::new(1.0f32);
        let binding = Binding::from(&float);

        let err = binding.commit("1e300", 16).unwrap_err();
        assert_eq!(
            err,
            MenuError::Parse {
                kind: ScalarKind::Float,
                input: "1e300".to_string()
            }
        );
        assert_eq!(float.get(), 1.0);

        binding.commit("3e38", 16).unwrap();
        assert!(float.get().is_finite());

        let double = Cell::new(0.0f64);
        Binding::from(&double).commit("1e300", 16).unwrap();
        assert_eq!(double.get(), 1e300);
    }

    #[test]
    fn text_commit_respects_capacity() {
        let text = RefCell::new("old".to_string());
        let binding = Binding::from(&text);

        binding.commit("hello   ", 5).unwrap();
        assert_eq!(*text.borrow(), "hello");

        let err = binding.commit("too long", 5).unwrap_err();
        assert_eq!(err, MenuError::TextTooLong { len: 8, capacity: 5 });
        assert_eq!(*text.borrow(), "hello");
    }

    #[test]
    fn option_store_checks_kind() {
        let int = Cell::new(0i16);
        let binding = Binding::from(&int);

        binding.store_option(&OptionValue::Integer(3), 16).unwrap();
        assert!(binding.holds(&OptionValue::Integer(3)));

        let err = binding.store_option(&OptionValue::Byte(1), 16).unwrap_err();
        assert_eq!(
            err,
            MenuError::OptionKindMismatch {
                option: ScalarKind::Byte,
                binding: ScalarKind::Integer
            }
        );
    }

    #[test]
    fn text_option_respects_capacity() {
        let text = RefCell::new("eco".to_string());
        let binding = Binding::from(&text);

        let err = binding
            .store_option(&OptionValue::Text("abcdefghij".into()), 4)
            .unwrap_err();
        assert_eq!(err, MenuError::TextTooLong { len: 10, capacity: 4 });
        assert_eq!(*text.borrow(), "eco");

        binding.store_option(&OptionValue::Text("full".into()), 4).unwrap();
        assert_eq!(*text.borrow(), "full");
    }

    #[test]
    fn edit_widths() {
        assert_eq!(ScalarKind::Byte.edit_width(16), 3);
        assert_eq!(ScalarKind::Text.edit_width(16), 16);
        assert_eq!(ScalarKind::Callback.edit_width(16), 0);
        assert!(ScalarKind::Double.is_floating());
        assert!(!ScalarKind::Integer.is_floating());
    }
}
