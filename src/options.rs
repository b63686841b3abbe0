use crate::binding::{Binding, ScalarKind};

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Byte(u8),
    Integer(i16),
    Text(String),
    Float(f32),
    Double(f64),
}

impl OptionValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            OptionValue::Byte(_) => ScalarKind::Byte,
            OptionValue::Integer(_) => ScalarKind::Integer,
            OptionValue::Text(_) => ScalarKind::Text,
            OptionValue::Float(_) => ScalarKind::Float,
            OptionValue::Double(_) => ScalarKind::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub name: String,
    pub value: OptionValue,
}

impl SelectOption {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered candidate values for an option select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    options: Vec<SelectOption>,
}

impl OptionSet {
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self { options }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SelectOption> {
        self.options.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectOption> {
        self.options.iter()
    }

    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|o| o.name == name)
    }

    /// Index of the option the bound variable currently holds.
    pub fn position_of(&self, binding: &Binding<'_>) -> Option<usize> {
        self.options.iter().position(|o| binding.holds(&o.value))
    }
}

impl FromIterator<SelectOption> for OptionSet {
    fn from_iter<I: IntoIterator<Item = SelectOption>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
