//! resolved attribute values
//!
//! Every requested attribute resolves to exactly one of
//! - a string
//! - a number (f64, see below)
//! - a boolean
//! - `Unknown`: the attribute is declared, but its value depends on
//!   something that only exists at a later provisioning stage
//!
//! There is no "missing" variant on purpose. A missing attribute is an
//! error, never a value, so it cannot be confused with `Unknown`.
//!
//! Numbers convert to f64. Integer literals above 2^53 lose precision;
//! downstream output depends on that representation, so it stays.

/// A statically resolved attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Number(f64),
    Bool(bool),
    /// Not statically known. Carries the formatted source expression,
    /// when available, for diagnostics.
    Unknown(Option<String>),
}

impl AttributeValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, AttributeValue::Unknown(_))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_is_not_a_missing_value() {
        assert!(AttributeValue::Unknown(None).is_unknown());
        assert!(!AttributeValue::from("").is_unknown());
        assert!(!AttributeValue::from(0.0).is_unknown());
        assert!(!AttributeValue::from(false).is_unknown());
    }
}
