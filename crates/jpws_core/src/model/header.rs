//! Database-level header fields.
//!
//! # Invariants
//! - The passphrase never appears in `Debug` output.
//! - `replace` always returns the previous value of the same field.

use std::fmt::{Debug, Formatter};

/// Master passphrase of one database.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Passphrase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// One scalar header field together with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFieldValue {
    Description(Option<String>),
    /// Default password lifetime in days.
    PasswordLifetime(Option<u32>),
    PasswordPolicy(Option<String>),
}

impl HeaderFieldValue {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Description(_) => "description",
            Self::PasswordLifetime(_) => "password_lifetime",
            Self::PasswordPolicy(_) => "password_policy",
        }
    }
}

/// Header fields carried alongside the record list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileHeader {
    pub description: Option<String>,
    pub password_lifetime: Option<u32>,
    pub password_policy: Option<String>,
    pub passphrase: Passphrase,
}

impl FileHeader {
    /// Writes `value` into its field and returns the previous value.
    pub fn replace(&mut self, value: HeaderFieldValue) -> HeaderFieldValue {
        match value {
            HeaderFieldValue::Description(next) => {
                HeaderFieldValue::Description(std::mem::replace(&mut self.description, next))
            }
            HeaderFieldValue::PasswordLifetime(next) => HeaderFieldValue::PasswordLifetime(
                std::mem::replace(&mut self.password_lifetime, next),
            ),
            HeaderFieldValue::PasswordPolicy(next) => HeaderFieldValue::PasswordPolicy(
                std::mem::replace(&mut self.password_policy, next),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FileHeader, HeaderFieldValue, Passphrase};

    #[test]
    fn replace_returns_previous_value_of_same_field() {
        let mut header = FileHeader::default();
        let previous = header.replace(HeaderFieldValue::PasswordLifetime(Some(90)));
        assert_eq!(previous, HeaderFieldValue::PasswordLifetime(None));
        let previous = header.replace(HeaderFieldValue::PasswordLifetime(Some(30)));
        assert_eq!(previous, HeaderFieldValue::PasswordLifetime(Some(90)));
        assert_eq!(header.password_lifetime, Some(30));
    }

    #[test]
    fn passphrase_debug_is_redacted() {
        let phrase = Passphrase::new("open sesame");
        assert!(!format!("{phrase:?}").contains("sesame"));
    }
}
