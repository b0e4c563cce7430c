//! Typed values and their string form.
//!
//! Every value is stored as a string; which type it is depends only on the
//! accessor used to read it back. Reading with the wrong accessor is a
//! [`TypeParseError`], which the store turns into the caller's default.

use thiserror::Error;

/// Decrypted text did not parse as the requested type.
///
/// Carries no copy of the text, which is plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stored value is not a valid {kind}")]
pub struct TypeParseError {
    pub kind: &'static str,
}

/// A scalar type the store can hold.
pub trait PrefValue: Sized {
    /// Type name used in diagnostics
    const KIND: &'static str;

    fn to_pref_string(&self) -> String;

    fn from_pref_str(s: &str) -> Result<Self, TypeParseError>;
}

impl PrefValue for String {
    const KIND: &'static str = "string";

    fn to_pref_string(&self) -> String {
        self.clone()
    }

    fn from_pref_str(s: &str) -> Result<Self, TypeParseError> {
        Ok(s.to_string())
    }
}

impl PrefValue for bool {
    const KIND: &'static str = "bool";

    fn to_pref_string(&self) -> String {
        self.to_string()
    }

    /// Accepts `true`/`false` in any letter case, nothing else.
    fn from_pref_str(s: &str) -> Result<Self, TypeParseError> {
        if s.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if s.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(TypeParseError { kind: Self::KIND })
        }
    }
}

macro_rules! numeric_pref_value {
    ($ty:ty, $kind:literal) => {
        impl PrefValue for $ty {
            const KIND: &'static str = $kind;

            fn to_pref_string(&self) -> String {
                self.to_string()
            }

            fn from_pref_str(s: &str) -> Result<Self, TypeParseError> {
                s.parse().map_err(|_| TypeParseError { kind: Self::KIND })
            }
        }
    };
}

numeric_pref_value!(i32, "i32");
numeric_pref_value!(i64, "i64");
numeric_pref_value!(f32, "f32");
