//! Identifier normalization for WSDL/XSD names.
//!
//! WSDL documents carry names like `tns:get_user-data` that no target
//! language accepts verbatim. [`Identifier::normalize`] canonicalizes a raw
//! name once; every emitter reads the form it needs from the result, so the
//! three targets can never disagree on spelling.
//!
//! # Examples
//!
//! ```
//! use wsdl2rest_core::naming::Identifier;
//!
//! let id = Identifier::normalize("tns:get_user-data");
//! assert_eq!(id.exported(), "GetUserData");
//! assert_eq!(id.field(), "getUserData");
//! assert_eq!(id.snake(), "get_user_data");
//! ```

use serde::{Deserialize, Serialize};

/// Strips a namespace prefix, `prefix:local` becoming `local`.
///
/// Names without a prefix pass through unchanged. Resolution across the
/// whole pipeline is single-namespace: only the local part is ever
/// compared.
///
/// # Examples
///
/// ```
/// use wsdl2rest_core::naming::local_name;
///
/// assert_eq!(local_name("tns:AddSoapIn"), "AddSoapIn");
/// assert_eq!(local_name("AddSoapIn"), "AddSoapIn");
/// ```
#[must_use]
pub fn local_name(raw: &str) -> &str {
    match raw.rfind(':') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    }
}

/// A WSDL/XSD name canonicalized into the spellings the emitters use.
///
/// Normalization is deterministic and idempotent: feeding an exported form
/// back through [`Identifier::normalize`] returns the same exported form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    exported: String,
    field: String,
    snake: String,
}

impl Identifier {
    /// Normalizes a raw WSDL/XSD name.
    ///
    /// The namespace prefix is stripped, the remainder is split on `_`,
    /// `-`, `.` and spaces, and three spellings are derived:
    ///
    /// - `exported`: each segment with its first letter upper-cased
    ///   (segment tails keep their case, which is what makes the operation
    ///   idempotent),
    /// - `field`: the exported form with its first letter lower-cased,
    /// - `snake`: segments lower-cased and joined with `_`, splitting
    ///   additionally at lower-to-upper case boundaries.
    ///
    /// Empty input yields empty output in all three forms; there is no
    /// synthetic fallback name.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsdl2rest_core::naming::Identifier;
    ///
    /// let id = Identifier::normalize("intA");
    /// assert_eq!(id.exported(), "IntA");
    /// assert_eq!(id.field(), "intA");
    /// assert_eq!(id.snake(), "int_a");
    ///
    /// // Idempotent on the exported form.
    /// let again = Identifier::normalize(id.exported());
    /// assert_eq!(again.exported(), id.exported());
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let stripped = local_name(raw.trim());
        let segments: Vec<&str> = stripped
            .split(['_', '-', '.', ' '])
            .filter(|s| !s.is_empty())
            .collect();

        let mut exported = String::new();
        for segment in &segments {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                exported.extend(first.to_uppercase());
                exported.push_str(chars.as_str());
            }
        }

        let mut field_chars = exported.chars();
        let field = match field_chars.next() {
            Some(first) => first.to_lowercase().collect::<String>() + field_chars.as_str(),
            None => String::new(),
        };

        let snake = to_snake(&segments);

        Self {
            exported,
            field,
            snake,
        }
    }

    /// The exported (PascalCase) spelling, used for type names.
    #[inline]
    #[must_use]
    pub fn exported(&self) -> &str {
        &self.exported
    }

    /// The field (camelCase) spelling, used for TypeScript and JSON keys.
    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The snake_case spelling, used for Rust field and method names.
    #[inline]
    #[must_use]
    pub fn snake(&self) -> &str {
        &self.snake
    }

    /// Returns `true` when the identifier normalized to nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exported.is_empty()
    }
}

/// Joins segments into snake_case, splitting camelCase humps inside each
/// segment so `intA` becomes `int_a` rather than `inta`.
fn to_snake(segments: &[&str]) -> String {
    let mut out = String::new();
    for segment in segments {
        let mut prev_lower = false;
        for ch in segment.chars() {
            if ch.is_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                out.extend(ch.to_lowercase());
                prev_lower = false;
            } else {
                out.extend(ch.to_lowercase());
                prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            }
        }
        out.push('_');
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(local_name("tns:Add"), "Add");
        assert_eq!(local_name("s:AddResponse"), "AddResponse");
        assert_eq!(local_name("Add"), "Add");
    }

    #[test]
    fn test_normalize_separators() {
        let id = Identifier::normalize("get_user-data.v2 final");
        assert_eq!(id.exported(), "GetUserDataV2Final");
        assert_eq!(id.field(), "getUserDataV2Final");
    }

    #[test]
    fn test_normalize_strips_prefix() {
        let id = Identifier::normalize("tns:AddSoapIn");
        assert_eq!(id.exported(), "AddSoapIn");
        assert_eq!(id.field(), "addSoapIn");
    }

    #[test]
    fn test_normalize_empty_yields_empty() {
        let id = Identifier::normalize("");
        assert!(id.is_empty());
        assert_eq!(id.exported(), "");
        assert_eq!(id.field(), "");
        assert_eq!(id.snake(), "");
    }

    #[test]
    fn test_normalize_idempotent_on_exported_form() {
        for raw in ["intA", "tns:get_user-data", "AddResult", "a", "A_b_C"] {
            let once = Identifier::normalize(raw);
            let twice = Identifier::normalize(once.exported());
            assert_eq!(
                once.exported(),
                twice.exported(),
                "exported form of {raw:?} is not a fixed point"
            );
        }
    }

    #[test]
    fn test_snake_splits_camel_humps() {
        assert_eq!(Identifier::normalize("intA").snake(), "int_a");
        assert_eq!(Identifier::normalize("AddResult").snake(), "add_result");
        assert_eq!(Identifier::normalize("XMLValue").snake(), "xmlvalue");
        assert_eq!(Identifier::normalize("celsius_value").snake(), "celsius_value");
    }

    #[test]
    fn test_single_letter_segments() {
        let id = Identifier::normalize("a_b_c");
        assert_eq!(id.exported(), "ABC");
        assert_eq!(id.field(), "aBC");
        assert_eq!(id.snake(), "a_b_c");
    }
}
