//! WS-Security UsernameToken headers.
//!
//! Builds the `wsse:Security` header carrying a `wsu:Timestamp` and a
//! `wsse:UsernameToken` in either plaintext or digest form. Only the
//! UsernameToken profile is supported; signing and encryption are out of
//! scope. Transport confidentiality for plaintext passwords is the
//! caller's responsibility.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use quick_xml::escape::escape;
use sha1::{Digest, Sha1};

/// `wsse` namespace for the security extension elements.
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// `wsu` namespace for timestamps and the `Created` element.
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// Password type URI for digest passwords.
pub const PASSWORD_DIGEST_URI: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";

/// Password type URI for plaintext passwords.
pub const PASSWORD_TEXT_URI: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";

/// Encoding type URI carried on the nonce element.
pub const NONCE_ENCODING_URI: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Validity window of the emitted timestamp.
const TIMESTAMP_WINDOW_MINUTES: i64 = 5;

/// How the password travels in the UsernameToken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PasswordMode {
    /// Password sent verbatim with the `PasswordText` type URI
    Plaintext,
    /// Nonce-salted SHA-1 digest with the `PasswordDigest` type URI
    Digest,
}

/// Credentials for one outbound call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SecurityCredential {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
    /// Plaintext or digest transmission
    pub mode: PasswordMode,
}

impl SecurityCredential {
    /// Plaintext-password credential.
    #[must_use]
    pub fn plaintext(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mode: PasswordMode::Plaintext,
        }
    }

    /// Digest-password credential.
    #[must_use]
    pub fn digest(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mode: PasswordMode::Digest,
        }
    }
}

/// Computes the UsernameToken password digest.
///
/// `digest = base64(SHA1(nonce ‖ created ‖ password))` with `created` in
/// RFC 3339. Deterministic for fixed inputs.
///
/// # Examples
///
/// ```
/// use wsdl2rest_soap::security::password_digest;
///
/// // SHA1("abc"), base64-encoded.
/// assert_eq!(password_digest(b"a", "b", "c"), "qZk+NkcGgWq6PiVxeFDCbJzQ2J0=");
/// ```
#[must_use]
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// A fully materialized `wsse:Security` header.
///
/// Always carries a timestamp; the UsernameToken is present whenever the
/// credential has a non-empty username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHeader {
    created: String,
    expires: String,
    token: Option<UsernameToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UsernameToken {
    username: String,
    password_value: String,
    password_type: &'static str,
    nonce_b64: Option<String>,
    token_created: Option<String>,
}

impl SecurityHeader {
    /// Builds a header for `credential` at time `now`, drawing a random
    /// 16-byte nonce in digest mode.
    #[must_use]
    pub fn build(credential: &SecurityCredential, now: DateTime<Utc>) -> Self {
        let nonce: [u8; 16] = rand::random();
        Self::build_with_nonce(credential, now, &nonce)
    }

    /// Builds a header with an explicit nonce.
    ///
    /// The digest for a fixed nonce and timestamp is reproducible bit for
    /// bit, which is what makes digest mode testable.
    #[must_use]
    pub fn build_with_nonce(
        credential: &SecurityCredential,
        now: DateTime<Utc>,
        nonce: &[u8; 16],
    ) -> Self {
        let created = rfc3339(now);
        let expires = rfc3339(now + Duration::minutes(TIMESTAMP_WINDOW_MINUTES));

        let token = if credential.username.is_empty() {
            None
        } else {
            Some(match credential.mode {
                PasswordMode::Plaintext => UsernameToken {
                    username: credential.username.clone(),
                    password_value: credential.password.clone(),
                    password_type: PASSWORD_TEXT_URI,
                    nonce_b64: None,
                    token_created: None,
                },
                PasswordMode::Digest => UsernameToken {
                    username: credential.username.clone(),
                    password_value: password_digest(nonce, &created, &credential.password),
                    password_type: PASSWORD_DIGEST_URI,
                    nonce_b64: Some(BASE64.encode(nonce)),
                    token_created: Some(created.clone()),
                },
            })
        };

        Self {
            created,
            expires,
            token,
        }
    }

    /// Timestamp creation instant, RFC 3339.
    #[must_use]
    pub fn created(&self) -> &str {
        &self.created
    }

    /// Renders the header as a `wsse:Security` XML fragment.
    ///
    /// Text content is escaped; the fragment is inserted verbatim into the
    /// envelope header by the codec.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        let _ = write!(
            xml,
            r#"<wsse:Security xmlns:wsse="{WSSE_NS}" xmlns:wsu="{WSU_NS}">"#
        );
        let _ = write!(
            xml,
            "<wsu:Timestamp><wsu:Created>{}</wsu:Created><wsu:Expires>{}</wsu:Expires></wsu:Timestamp>",
            self.created, self.expires
        );
        if let Some(token) = &self.token {
            let _ = write!(
                xml,
                "<wsse:UsernameToken><wsse:Username>{}</wsse:Username>",
                escape(&token.username)
            );
            let _ = write!(
                xml,
                r#"<wsse:Password Type="{}">{}</wsse:Password>"#,
                token.password_type,
                escape(&token.password_value)
            );
            if let Some(nonce) = &token.nonce_b64 {
                let _ = write!(
                    xml,
                    r#"<wsse:Nonce EncodingType="{NONCE_ENCODING_URI}">{nonce}</wsse:Nonce>"#
                );
            }
            if let Some(created) = &token.token_created {
                let _ = write!(xml, "<wsu:Created>{created}</wsu:Created>");
            }
            xml.push_str("</wsse:UsernameToken>");
        }
        xml.push_str("</wsse:Security>");
        xml
    }
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_digest_reproducible_for_fixed_inputs() {
        let cred = SecurityCredential::digest("alice", "secret");
        let nonce = [7u8; 16];
        let first = SecurityHeader::build_with_nonce(&cred, fixed_now(), &nonce);
        let second = SecurityHeader::build_with_nonce(&cred, fixed_now(), &nonce);
        assert_eq!(first.to_xml(), second.to_xml());
    }

    #[test]
    fn test_digest_known_vector() {
        // nonce "a", created "b", password "c" concatenate to "abc".
        assert_eq!(password_digest(b"a", "b", "c"), "qZk+NkcGgWq6PiVxeFDCbJzQ2J0=");
    }

    #[test]
    fn test_digest_decodes_to_sha1_width() {
        let digest = password_digest(&[1, 2, 3], "2024-03-01T12:00:00Z", "pw");
        let raw = BASE64.decode(digest).unwrap();
        assert_eq!(raw.len(), 20);
    }

    #[test]
    fn test_digest_changes_with_nonce() {
        let created = "2024-03-01T12:00:00Z";
        assert_ne!(
            password_digest(&[1; 16], created, "pw"),
            password_digest(&[2; 16], created, "pw")
        );
    }

    #[test]
    fn test_plaintext_header_shape() {
        let cred = SecurityCredential::plaintext("alice", "secret");
        let xml = SecurityHeader::build(&cred, fixed_now()).to_xml();
        assert!(xml.contains("<wsse:Username>alice</wsse:Username>"));
        assert!(xml.contains("secret"));
        assert!(xml.contains(PASSWORD_TEXT_URI));
        assert!(!xml.contains("<wsse:Nonce"));
    }

    #[test]
    fn test_digest_header_shape() {
        let cred = SecurityCredential::digest("alice", "secret");
        let xml = SecurityHeader::build(&cred, fixed_now()).to_xml();
        assert!(xml.contains(PASSWORD_DIGEST_URI));
        assert!(xml.contains("<wsse:Nonce"));
        assert!(xml.contains(NONCE_ENCODING_URI));
        // The password itself never appears in digest mode.
        assert!(!xml.contains("secret"));
    }

    #[test]
    fn test_timestamp_window() {
        let cred = SecurityCredential::plaintext("alice", "pw");
        let xml = SecurityHeader::build(&cred, fixed_now()).to_xml();
        assert!(xml.contains("<wsu:Created>2024-03-01T12:00:00Z</wsu:Created>"));
        assert!(xml.contains("<wsu:Expires>2024-03-01T12:05:00Z</wsu:Expires>"));
    }

    #[test]
    fn test_username_escaped() {
        let cred = SecurityCredential::plaintext("a<b>&c", "pw");
        let xml = SecurityHeader::build(&cred, fixed_now()).to_xml();
        assert!(xml.contains("a&lt;b&gt;&amp;c"));
    }

    #[test]
    fn test_empty_username_omits_token() {
        let cred = SecurityCredential::plaintext("", "pw");
        let xml = SecurityHeader::build(&cred, fixed_now()).to_xml();
        assert!(xml.contains("<wsu:Timestamp>"));
        assert!(!xml.contains("UsernameToken"));
    }
}
