//! SOAP envelope encoding and decoding.
//!
//! Both protocol versions are supported with the same API: 1.1 uses the
//! `soap` prefix and the `schemas.xmlsoap.org` namespace, 1.2 the `env`
//! prefix and the W3C 2003 namespace. The body payload is opaque to the
//! codec in both directions; only the envelope, the optional security
//! header and fault detection are handled here.
//!
//! # Examples
//!
//! ```
//! use wsdl2rest_soap::envelope::{decode, encode, SoapVersion};
//!
//! let payload = "<Ping xmlns=\"http://tempuri.org/\"><text>hi</text></Ping>";
//! let wire = encode(SoapVersion::V11, None, payload);
//! assert_eq!(decode(&wire, SoapVersion::V11).unwrap(), payload);
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::Event;
use wsdl2rest_core::{Error, Result};

use crate::security::SecurityHeader;

/// SOAP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SoapVersion {
    /// SOAP 1.1
    V11,
    /// SOAP 1.2
    V12,
}

impl SoapVersion {
    /// Envelope namespace URI for this version.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::V11 => "http://schemas.xmlsoap.org/soap/envelope/",
            Self::V12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }

    /// Conventional envelope prefix (`soap` for 1.1, `env` for 1.2).
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::V11 => "soap",
            Self::V12 => "env",
        }
    }

    /// Content type for the HTTP request carrying the envelope.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::V11 => "text/xml; charset=utf-8",
            Self::V12 => "application/soap+xml; charset=utf-8",
        }
    }

    /// Whether the transport carries a `SOAPAction` header.
    ///
    /// Only 1.1 uses the header; 1.2 moved the action into the content
    /// type, which this codec does not emit.
    #[must_use]
    pub const fn uses_soap_action(self) -> bool {
        matches!(self, Self::V11)
    }

    /// The other protocol version, used for decode fallback.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::V11 => Self::V12,
            Self::V12 => Self::V11,
        }
    }
}

impl std::fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::V11 => "1.1",
            Self::V12 => "1.2",
        })
    }
}

impl FromStr for SoapVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.1" => Ok(Self::V11),
            "1.2" => Ok(Self::V12),
            other => Err(Error::Parse {
                message: format!("unsupported SOAP version: {other}"),
            }),
        }
    }
}

/// Encodes a SOAP envelope around an opaque body payload.
///
/// The header element is present exactly when `security` is supplied. The
/// payload is inserted verbatim; the caller owns its well-formedness.
#[must_use]
pub fn encode(version: SoapVersion, security: Option<&SecurityHeader>, payload: &str) -> String {
    let prefix = version.prefix();
    let ns = version.namespace();

    let mut xml = String::new();
    let _ = writeln!(xml, r#"<?xml version="1.0" encoding="utf-8"?>"#);
    let _ = writeln!(xml, r#"<{prefix}:Envelope xmlns:{prefix}="{ns}">"#);
    if let Some(header) = security {
        let _ = writeln!(
            xml,
            "  <{prefix}:Header>{}</{prefix}:Header>",
            header.to_xml()
        );
    }
    let _ = writeln!(xml, "  <{prefix}:Body>{payload}</{prefix}:Body>");
    let _ = write!(xml, "</{prefix}:Envelope>");
    xml
}

/// Decodes a SOAP envelope, returning the raw body payload.
///
/// The hinted version's envelope shape is tried first; on a structural
/// mismatch the other version is tried, because a responder may legally
/// answer in a different envelope form than it was asked in. A `Fault`
/// element inside the body is always surfaced as [`Error::SoapFault`],
/// never as an empty success.
///
/// # Errors
///
/// [`Error::SoapFault`] for fault bodies, [`Error::Parse`] when neither
/// version's shape matches.
pub fn decode(xml: &str, hint: SoapVersion) -> Result<String> {
    match decode_version(xml, hint) {
        Ok(payload) => Ok(payload),
        Err(err) if err.is_soap_fault() => Err(err),
        Err(primary) => match decode_version(xml, hint.other()) {
            Ok(payload) => {
                tracing::debug!(hint = %hint, "envelope decoded with fallback version");
                Ok(payload)
            }
            Err(err) if err.is_soap_fault() => Err(err),
            Err(_) => Err(primary),
        },
    }
}

/// Decodes strictly against one version's envelope shape.
fn decode_version(xml: &str, version: SoapVersion) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut inside_envelope = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                if !inside_envelope {
                    if e.local_name().as_ref() != b"Envelope" {
                        return Err(Error::Parse {
                            message: "root element is not Envelope".to_string(),
                        });
                    }
                    if !declares_namespace(&e, version.namespace())? {
                        return Err(Error::Parse {
                            message: format!("envelope is not SOAP {version}"),
                        });
                    }
                    inside_envelope = true;
                } else {
                    match e.local_name().as_ref() {
                        b"Body" => {
                            let payload = reader
                                .read_text(e.name())
                                .map_err(xml_error)?
                                .into_owned();
                            inspect_fault(&payload)?;
                            return Ok(payload);
                        }
                        // Header and anything else preceding the body.
                        _ => {
                            reader.read_to_end(e.name()).map_err(xml_error)?;
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if inside_envelope && e.local_name().as_ref() == b"Body" {
                    return Ok(String::new());
                }
            }
            Event::Eof => {
                return Err(Error::Parse {
                    message: "envelope has no Body element".to_string(),
                });
            }
            _ => {}
        }
    }
}

/// Checks whether a start tag declares the given namespace URI in any
/// `xmlns` attribute.
fn declares_namespace(e: &quick_xml::events::BytesStart<'_>, ns: &str) -> Result<bool> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Parse {
            message: format!("bad envelope attribute: {err}"),
        })?;
        if attr.key.as_ref().starts_with(b"xmlns") && attr.unescape_value().map_err(xml_error)? == ns
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Scans a body payload for a fault element of either version.
fn inspect_fault(payload: &str) -> Result<()> {
    let mut reader = Reader::from_str(payload);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Fault" => {
                return Err(parse_fault(&mut reader));
            }
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            // The payload is opaque; if it is not XML at all that is the
            // caller's concern, not a fault.
            Err(_) => return Ok(()),
        }
    }
}

/// Collects the fault triple from inside a `Fault` element.
///
/// Accepts both spellings: `faultcode`/`faultstring`/`detail` (1.1) and
/// the nested `Code/Value`, `Reason/Text`, `Detail` (1.2).
fn parse_fault(reader: &mut Reader<&[u8]>) -> Error {
    let mut code = String::new();
    let mut reason = String::new();
    let mut detail = String::new();
    let mut current: Vec<u8> = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                current = e.local_name().as_ref().to_vec();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match current.as_slice() {
                    b"faultcode" | b"Value" if code.is_empty() => code = text,
                    b"faultstring" | b"Text" if reason.is_empty() => reason = text,
                    b"detail" | b"Detail" if detail.is_empty() => detail = text,
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    Error::SoapFault {
        code,
        reason,
        detail,
    }
}

fn xml_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Parse {
        message: err.to_string(),
    }
}
