//! SOAP wire protocol support shared by generated clients and the bridge.
//!
//! Two concerns live here and nowhere else:
//!
//! - [`envelope`]: building and parsing SOAP 1.1/1.2 envelopes around an
//!   opaque body payload, with fault detection on decode,
//! - [`security`]: WS-Security UsernameToken headers (plaintext or
//!   nonce-salted SHA-1 digest) with a fixed five-minute timestamp window.
//!
//! The codec enforces no timeout of its own; callers own transport
//! deadlines.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod envelope;
pub mod security;

pub use envelope::{SoapVersion, decode, encode};
pub use security::{PasswordMode, SecurityCredential, SecurityHeader, password_digest};
