//! Code emitters for WSDL services.
//!
//! Three mechanical consumers of the IR, the shared type projector and
//! the shared normalizer:
//!
//! - [`rust_client`]: a native Rust SOAP client module,
//! - [`openapi`]: an OpenAPI 3.0 document,
//! - [`typescript`]: a TypeScript client mirroring the OpenAPI paths.
//!
//! Because all three derive every name and type through the same two
//! functions, the targets cannot drift apart; the emitters only decide
//! file layout and surface syntax. Each returns an in-memory
//! [`GeneratedCode`] bundle; a target that errors produces no output at
//! all.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod bundle;
pub mod openapi;
pub mod rust_client;
pub mod template_engine;
pub mod typescript;

mod shapes;

pub use bundle::{GeneratedCode, GeneratedFile};
pub use rust_client::EmitterOptions;
