//! WSDL ingestion: document loading and IR construction.
//!
//! [`loader::load`] fetches raw WSDL XML from a file path or URL;
//! [`builder::build`] turns it into the canonical
//! [`ServiceDefinition`](wsdl2rest_core::ServiceDefinition). The two are
//! deliberately separate so the builder stays a pure function of the
//! document text.
//!
//! ```no_run
//! # async fn example() -> wsdl2rest_core::Result<()> {
//! let xml = wsdl2rest_parser::load("http://example.com/calculator.asmx?WSDL").await?;
//! let definition = wsdl2rest_parser::build(&xml)?;
//! println!("{} operations", definition.operations().count());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod builder;
pub mod loader;

pub use builder::build;
pub use loader::load;
