//! Canonical service model and projection engine for WSDL tooling.
//!
//! This crate is the foundation the rest of the workspace builds on:
//!
//! - the immutable intermediate representation of a WSDL document
//!   ([`model::ServiceDefinition`] and friends) with tolerant,
//!   prefix-stripped reference resolution,
//! - the identifier normalizer ([`naming::Identifier`]) and the
//!   cross-target type projector ([`projector::project`]) that every
//!   emitter shares, so the generated Rust client, OpenAPI document and
//!   TypeScript client cannot disagree on a name or a type,
//! - the per-run [`context::GenerationContext`] carrying known-type
//!   lookup, emitted-name deduplication and degradation counters,
//! - the workspace-wide [`Error`] hierarchy.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod error;

pub mod context;
pub mod model;
pub mod naming;
pub mod projector;

pub use context::GenerationContext;
pub use error::{Error, Result};
pub use model::{
    AttributeDef, Binding, BindingOperation, ComplexType, ElementDef, Field, Message, Operation,
    Part, Port, PortType, Service, ServiceDefinition, ValidationReport,
};
pub use naming::Identifier;
pub use projector::{BaseClass, Target, TypeDescriptor, TypeKind};
