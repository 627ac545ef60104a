//! Cross-target type projection.
//!
//! Every emitter and the bridge introspection derive field types through
//! the single [`project`] function, so the native client, the OpenAPI
//! document and the TypeScript client cannot drift apart on a type
//! mapping. The function is deterministic and side-effect free; callers
//! that want degradations counted go through
//! [`GenerationContext::project`](crate::context::GenerationContext::project).
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeSet;
//! use wsdl2rest_core::projector::{project, Target, TypeKind};
//!
//! let known = BTreeSet::new();
//! let d = project("s:int", "1", "1", false, Target::Rust, &known);
//! assert_eq!(d.kind, TypeKind::Scalar);
//! assert_eq!(d.syntax, "i32");
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::naming::{Identifier, local_name};

/// Target type system a projection is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Native Rust client structs
    Rust,
    /// OpenAPI 3.0 schema objects
    OpenApi,
    /// TypeScript interfaces
    TypeScript,
}

/// Multiplicity classification of a projected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// Exactly one required value
    Scalar,
    /// Repeated value (`maxOccurs` unbounded or greater than one)
    Array,
    /// Optional or nillable value
    Optional,
}

/// How the base type was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseClass {
    /// One of the fixed XSD primitives
    Primitive,
    /// A complex type defined in the same service description
    Complex,
    /// An unknown reference degraded to the target's opaque type
    Opaque,
}

/// Result of projecting one XSD type reference into one target.
///
/// `syntax` is the spelling an emitter writes for the scalar or array
/// case; optionality is rendered by the target emitter (`Option<T>` is
/// baked into the Rust syntax, TypeScript adds `?`, OpenAPI drops the
/// field from the `required` list). `format` carries the OpenAPI format
/// qualifier and is empty for the other targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Multiplicity classification
    pub kind: TypeKind,
    /// Resolution class of the base type
    pub class: BaseClass,
    /// Target spelling of the base type
    pub base: String,
    /// Full target spelling with multiplicity applied
    pub syntax: String,
    /// OpenAPI format qualifier (`int32`, `date-time`, ...), if any
    pub format: Option<String>,
}

/// Projects an XSD type reference plus multiplicity into a target type.
///
/// Steps, in fixed order:
///
/// 1. strip the namespace prefix;
/// 2. match the fixed primitive table and resolve to the target's native
///    spelling;
/// 3. otherwise treat the reference as a complex type: when the local name
///    is in `known_types` the base is its normalized exported identifier,
///    when it is not the projection degrades to the target's opaque type;
/// 4. apply multiplicity: array wrapping wins when `max_occurs` is
///    `"unbounded"` or parses to a value above one, and only a non-array
///    becomes optional when `min_occurs` is `"0"` or the element is
///    nillable.
///
/// The same arguments always produce the same descriptor, no matter which
/// emitter asks or how often.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use wsdl2rest_core::projector::{project, Target, TypeKind};
///
/// let known = BTreeSet::new();
///
/// // Array wrapping takes precedence over optionality.
/// let d = project("string", "0", "unbounded", false, Target::Rust, &known);
/// assert_eq!(d.kind, TypeKind::Array);
/// assert_eq!(d.syntax, "Vec<String>");
/// ```
#[must_use]
pub fn project(
    type_ref: &str,
    min_occurs: &str,
    max_occurs: &str,
    nillable: bool,
    target: Target,
    known_types: &BTreeSet<String>,
) -> TypeDescriptor {
    let local = local_name(type_ref.trim());

    let (class, base, format) = match primitive_base(local, target) {
        Some((base, format)) => (BaseClass::Primitive, base.to_string(), format),
        None if known_types.contains(local) => {
            let exported = Identifier::normalize(local).exported().to_string();
            (BaseClass::Complex, exported, None)
        }
        None => (BaseClass::Opaque, opaque_base(target).to_string(), None),
    };

    if is_repeated(max_occurs) {
        let syntax = array_syntax(&base, target);
        return TypeDescriptor {
            kind: TypeKind::Array,
            class,
            base,
            syntax,
            format,
        };
    }

    if min_occurs == "0" || nillable {
        let syntax = optional_syntax(&base, target);
        return TypeDescriptor {
            kind: TypeKind::Optional,
            class,
            base,
            syntax,
            format,
        };
    }

    TypeDescriptor {
        kind: TypeKind::Scalar,
        class,
        base: base.clone(),
        syntax: base,
        format,
    }
}

/// Fixed primitive table; rows are the XSD scalar vocabulary, columns the
/// per-target spellings.
fn primitive_base(local: &str, target: Target) -> Option<(&'static str, Option<String>)> {
    let (rust, openapi, format, ts) = match local {
        "string" => ("String", "string", None, "string"),
        "int" | "integer" => ("i32", "integer", Some("int32"), "number"),
        "long" => ("i64", "integer", Some("int64"), "number"),
        "short" => ("i16", "integer", Some("int32"), "number"),
        "byte" => ("i8", "integer", Some("int32"), "number"),
        "boolean" => ("bool", "boolean", None, "boolean"),
        "float" => ("f32", "number", Some("float"), "number"),
        "double" => ("f64", "number", Some("double"), "number"),
        "decimal" => ("f64", "number", None, "number"),
        "dateTime" => ("String", "string", Some("date-time"), "string"),
        "date" => ("String", "string", Some("date"), "string"),
        "time" => ("String", "string", Some("time"), "string"),
        "base64Binary" => ("Vec<u8>", "string", Some("byte"), "string"),
        "hexBinary" => ("Vec<u8>", "string", None, "string"),
        _ => return None,
    };
    match target {
        Target::Rust => Some((rust, None)),
        Target::OpenApi => Some((openapi, format.map(str::to_string))),
        Target::TypeScript => Some((ts, None)),
    }
}

/// Opaque fallback for references that resolve to nothing known.
const fn opaque_base(target: Target) -> &'static str {
    match target {
        Target::Rust => "serde_json::Value",
        Target::OpenApi => "object",
        Target::TypeScript => "unknown",
    }
}

fn is_repeated(max_occurs: &str) -> bool {
    max_occurs == "unbounded" || max_occurs.parse::<u64>().is_ok_and(|n| n > 1)
}

fn array_syntax(base: &str, target: Target) -> String {
    match target {
        Target::Rust => format!("Vec<{base}>"),
        Target::OpenApi => format!("array<{base}>"),
        Target::TypeScript => format!("{base}[]"),
    }
}

fn optional_syntax(base: &str, target: Target) -> String {
    match target {
        Target::Rust => format!("Option<{base}>"),
        // OpenAPI expresses optionality through the required list and
        // TypeScript through the `?` marker; the base spelling is reused.
        Target::OpenApi | Target::TypeScript => base.to_string(),
    }
}
