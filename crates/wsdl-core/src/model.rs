//! Canonical intermediate representation of a WSDL service.
//!
//! The IR is built once per run by the parser and is immutable afterwards.
//! Cross-references between the lists (binding to port type, operation to
//! message, part to type or element) stay as raw names; the lookup helpers
//! here resolve them with namespace prefixes stripped and report dangling
//! names as [`Error::UnresolvedReference`] so processing can continue
//! around the damaged entity.

use serde::{Deserialize, Serialize};

use crate::context::GenerationContext;
use crate::error::{Error, Result};
use crate::naming::local_name;

/// Root of the IR: everything known about one WSDL document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Service name from the `definitions` element
    pub name: String,
    /// Target namespace of the document
    pub target_namespace: String,
    /// Declared services with their ports
    pub services: Vec<Service>,
    /// Protocol bindings
    pub bindings: Vec<Binding>,
    /// Abstract operation sets
    pub port_types: Vec<PortType>,
    /// Named messages
    pub messages: Vec<Message>,
    /// Complex types recovered from the embedded schema
    pub complex_types: Vec<ComplexType>,
}

/// A WSDL service: a named set of ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service name
    pub name: String,
    /// Concrete endpoints
    pub ports: Vec<Port>,
}

/// A service port tying a binding to a network address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Binding reference (may carry a namespace prefix)
    pub binding: String,
    /// Endpoint address URL
    pub address: String,
}

/// A protocol binding with its operation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Binding name
    pub name: String,
    /// Port type reference
    pub type_ref: String,
    /// Bound operations
    pub operations: Vec<BindingOperation>,
}

/// One operation inside a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingOperation {
    /// Operation name, matching a port type operation
    pub name: String,
    /// SOAPAction URI for the transport header
    pub soap_action: String,
}

/// An abstract operation set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortType {
    /// Port type name
    pub name: String,
    /// Declared operations
    pub operations: Vec<Operation>,
}

/// One abstract operation with its message references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation name
    pub name: String,
    /// Free-text documentation from the WSDL
    pub documentation: String,
    /// Input message reference
    pub input_message: String,
    /// Output message reference
    pub output_message: String,
}

/// A named message: an ordered list of parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message name
    pub name: String,
    /// Message parts
    pub parts: Vec<Part>,
}

/// One message part, referencing either a type or an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Part name
    pub name: String,
    /// Element reference, for document-style messages
    pub element: Option<String>,
    /// Direct type reference, for RPC-style messages
    pub type_ref: Option<String>,
}

/// A complex type from the schema section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexType {
    /// Type name (for inline types, the name of the declaring element)
    pub name: String,
    /// Child elements in declaration order
    pub elements: Vec<ElementDef>,
    /// Attributes in declaration order
    pub attributes: Vec<AttributeDef>,
}

/// An element declaration with its multiplicity annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDef {
    /// Element name
    pub name: String,
    /// Type reference
    pub type_ref: String,
    /// `minOccurs` attribute, `"1"` when absent
    pub min_occurs: String,
    /// `maxOccurs` attribute, `"1"` when absent
    pub max_occurs: String,
    /// `nillable` attribute
    pub nillable: bool,
}

impl Default for ElementDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_ref: String::new(),
            min_occurs: "1".to_string(),
            max_occurs: "1".to_string(),
            nillable: false,
        }
    }
}

/// An attribute declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name
    pub name: String,
    /// Type reference
    pub type_ref: String,
    /// `use` attribute (`optional`, `required`, ...)
    pub usage: String,
}

/// A resolved field of an operation's request or response shape.
///
/// Parts carrying a direct type reference become one field each with
/// default multiplicity; a part carrying an element reference expands to
/// the referenced complex type's elements with their own annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name as written in the document
    pub name: String,
    /// Type reference (may carry a namespace prefix)
    pub type_ref: String,
    /// `minOccurs`, `"1"` for plain parts
    pub min_occurs: String,
    /// `maxOccurs`, `"1"` for plain parts
    pub max_occurs: String,
    /// Nillable flag
    pub nillable: bool,
}

impl Field {
    fn from_part(part: &Part, type_ref: &str) -> Self {
        Self {
            name: part.name.clone(),
            type_ref: type_ref.to_string(),
            min_occurs: "1".to_string(),
            max_occurs: "1".to_string(),
            nillable: false,
        }
    }

    fn from_element(element: &ElementDef) -> Self {
        Self {
            name: element.name.clone(),
            type_ref: element.type_ref.clone(),
            min_occurs: element.min_occurs.clone(),
            max_occurs: element.max_occurs.clone(),
            nillable: element.nillable,
        }
    }
}

/// Outcome of [`ServiceDefinition::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Binding operations with no matching port type operation
    pub unmatched_binding_operations: Vec<String>,
    /// Message or type references that do not resolve
    pub unresolved_references: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` when nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unmatched_binding_operations.is_empty() && self.unresolved_references.is_empty()
    }
}

impl ServiceDefinition {
    /// Looks up a message by name, prefixes stripped on both sides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedReference`] when no message matches.
    pub fn find_message(&self, name: &str) -> Result<&Message> {
        let wanted = local_name(name);
        self.messages
            .iter()
            .find(|m| local_name(&m.name) == wanted)
            .ok_or_else(|| Error::UnresolvedReference {
                reference: wanted.to_string(),
            })
    }

    /// Looks up a complex type by name, prefixes stripped on both sides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedReference`] when no type matches.
    pub fn find_complex_type(&self, name: &str) -> Result<&ComplexType> {
        let wanted = local_name(name);
        self.complex_types
            .iter()
            .find(|t| local_name(&t.name) == wanted)
            .ok_or_else(|| Error::UnresolvedReference {
                reference: wanted.to_string(),
            })
    }

    /// Finds the SOAPAction bound to an operation name, if any.
    #[must_use]
    pub fn soap_action(&self, operation_name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .flat_map(|b| &b.operations)
            .find(|op| op.name == operation_name)
            .map(|op| op.soap_action.as_str())
    }

    /// First non-empty port address, the way the original endpoint is
    /// selected for generated clients and the bridge.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.services
            .iter()
            .flat_map(|s| &s.ports)
            .map(|p| p.address.as_str())
            .find(|a| !a.is_empty())
    }

    /// Iterates over every operation of every port type.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.port_types.iter().flat_map(|pt| &pt.operations)
    }

    /// Finds an operation by name.
    #[must_use]
    pub fn find_operation(&self, name: &str) -> Option<&Operation> {
        self.operations().find(|op| op.name == name)
    }

    /// Resolves the field list of a message reference.
    ///
    /// Parts with a direct type reference yield one required field each.
    /// A part with an element reference expands to the elements of the
    /// complex type registered under the element's name (document-style
    /// messages). A part with neither reference contributes an opaque
    /// string field rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedReference`] when the message itself or a
    /// referenced element does not resolve.
    pub fn message_fields(&self, message_ref: &str) -> Result<Vec<Field>> {
        let message = self.find_message(message_ref)?;
        let mut fields = Vec::new();
        for part in &message.parts {
            if let Some(type_ref) = &part.type_ref {
                fields.push(Field::from_part(part, type_ref));
            } else if let Some(element_ref) = &part.element {
                let complex = self.find_complex_type(element_ref)?;
                fields.extend(complex.elements.iter().map(Field::from_element));
            } else {
                fields.push(Field::from_part(part, "string"));
            }
        }
        Ok(fields)
    }

    /// Cross-checks the internal references of the definition.
    ///
    /// Violations are reported and counted on the context, never fatal:
    /// a structurally valid but incomplete document still processes, with
    /// every degradation observable.
    pub fn validate(&self, ctx: &GenerationContext) -> ValidationReport {
        let mut report = ValidationReport::default();

        let operation_names: Vec<&str> =
            self.operations().map(|op| op.name.as_str()).collect();
        for binding in &self.bindings {
            for bound in &binding.operations {
                let matches = operation_names
                    .iter()
                    .filter(|n| **n == bound.name)
                    .count();
                if matches != 1 {
                    ctx.record_unresolved(&bound.name);
                    report.unmatched_binding_operations.push(bound.name.clone());
                }
            }
        }

        for operation in self.operations() {
            for message_ref in [&operation.input_message, &operation.output_message] {
                if message_ref.is_empty() {
                    continue;
                }
                if let Err(err) = self.message_fields(message_ref) {
                    if let Error::UnresolvedReference { reference } = &err {
                        ctx.record_unresolved(reference);
                        report.unresolved_references.push(reference.clone());
                    }
                }
            }
        }

        report
    }
}
