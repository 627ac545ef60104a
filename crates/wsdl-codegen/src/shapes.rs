//! Resolved operation shapes shared by the emitters.
//!
//! Every emitter consumes the same resolved view of an operation: its
//! normalized name, SOAP action and the input/output field lists from the
//! IR. Operations whose messages do not resolve are dropped here with a
//! counted degradation, so a single dangling reference never aborts a
//! whole target.

use wsdl2rest_core::{Error, Field, GenerationContext, Identifier, ServiceDefinition};

/// One operation with its message references resolved to field lists.
#[derive(Debug, Clone)]
pub(crate) struct OperationShape {
    /// Normalized operation name
    pub name: Identifier,
    /// Name as written in the document
    pub raw_name: String,
    /// Free-text documentation
    pub documentation: String,
    /// SOAPAction bound to the operation, empty when unbound
    pub soap_action: String,
    /// Request fields
    pub input: Vec<Field>,
    /// Response fields
    pub output: Vec<Field>,
}

/// Resolves every operation of the definition, skipping the unresolvable.
pub(crate) fn resolve(
    definition: &ServiceDefinition,
    ctx: &GenerationContext,
) -> Vec<OperationShape> {
    definition
        .operations()
        .filter_map(|op| {
            let input = fields_or_degrade(definition, &op.input_message, ctx)?;
            let output = fields_or_degrade(definition, &op.output_message, ctx)?;
            Some(OperationShape {
                name: Identifier::normalize(&op.name),
                raw_name: op.name.clone(),
                documentation: op.documentation.clone(),
                soap_action: definition
                    .soap_action(&op.name)
                    .unwrap_or_default()
                    .to_string(),
                input,
                output,
            })
        })
        .collect()
}

/// Empty message references resolve to an empty field list; dangling ones
/// degrade the operation.
fn fields_or_degrade(
    definition: &ServiceDefinition,
    message_ref: &str,
    ctx: &GenerationContext,
) -> Option<Vec<Field>> {
    if message_ref.is_empty() {
        return Some(Vec::new());
    }
    match definition.message_fields(message_ref) {
        Ok(fields) => Some(fields),
        Err(Error::UnresolvedReference { reference }) => {
            ctx.record_unresolved(&reference);
            None
        }
        Err(_) => None,
    }
}
