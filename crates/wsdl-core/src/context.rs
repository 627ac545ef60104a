//! Per-run generation state.
//!
//! A [`GenerationContext`] is created once per pipeline invocation, owned
//! by the run and passed explicitly to every emitter. It carries the set of
//! complex-type names known to the service description, a registry of
//! already-emitted type names, and counters for the degradation events the
//! tolerant processing mode produces. There is no process-global state.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::ServiceDefinition;
use crate::naming::local_name;
use crate::projector::{BaseClass, Target, TypeDescriptor, project};

/// Shared, per-run generation context.
///
/// Thread-safe; counters use relaxed atomics and the emitted-name registry
/// sits behind a mutex, so emitters may run from any task.
#[derive(Debug, Default)]
pub struct GenerationContext {
    known_types: BTreeSet<String>,
    emitted: Mutex<BTreeSet<String>>,
    projection_warnings: AtomicUsize,
    unresolved_references: AtomicUsize,
}

impl GenerationContext {
    /// Creates an empty context with no known complex types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context seeded with the complex types of a service
    /// description.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsdl2rest_core::context::GenerationContext;
    /// use wsdl2rest_core::model::ServiceDefinition;
    ///
    /// let def = ServiceDefinition::default();
    /// let ctx = GenerationContext::for_definition(&def);
    /// assert_eq!(ctx.projection_warnings(), 0);
    /// ```
    #[must_use]
    pub fn for_definition(definition: &ServiceDefinition) -> Self {
        let known_types = definition
            .complex_types
            .iter()
            .map(|t| local_name(&t.name).to_string())
            .collect();
        Self {
            known_types,
            ..Self::default()
        }
    }

    /// Projects a type reference, recording a countable warning when the
    /// reference degrades to the opaque type.
    ///
    /// The projection itself is pure; only the bookkeeping lives here.
    pub fn project(
        &self,
        type_ref: &str,
        min_occurs: &str,
        max_occurs: &str,
        nillable: bool,
        target: Target,
    ) -> TypeDescriptor {
        let descriptor = project(
            type_ref,
            min_occurs,
            max_occurs,
            nillable,
            target,
            &self.known_types,
        );
        if descriptor.class == BaseClass::Opaque {
            self.projection_warnings.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                type_ref,
                ?target,
                "unknown type reference degraded to opaque type"
            );
        }
        descriptor
    }

    /// The complex-type names known to this run, prefix-stripped.
    #[must_use]
    pub fn known_types(&self) -> &BTreeSet<String> {
        &self.known_types
    }

    /// Marks a type name as emitted; returns `false` if it already was.
    ///
    /// Emitters use this to avoid duplicating shared complex types.
    pub fn mark_emitted(&self, name: &str) -> bool {
        self.emitted
            .lock()
            .expect("emitted-name registry poisoned")
            .insert(name.to_string())
    }

    /// Records a dangling reference that degraded an entity.
    pub fn record_unresolved(&self, reference: &str) {
        self.unresolved_references.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(reference, "unresolved reference, entity degraded");
    }

    /// Number of opaque-type degradations recorded so far.
    #[must_use]
    pub fn projection_warnings(&self) -> usize {
        self.projection_warnings.load(Ordering::Relaxed)
    }

    /// Number of unresolved references recorded so far.
    #[must_use]
    pub fn unresolved_references(&self) -> usize {
        self.unresolved_references.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComplexType, ServiceDefinition};
    use crate::projector::TypeKind;

    fn definition_with_type(name: &str) -> ServiceDefinition {
        ServiceDefinition {
            complex_types: vec![ComplexType {
                name: name.to_string(),
                elements: vec![],
                attributes: vec![],
            }],
            ..ServiceDefinition::default()
        }
    }

    #[test]
    fn test_known_types_seeded_from_definition() {
        let ctx = GenerationContext::for_definition(&definition_with_type("tns:UserRecord"));
        assert!(ctx.known_types().contains("UserRecord"));
    }

    #[test]
    fn test_opaque_projection_counted() {
        let ctx = GenerationContext::new();
        let d = ctx.project("tns:Mystery", "1", "1", false, Target::Rust);
        assert_eq!(d.class, BaseClass::Opaque);
        assert_eq!(ctx.projection_warnings(), 1);

        ctx.project("tns:Mystery", "1", "1", false, Target::TypeScript);
        assert_eq!(ctx.projection_warnings(), 2);
    }

    #[test]
    fn test_primitive_projection_not_counted() {
        let ctx = GenerationContext::new();
        let d = ctx.project("string", "0", "1", false, Target::Rust);
        assert_eq!(d.kind, TypeKind::Optional);
        assert_eq!(ctx.projection_warnings(), 0);
    }

    #[test]
    fn test_mark_emitted_deduplicates() {
        let ctx = GenerationContext::new();
        assert!(ctx.mark_emitted("UserRecord"));
        assert!(!ctx.mark_emitted("UserRecord"));
        assert!(ctx.mark_emitted("OrderRecord"));
    }

    #[test]
    fn test_unresolved_counter() {
        let ctx = GenerationContext::new();
        ctx.record_unresolved("MissingMessage");
        ctx.record_unresolved("MissingType");
        assert_eq!(ctx.unresolved_references(), 2);
    }
}
