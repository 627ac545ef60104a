//! TypeScript client emitter.
//!
//! Renders `types.ts`, `client.ts` and `index.ts` through the handlebars
//! templates. Interfaces mirror the OpenAPI paths one to one: field names
//! come from the normalizer's camelCase form, types from the shared
//! projector, optionality from the `?` marker. The fetch wrapper bounds
//! every call with an `AbortController` timeout and surfaces non-2xx
//! responses as a typed error carrying the decoded fault body when one
//! exists.

use serde::Serialize;
use wsdl2rest_core::projector::{Target, TypeKind};
use wsdl2rest_core::{Field, GenerationContext, Identifier, Result, ServiceDefinition};

use crate::bundle::{GeneratedCode, GeneratedFile};
use crate::shapes;
use crate::template_engine::TemplateEngine;

#[derive(Debug, Serialize)]
struct TsField {
    name: String,
    ts_type: String,
    optional: bool,
}

#[derive(Debug, Serialize)]
struct TsInterface {
    name: String,
    documentation: String,
    fields: Vec<TsField>,
}

#[derive(Debug, Serialize)]
struct TsMethod {
    method_name: String,
    raw_name: String,
    documentation: String,
    request_type: String,
    response_type: String,
    path: String,
}

#[derive(Debug, Serialize)]
struct TypesContext {
    service_name: String,
    interfaces: Vec<TsInterface>,
}

#[derive(Debug, Serialize)]
struct ClientContext {
    service_name: String,
    base_url: String,
    methods: Vec<TsMethod>,
}

#[derive(Debug, Serialize)]
struct IndexContext {
    service_name: String,
}

/// Emits the TypeScript client bundle.
///
/// # Errors
///
/// Returns [`Error::Template`](wsdl2rest_core::Error::Template) when a
/// template fails to render; no partial bundle is returned.
pub fn emit(definition: &ServiceDefinition, ctx: &GenerationContext) -> Result<GeneratedCode> {
    let operations = shapes::resolve(definition, ctx);
    tracing::info!(operations = operations.len(), "emitting TypeScript client");

    let mut interfaces = Vec::new();
    let mut methods = Vec::new();
    for op in &operations {
        let exported = op.name.exported();
        interfaces.push(interface(
            format!("{exported}Request"),
            format!("Request for the {} operation.", op.raw_name),
            &op.input,
            ctx,
        ));
        interfaces.push(interface(
            format!("{exported}Response"),
            format!("Response of the {} operation.", op.raw_name),
            &op.output,
            ctx,
        ));
        methods.push(TsMethod {
            method_name: op.name.field().to_string(),
            raw_name: op.raw_name.clone(),
            documentation: op.documentation.clone(),
            request_type: format!("{exported}Request"),
            response_type: format!("{exported}Response"),
            path: format!("/api/{exported}"),
        });
    }

    // Complex types referenced from operation fields, so every named
    // reference in types.ts resolves.
    for complex in &definition.complex_types {
        let name = Identifier::normalize(&complex.name);
        if name.is_empty() || !ctx.mark_emitted(&format!("ts:{}", name.exported())) {
            continue;
        }
        let referenced = operations.iter().any(|op| {
            op.input
                .iter()
                .chain(&op.output)
                .any(|f| Identifier::normalize(&f.type_ref).exported() == name.exported())
        });
        if referenced {
            let fields: Vec<Field> = complex
                .elements
                .iter()
                .map(|e| Field {
                    name: e.name.clone(),
                    type_ref: e.type_ref.clone(),
                    min_occurs: e.min_occurs.clone(),
                    max_occurs: e.max_occurs.clone(),
                    nillable: e.nillable,
                })
                .collect();
            interfaces.push(interface(
                name.exported().to_string(),
                format!("Complex type {} from the service schema.", complex.name),
                &fields,
                ctx,
            ));
        }
    }

    let service_name = if definition.name.is_empty() {
        "the service".to_string()
    } else {
        definition.name.clone()
    };
    let engine = TemplateEngine::new()?;

    let mut bundle = GeneratedCode::new();
    bundle.add_file(GeneratedFile::new(
        "types.ts",
        engine.render(
            "typescript/types",
            &TypesContext {
                service_name: service_name.clone(),
                interfaces,
            },
        )?,
    ));
    bundle.add_file(GeneratedFile::new(
        "client.ts",
        engine.render(
            "typescript/client",
            &ClientContext {
                service_name: service_name.clone(),
                base_url: definition
                    .endpoint()
                    .unwrap_or("http://localhost:8080")
                    .to_string(),
                methods,
            },
        )?,
    ));
    bundle.add_file(GeneratedFile::new(
        "index.ts",
        engine.render("typescript/index", &IndexContext { service_name })?,
    ));
    Ok(bundle)
}

fn interface(
    name: String,
    documentation: String,
    fields: &[Field],
    ctx: &GenerationContext,
) -> TsInterface {
    let fields = fields
        .iter()
        .filter_map(|field| {
            let id = Identifier::normalize(&field.name);
            if id.is_empty() {
                return None;
            }
            let descriptor = ctx.project(
                &field.type_ref,
                &field.min_occurs,
                &field.max_occurs,
                field.nillable,
                Target::TypeScript,
            );
            Some(TsField {
                name: id.field().to_string(),
                ts_type: descriptor.syntax,
                optional: descriptor.kind == TypeKind::Optional,
            })
        })
        .collect();
    TsInterface {
        name,
        documentation,
        fields,
    }
}
