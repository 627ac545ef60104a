//! OpenAPI 3.0 document emitter.
//!
//! Builds a serde data model of the document (paths, schemas,
//! components) from the IR and the shared projector, then serializes it
//! with the pretty printer. One POST path per operation under
//! `/api/{Operation}`, a generic 500 response carrying the SOAP fault
//! triple, and named complex types under `components/schemas`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wsdl2rest_core::projector::{BaseClass, Target, TypeKind};
use wsdl2rest_core::{
    Error, Field, GenerationContext, Identifier, Result, ServiceDefinition,
};

use crate::bundle::{GeneratedCode, GeneratedFile};
use crate::shapes::{self, OperationShape};

/// An OpenAPI 3.0 document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version, always `3.0.0`
    pub openapi: String,
    /// API metadata
    pub info: Info,
    /// Known servers, one per service port with an address
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,
    /// One entry per operation
    pub paths: BTreeMap<String, PathItem>,
    /// Reusable schemas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// API metadata block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// Document title, from the service name
    pub title: String,
    /// Free-text description
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    /// Document version
    pub version: String,
}

/// A server entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Base URL
    pub url: String,
    /// Human-readable label
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
}

/// Operations available on one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathItem {
    /// The POST operation; the only method the projection uses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<OperationObject>,
}

/// One operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationObject {
    /// Short summary, the operation name
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub summary: String,
    /// WSDL documentation text
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    /// Unique operation id
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// JSON request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: BTreeMap<String, Response>,
}

/// A request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Free-text description
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    /// Whether the body is mandatory
    pub required: bool,
    /// Media types, keyed by content type
    pub content: BTreeMap<String, MediaType>,
}

/// A response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Free-text description
    pub description: String,
    /// Media types, keyed by content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// One media type carrying a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    /// Payload schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// A JSON schema object, restricted to the subset the projection needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Schema type (`object`, `string`, `integer`, ...)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format qualifier (`int32`, `date-time`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Object properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Names of required properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Array item schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Reference into `components/schemas`
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Reusable components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Components {
    /// Named schemas
    pub schemas: BTreeMap<String, Schema>,
}

/// Converts a service definition into an OpenAPI document.
#[must_use]
pub fn document(definition: &ServiceDefinition, ctx: &GenerationContext) -> OpenApiDocument {
    let operations = shapes::resolve(definition, ctx);
    tracing::info!(operations = operations.len(), "emitting OpenAPI document");

    let servers = definition
        .services
        .iter()
        .flat_map(|svc| {
            svc.ports.iter().filter(|p| !p.address.is_empty()).map(|p| Server {
                url: p.address.clone(),
                description: format!("{} - {}", svc.name, p.name),
            })
        })
        .collect();

    let mut paths = BTreeMap::new();
    for op in &operations {
        paths.insert(
            format!("/api/{}", op.name.exported()),
            PathItem {
                post: Some(operation_object(op, ctx)),
            },
        );
    }

    let mut schemas = BTreeMap::new();
    for complex in &definition.complex_types {
        let name = Identifier::normalize(&complex.name);
        if name.is_empty() || !ctx.mark_emitted(&format!("openapi:{}", name.exported())) {
            continue;
        }
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
        schemas.insert(name.exported().to_string(), object_schema(&fields, ctx));
    }

    OpenApiDocument {
        openapi: "3.0.0".to_string(),
        info: Info {
            title: definition.name.clone(),
            description: format!(
                "API converted from WSDL: {}",
                definition.target_namespace
            ),
            version: "1.0.0".to_string(),
        },
        servers,
        paths,
        components: Some(Components { schemas }),
    }
}

/// Emits the document as a pretty-printed `openapi.json` bundle.
///
/// # Errors
///
/// Returns [`Error::Template`] when serialization fails.
pub fn emit(definition: &ServiceDefinition, ctx: &GenerationContext) -> Result<GeneratedCode> {
    let doc = document(definition, ctx);
    let json = serde_json::to_string_pretty(&doc).map_err(|e| Error::Template {
        message: format!("failed to serialize OpenAPI document: {e}"),
    })?;
    let mut bundle = GeneratedCode::new();
    bundle.add_file(GeneratedFile::new("openapi.json", json));
    Ok(bundle)
}

fn operation_object(op: &OperationShape, ctx: &GenerationContext) -> OperationObject {
    let mut responses = BTreeMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: format!("Successful response for {}", op.raw_name),
            content: Some(json_content(object_schema(&op.output, ctx))),
        },
    );
    responses.insert("500".to_string(), fault_response());

    OperationObject {
        summary: op.raw_name.clone(),
        description: op.documentation.clone(),
        operation_id: op.name.exported().to_string(),
        request_body: Some(RequestBody {
            description: format!("Request for {} operation", op.raw_name),
            required: true,
            content: json_content(object_schema(&op.input, ctx)),
        }),
        responses,
    }
}

/// The generic SOAP fault response shared by every path.
fn fault_response() -> Response {
    let mut properties = BTreeMap::new();
    for key in ["faultcode", "faultstring", "detail"] {
        properties.insert(
            key.to_string(),
            Schema {
                schema_type: Some("string".to_string()),
                ..Schema::default()
            },
        );
    }
    Response {
        description: "SOAP Fault".to_string(),
        content: Some(json_content(Schema {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            ..Schema::default()
        })),
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(
        "application/json".to_string(),
        MediaType {
            schema: Some(schema),
        },
    );
    content
}

/// Object schema for a field list, with the required-name list derived
/// from the projected multiplicity.
fn object_schema(fields: &[Field], ctx: &GenerationContext) -> Schema {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();

    for field in fields {
        let key = Identifier::normalize(&field.name);
        if key.is_empty() {
            continue;
        }
        let descriptor = ctx.project(
            &field.type_ref,
            &field.min_occurs,
            &field.max_occurs,
            field.nillable,
            Target::OpenApi,
        );

        let base = match descriptor.class {
            BaseClass::Complex => Schema {
                reference: Some(format!("#/components/schemas/{}", descriptor.base)),
                ..Schema::default()
            },
            BaseClass::Opaque => Schema {
                schema_type: Some("object".to_string()),
                ..Schema::default()
            },
            BaseClass::Primitive => Schema {
                schema_type: Some(descriptor.base.clone()),
                format: descriptor.format.clone(),
                ..Schema::default()
            },
        };

        let schema = if descriptor.kind == TypeKind::Array {
            Schema {
                schema_type: Some("array".to_string()),
                items: Some(Box::new(base)),
                ..Schema::default()
            }
        } else {
            base
        };

        let is_required = match descriptor.kind {
            TypeKind::Scalar => true,
            TypeKind::Array => field.min_occurs != "0",
            TypeKind::Optional => false,
        };
        if is_required {
            required.push(key.field().to_string());
        }
        properties.insert(key.field().to_string(), schema);
    }

    Schema {
        schema_type: Some("object".to_string()),
        properties: Some(properties),
        required: if required.is_empty() {
            None
        } else {
            Some(required)
        },
        ..Schema::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsdl2rest_core::{
        Binding, BindingOperation, ComplexType, ElementDef, Message, Operation, Part, Port,
        PortType, Service,
    };

    fn calculator() -> ServiceDefinition {
        ServiceDefinition {
            name: "Calculator".to_string(),
            target_namespace: "http://tempuri.org/".to_string(),
            services: vec![Service {
                name: "Calculator".to_string(),
                ports: vec![Port {
                    name: "CalculatorSoap".to_string(),
                    binding: "tns:CalculatorSoap".to_string(),
                    address: "http://example.com/calc.asmx".to_string(),
                }],
            }],
            bindings: vec![Binding {
                name: "CalculatorSoap".to_string(),
                type_ref: "tns:CalculatorSoap".to_string(),
                operations: vec![BindingOperation {
                    name: "Add".to_string(),
                    soap_action: "http://tempuri.org/Add".to_string(),
                }],
            }],
            port_types: vec![PortType {
                name: "CalculatorSoap".to_string(),
                operations: vec![Operation {
                    name: "Add".to_string(),
                    documentation: "Adds two integers.".to_string(),
                    input_message: "AddSoapIn".to_string(),
                    output_message: "AddSoapOut".to_string(),
                }],
            }],
            messages: vec![
                Message {
                    name: "AddSoapIn".to_string(),
                    parts: vec![Part {
                        name: "parameters".to_string(),
                        element: Some("tns:Add".to_string()),
                        type_ref: None,
                    }],
                },
                Message {
                    name: "AddSoapOut".to_string(),
                    parts: vec![Part {
                        name: "parameters".to_string(),
                        element: Some("tns:AddResponse".to_string()),
                        type_ref: None,
                    }],
                },
            ],
            complex_types: vec![
                ComplexType {
                    name: "Add".to_string(),
                    elements: vec![
                        ElementDef {
                            name: "intA".to_string(),
                            type_ref: "s:int".to_string(),
                            ..ElementDef::default()
                        },
                        ElementDef {
                            name: "intB".to_string(),
                            type_ref: "s:int".to_string(),
                            ..ElementDef::default()
                        },
                    ],
                    attributes: vec![],
                },
                ComplexType {
                    name: "AddResponse".to_string(),
                    elements: vec![ElementDef {
                        name: "AddResult".to_string(),
                        type_ref: "s:int".to_string(),
                        ..ElementDef::default()
                    }],
                    attributes: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_add_path_with_int32_properties() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let doc = document(&def, &ctx);

        let path = doc.paths.get("/api/Add").unwrap();
        let post = path.post.as_ref().unwrap();
        assert_eq!(post.operation_id, "Add");

        let body = post.request_body.as_ref().unwrap();
        let schema = body.content["application/json"].schema.as_ref().unwrap();
        let props = schema.properties.as_ref().unwrap();
        assert_eq!(props["intA"].schema_type.as_deref(), Some("integer"));
        assert_eq!(props["intA"].format.as_deref(), Some("int32"));
        let required = schema.required.as_ref().unwrap();
        assert!(required.contains(&"intA".to_string()));
        assert!(required.contains(&"intB".to_string()));
    }

    #[test]
    fn test_optional_field_left_out_of_required() {
        let mut def = calculator();
        def.complex_types[0].elements.push(ElementDef {
            name: "note".to_string(),
            type_ref: "s:string".to_string(),
            min_occurs: "0".to_string(),
            ..ElementDef::default()
        });
        let ctx = GenerationContext::for_definition(&def);
        let doc = document(&def, &ctx);

        let schema = doc.paths["/api/Add"]
            .post
            .as_ref()
            .unwrap()
            .request_body
            .as_ref()
            .unwrap()
            .content["application/json"]
            .schema
            .as_ref()
            .unwrap();
        assert!(schema.properties.as_ref().unwrap().contains_key("note"));
        assert!(!schema.required.as_ref().unwrap().contains(&"note".to_string()));
    }

    #[test]
    fn test_fault_response_on_every_path() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let doc = document(&def, &ctx);
        let post = doc.paths["/api/Add"].post.as_ref().unwrap();
        let fault = &post.responses["500"];
        assert_eq!(fault.description, "SOAP Fault");
        let schema = fault.content.as_ref().unwrap()["application/json"]
            .schema
            .as_ref()
            .unwrap();
        let props = schema.properties.as_ref().unwrap();
        assert!(props.contains_key("faultcode"));
        assert!(props.contains_key("faultstring"));
        assert!(props.contains_key("detail"));
    }

    #[test]
    fn test_servers_and_components() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let doc = document(&def, &ctx);
        assert_eq!(doc.servers[0].url, "http://example.com/calc.asmx");
        let components = doc.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("Add"));
        assert!(components.schemas.contains_key("AddResponse"));
    }

    #[test]
    fn test_unknown_type_degrades_to_object_schema() {
        let mut def = calculator();
        def.complex_types[0].elements.push(ElementDef {
            name: "mystery".to_string(),
            type_ref: "tns:Unknown".to_string(),
            ..ElementDef::default()
        });
        let ctx = GenerationContext::for_definition(&def);
        let doc = document(&def, &ctx);
        let schema = doc.paths["/api/Add"]
            .post
            .as_ref()
            .unwrap()
            .request_body
            .as_ref()
            .unwrap()
            .content["application/json"]
            .schema
            .as_ref()
            .unwrap();
        assert_eq!(
            schema.properties.as_ref().unwrap()["mystery"]
                .schema_type
                .as_deref(),
            Some("object")
        );
        assert!(ctx.projection_warnings() > 0);
    }

    #[test]
    fn test_emit_serializes_json() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx).unwrap();
        let json = &bundle.find("openapi.json").unwrap().content;
        let parsed: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(parsed["openapi"], "3.0.0");
        assert_eq!(parsed["info"]["title"], "Calculator");
    }
}
