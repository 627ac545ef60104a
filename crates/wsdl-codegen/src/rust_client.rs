//! Rust SOAP client emitter.
//!
//! Emits a three-file module: `client.rs` (the transport scaffold with
//! WS-Security setters and a version switch), `types.rs` (one
//! request/response struct per operation) and `operations.rs` (one async
//! method per operation). Field types come from the shared projector,
//! names from the shared normalizer; the emitted client calls into
//! `wsdl2rest-soap` for envelopes and security headers.

use std::fmt::Write as _;

use wsdl2rest_core::projector::{BaseClass, Target, TypeKind};
use wsdl2rest_core::{Field, GenerationContext, Identifier, Result, ServiceDefinition};
use wsdl2rest_soap::SoapVersion;

use crate::bundle::{GeneratedCode, GeneratedFile};
use crate::shapes::{self, OperationShape};

/// Options for the Rust client emitter.
#[derive(Debug, Clone)]
pub struct EmitterOptions {
    /// Module name written into the generated file headers
    pub module_name: String,
    /// SOAP version the generated client defaults to
    pub soap_version: SoapVersion,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            module_name: "client".to_string(),
            soap_version: SoapVersion::V11,
        }
    }
}

/// Emits the Rust client bundle for a service definition.
///
/// Operations whose input or output message does not resolve are skipped
/// with a counted degradation; the remaining operations are still
/// emitted. The bundle is all-or-nothing: an emission failure returns the
/// error and no files.
///
/// # Errors
///
/// Currently only formatting can fail, which `std::fmt::Write` on
/// `String` never does; the `Result` keeps the emitter signatures
/// uniform.
pub fn emit(
    definition: &ServiceDefinition,
    ctx: &GenerationContext,
    options: &EmitterOptions,
) -> Result<GeneratedCode> {
    let operations = shapes::resolve(definition, ctx);
    tracing::info!(
        operations = operations.len(),
        module = %options.module_name,
        "emitting Rust client"
    );

    let mut bundle = GeneratedCode::new();
    bundle.add_file(GeneratedFile::new(
        "client.rs",
        client_scaffold(definition, options),
    ));
    bundle.add_file(GeneratedFile::new(
        "types.rs",
        types_module(definition, ctx, &operations, options),
    ));
    bundle.add_file(GeneratedFile::new(
        "operations.rs",
        operations_module(definition, ctx, &operations, options),
    ));
    Ok(bundle)
}

/// The transport scaffold: endpoint, headers, credentials, version
/// switch and the generic `call`.
fn client_scaffold(definition: &ServiceDefinition, options: &EmitterOptions) -> String {
    let endpoint = definition.endpoint().unwrap_or("http://localhost:8080/service");
    let version_variant = version_variant(options.soap_version);
    let service = if definition.name.is_empty() {
        "the service".to_string()
    } else {
        definition.name.clone()
    };

    format!(
        r#"//! SOAP client for {service}.

use std::collections::HashMap;

use wsdl2rest_core::{{Error, Result}};
use wsdl2rest_soap::{{decode, encode, SecurityCredential, SecurityHeader, SoapVersion}};

/// Default endpoint taken from the service description.
pub const DEFAULT_ENDPOINT: &str = "{endpoint}";

/// SOAP client with optional WS-Security credentials.
#[derive(Debug)]
pub struct Client {{
    /// Endpoint URL the client posts to
    pub url: String,
    http: reqwest::Client,
    headers: HashMap<String, String>,
    security: Option<SecurityCredential>,
    soap_version: SoapVersion,
}}

impl Client {{
    /// Creates a client; an empty URL falls back to [`DEFAULT_ENDPOINT`].
    #[must_use]
    pub fn new(url: &str) -> Self {{
        let url = if url.is_empty() {{ DEFAULT_ENDPOINT }} else {{ url }};
        Self {{
            url: url.to_string(),
            http: reqwest::Client::new(),
            headers: HashMap::new(),
            security: None,
            soap_version: SoapVersion::{version_variant},
        }}
    }}

    /// Authenticates with a plaintext-password UsernameToken.
    pub fn set_basic_auth(&mut self, username: &str, password: &str) {{
        self.security = Some(SecurityCredential::plaintext(username, password));
    }}

    /// Authenticates with a digest-password UsernameToken.
    pub fn set_digest_auth(&mut self, username: &str, password: &str) {{
        self.security = Some(SecurityCredential::digest(username, password));
    }}

    /// Switches the SOAP protocol version.
    pub fn set_soap_version(&mut self, version: SoapVersion) {{
        self.soap_version = version;
    }}

    /// Sets a custom HTTP header sent with every call.
    pub fn set_header(&mut self, key: &str, value: &str) {{
        self.headers.insert(key.to_string(), value.to_string());
    }}

    /// Posts a body payload to the endpoint and returns the decoded
    /// response payload.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] when the endpoint is unreachable or answers
    /// a non-success status without a SOAP body,
    /// [`Error::SoapFault`] when the response body carries a fault.
    pub async fn call(&self, soap_action: &str, payload: &str) -> Result<String> {{
        let security = self
            .security
            .as_ref()
            .map(|credential| SecurityHeader::build(credential, chrono::Utc::now()));
        let envelope = encode(self.soap_version, security.as_ref(), payload);

        let mut request = self
            .http
            .post(&self.url)
            .header("Content-Type", self.soap_version.content_type())
            .body(envelope);
        if self.soap_version.uses_soap_action() {{
            request = request.header("SOAPAction", format!("\"{{soap_action}}\""));
        }}
        for (key, value) in &self.headers {{
            request = request.header(key, value);
        }}

        let response = request.send().await.map_err(|err| Error::Transport {{
            message: format!("SOAP call to {{}} failed", self.url),
            source: Some(Box::new(err)),
        }})?;
        let status = response.status();
        let body = response.text().await.map_err(|err| Error::Transport {{
            message: "failed to read SOAP response".to_string(),
            source: Some(Box::new(err)),
        }})?;

        match decode(&body, self.soap_version) {{
            Ok(payload) => Ok(payload),
            Err(err) if err.is_soap_fault() => Err(err),
            Err(_) if !status.is_success() => Err(Error::Transport {{
                message: format!("SOAP request failed with status {{status}}"),
                source: None,
            }}),
            Err(err) => Err(err),
        }}
    }}
}}

/// Extracts the text of the first occurrence of a tag.
pub(crate) fn extract_tag(xml: &str, tag: &str) -> Option<String> {{
    let open = format!("<{{tag}}");
    let close = format!("</{{tag}}>");
    let start = xml.find(&open)?;
    let content_start = xml[start..].find('>')? + start + 1;
    let content_end = xml[content_start..].find(&close)? + content_start;
    Some(xml[content_start..content_end].to_string())
}}

/// Extracts the text of every occurrence of a tag.
pub(crate) fn extract_tags(xml: &str, tag: &str) -> Vec<String> {{
    let mut values = Vec::new();
    let mut rest = xml;
    while let Some(value) = extract_tag(rest, tag) {{
        let close = format!("</{{tag}}>");
        let cut = rest.find(&close).map_or(rest.len(), |i| i + close.len());
        values.push(value);
        rest = &rest[cut..];
    }}
    values
}}
"#
    )
}

/// `types.rs`: request/response structs with projector-derived fields.
fn types_module(
    definition: &ServiceDefinition,
    ctx: &GenerationContext,
    operations: &[OperationShape],
    options: &EmitterOptions,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "//! Request and response types for the {} module.\n",
        options.module_name
    );
    out.push_str("use serde::{Deserialize, Serialize};\n\n");

    for op in operations {
        let exported = op.name.exported();
        write_struct(
            &mut out,
            ctx,
            &format!("{exported}Request"),
            &format!("Request for the {} operation.", op.raw_name),
            &op.input,
        );
        write_struct(
            &mut out,
            ctx,
            &format!("{exported}Response"),
            &format!("Response of the {} operation.", op.raw_name),
            &op.output,
        );
    }

    // Shared complex types referenced by more than one operation.
    for complex in &definition.complex_types {
        let name = Identifier::normalize(&complex.name);
        if name.is_empty() || !ctx.mark_emitted(&format!("rust:{}", name.exported())) {
            continue;
        }
        let referenced = operations.iter().any(|op| {
            op.input
                .iter()
                .chain(&op.output)
                .any(|f| type_matches(&f.type_ref, name.exported()))
        });
        if referenced {
            let fields: Vec<Field> = complex.elements.iter().map(field_from_element).collect();
            write_struct(
                &mut out,
                ctx,
                name.exported(),
                &format!("Complex type {} from the service schema.", complex.name),
                &fields,
            );
        }
    }

    out
}

fn field_from_element(element: &wsdl2rest_core::ElementDef) -> Field {
    Field {
        name: element.name.clone(),
        type_ref: element.type_ref.clone(),
        min_occurs: element.min_occurs.clone(),
        max_occurs: element.max_occurs.clone(),
        nillable: element.nillable,
    }
}

fn type_matches(type_ref: &str, exported: &str) -> bool {
    Identifier::normalize(type_ref).exported() == exported
}

fn write_struct(
    out: &mut String,
    ctx: &GenerationContext,
    name: &str,
    doc: &str,
    fields: &[Field],
) {
    let _ = writeln!(out, "/// {doc}");
    let _ = writeln!(
        out,
        "#[derive(Debug, Clone, Default, Serialize, Deserialize)]"
    );
    let _ = writeln!(out, "pub struct {name} {{");
    for field in fields {
        let id = Identifier::normalize(&field.name);
        if id.is_empty() {
            continue;
        }
        let descriptor = ctx.project(
            &field.type_ref,
            &field.min_occurs,
            &field.max_occurs,
            field.nillable,
            Target::Rust,
        );
        if id.snake() != field.name {
            let _ = writeln!(out, "    #[serde(rename = \"{}\")]", field.name);
        }
        if descriptor.kind == TypeKind::Optional {
            let _ = writeln!(out, "    #[serde(skip_serializing_if = \"Option::is_none\")]");
        }
        let _ = writeln!(out, "    pub {}: {},", id.snake(), descriptor.syntax);
    }
    let _ = writeln!(out, "}}\n");
}

/// `operations.rs`: one async method per operation.
fn operations_module(
    definition: &ServiceDefinition,
    ctx: &GenerationContext,
    operations: &[OperationShape],
    options: &EmitterOptions,
) -> String {
    let tns = &definition.target_namespace;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "//! Operation methods for the {} module.\n",
        options.module_name
    );
    out.push_str("use std::fmt::Write as _;\n\n");
    out.push_str("use wsdl2rest_core::Result;\n\n");
    out.push_str("use crate::client::{extract_tag, extract_tags, Client};\n");
    out.push_str("use crate::types::*;\n\n");
    out.push_str("impl Client {\n");

    for op in operations {
        let exported = op.name.exported();
        let method = op.name.snake();
        let _ = writeln!(out, "    /// Calls the {} operation.", op.raw_name);
        if !op.documentation.is_empty() {
            let _ = writeln!(out, "    ///");
            for line in op.documentation.lines() {
                let _ = writeln!(out, "    /// {}", line.trim());
            }
        }
        let _ = writeln!(out, "    ///");
        let _ = writeln!(out, "    /// # Errors");
        let _ = writeln!(out, "    ///");
        let _ = writeln!(
            out,
            "    /// Transport failures and SOAP faults from the remote service."
        );
        let _ = writeln!(
            out,
            "    pub async fn {method}(&self, request: {exported}Request) -> Result<{exported}Response> {{"
        );
        let _ = writeln!(out, "        let mut payload = String::new();");
        let _ = writeln!(
            out,
            "        let _ = write!(payload, \"<{} xmlns=\\\"{tns}\\\">\");",
            op.raw_name
        );
        for field in &op.input {
            write_request_field(&mut out, ctx, field);
        }
        let _ = writeln!(out, "        payload.push_str(\"</{}>\");", op.raw_name);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "        let body = self.call(\"{}\", &payload).await?;",
            op.soap_action
        );
        let _ = writeln!(
            out,
            "        let mut response = {exported}Response::default();"
        );
        for field in &op.output {
            write_response_field(&mut out, ctx, field);
        }
        let _ = writeln!(out, "        Ok(response)");
        let _ = writeln!(out, "    }}\n");
    }

    out.push_str("}\n");
    out
}

/// Serialization snippet for one request field.
fn write_request_field(out: &mut String, ctx: &GenerationContext, field: &Field) {
    let id = Identifier::normalize(&field.name);
    if id.is_empty() {
        return;
    }
    let descriptor = ctx.project(
        &field.type_ref,
        &field.min_occurs,
        &field.max_occurs,
        field.nillable,
        Target::Rust,
    );
    let tag = &field.name;
    let snake = id.snake();
    match descriptor.kind {
        TypeKind::Scalar => {
            let _ = writeln!(
                out,
                "        let _ = write!(payload, \"<{tag}>{{}}</{tag}>\", {});",
                scalar_expr(&descriptor.base, &format!("request.{snake}"))
            );
        }
        TypeKind::Optional => {
            let _ = writeln!(out, "        if let Some(value) = &request.{snake} {{");
            let _ = writeln!(
                out,
                "            let _ = write!(payload, \"<{tag}>{{}}</{tag}>\", {});",
                scalar_expr(&descriptor.base, "value")
            );
            let _ = writeln!(out, "        }}");
        }
        TypeKind::Array => {
            let _ = writeln!(out, "        for value in &request.{snake} {{");
            let _ = writeln!(
                out,
                "            let _ = write!(payload, \"<{tag}>{{}}</{tag}>\", {});",
                scalar_expr(&descriptor.base, "value")
            );
            let _ = writeln!(out, "        }}");
        }
    }
}

/// Display expression for a value of the projected base type.
fn scalar_expr(base: &str, value: &str) -> String {
    if base == "Vec<u8>" {
        format!("String::from_utf8_lossy({value})")
    } else {
        value.to_string()
    }
}

/// Extraction snippet for one response field.
fn write_response_field(out: &mut String, ctx: &GenerationContext, field: &Field) {
    let id = Identifier::normalize(&field.name);
    if id.is_empty() {
        return;
    }
    let descriptor = ctx.project(
        &field.type_ref,
        &field.min_occurs,
        &field.max_occurs,
        field.nillable,
        Target::Rust,
    );
    let tag = &field.name;
    let snake = id.snake();
    match descriptor.kind {
        TypeKind::Array => {
            let _ = writeln!(
                out,
                "        response.{snake} = extract_tags(&body, \"{tag}\"){};",
                collect_suffix(&descriptor.base, descriptor.class)
            );
        }
        TypeKind::Optional => {
            let _ = writeln!(
                out,
                "        response.{snake} = extract_tag(&body, \"{tag}\"){};",
                option_suffix(&descriptor.base, descriptor.class)
            );
        }
        TypeKind::Scalar => {
            let _ = writeln!(out, "        if let Some(value) = extract_tag(&body, \"{tag}\") {{");
            let _ = writeln!(
                out,
                "            response.{snake} = {};",
                parse_expr(&descriptor.base, descriptor.class)
            );
            let _ = writeln!(out, "        }}");
        }
    }
}

fn parse_expr(base: &str, class: BaseClass) -> &'static str {
    if class == BaseClass::Opaque {
        return "serde_json::Value::String(value)";
    }
    match base {
        "String" => "value",
        "Vec<u8>" => "value.into_bytes()",
        _ => "value.parse().unwrap_or_default()",
    }
}

fn option_suffix(base: &str, class: BaseClass) -> &'static str {
    if class == BaseClass::Opaque {
        return ".map(serde_json::Value::String)";
    }
    match base {
        "String" => "",
        "Vec<u8>" => ".map(String::into_bytes)",
        _ => ".and_then(|value| value.parse().ok())",
    }
}

fn collect_suffix(base: &str, class: BaseClass) -> &'static str {
    if class == BaseClass::Opaque {
        return "\n            .into_iter().map(serde_json::Value::String).collect()";
    }
    match base {
        "String" => "",
        "Vec<u8>" => "\n            .into_iter().map(String::into_bytes).collect()",
        _ => "\n            .into_iter().filter_map(|value| value.parse().ok()).collect()",
    }
}

fn version_variant(version: SoapVersion) -> &'static str {
    match version {
        SoapVersion::V11 => "V11",
        SoapVersion::V12 => "V12",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsdl2rest_core::{
        ComplexType, ElementDef, Message, Operation, Part, Port, PortType, Service,
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
            bindings: vec![wsdl2rest_core::Binding {
                name: "CalculatorSoap".to_string(),
                type_ref: "tns:CalculatorSoap".to_string(),
                operations: vec![wsdl2rest_core::BindingOperation {
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
    fn test_bundle_has_three_files() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx, &EmitterOptions::default()).unwrap();
        assert_eq!(bundle.file_count(), 3);
        assert!(bundle.find("client.rs").is_some());
        assert!(bundle.find("types.rs").is_some());
        assert!(bundle.find("operations.rs").is_some());
    }

    #[test]
    fn test_endpoint_baked_into_scaffold() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx, &EmitterOptions::default()).unwrap();
        let client = &bundle.find("client.rs").unwrap().content;
        assert!(client.contains("http://example.com/calc.asmx"));
        assert!(client.contains("SoapVersion::V11"));
        assert!(client.contains("set_digest_auth"));
    }

    #[test]
    fn test_required_int_fields_projected() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx, &EmitterOptions::default()).unwrap();
        let types = &bundle.find("types.rs").unwrap().content;
        assert!(types.contains("pub struct AddRequest"));
        assert!(types.contains("pub int_a: i32,"));
        assert!(types.contains("pub int_b: i32,"));
        assert!(types.contains("#[serde(rename = \"intA\")]"));
        assert!(types.contains("pub struct AddResponse"));
        assert!(types.contains("pub add_result: i32,"));
    }

    #[test]
    fn test_optional_field_becomes_option() {
        let mut def = calculator();
        def.complex_types[0].elements.push(ElementDef {
            name: "note".to_string(),
            type_ref: "s:string".to_string(),
            min_occurs: "0".to_string(),
            ..ElementDef::default()
        });
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx, &EmitterOptions::default()).unwrap();
        let types = &bundle.find("types.rs").unwrap().content;
        assert!(types.contains("pub note: Option<String>,"));

        let operations = &bundle.find("operations.rs").unwrap().content;
        assert!(operations.contains("if let Some(value) = &request.note"));
    }

    #[test]
    fn test_operation_method_and_action() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx, &EmitterOptions::default()).unwrap();
        let operations = &bundle.find("operations.rs").unwrap().content;
        assert!(operations.contains("pub async fn add(&self, request: AddRequest)"));
        assert!(operations.contains("self.call(\"http://tempuri.org/Add\", &payload)"));
        assert!(operations.contains("Adds two integers."));
    }

    #[test]
    fn test_dangling_operation_skipped_not_fatal() {
        let mut def = calculator();
        def.port_types[0].operations.push(Operation {
            name: "Broken".to_string(),
            documentation: String::new(),
            input_message: "Nowhere".to_string(),
            output_message: String::new(),
        });
        let ctx = GenerationContext::for_definition(&def);
        let bundle = emit(&def, &ctx, &EmitterOptions::default()).unwrap();
        let operations = &bundle.find("operations.rs").unwrap().content;
        assert!(operations.contains("pub async fn add"));
        assert!(!operations.contains("broken"));
        assert_eq!(ctx.unresolved_references(), 1);
    }

    #[test]
    fn test_soap12_option() {
        let def = calculator();
        let ctx = GenerationContext::for_definition(&def);
        let options = EmitterOptions {
            module_name: "calc".to_string(),
            soap_version: SoapVersion::V12,
        };
        let bundle = emit(&def, &ctx, &options).unwrap();
        assert!(bundle
            .find("client.rs")
            .unwrap()
            .content
            .contains("SoapVersion::V12"));
    }
}
