//! REST-to-SOAP runtime bridge.
//!
//! A long-lived axum server that accepts flat JSON calls and forwards
//! them to the original SOAP endpoint through the shared envelope codec:
//!
//! - `GET /health` — liveness probe,
//! - `GET /info` — service catalog with REST endpoints per operation,
//! - `POST /api/{Operation}` — invoke an operation,
//! - `GET /api/{Operation}/info` — parameter and SOAP-action
//!   introspection.
//!
//! Every inbound call is independent; the only shared state is the
//! read-only [`ServiceDefinition`] and one outbound HTTP client, and no
//! lock is held across a network call. Inbound values travel as opaque
//! strings: the bridge deliberately does not use the richer
//! generation-time type projection, and nested JSON is rejected rather
//! than guessed at.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use wsdl2rest_core::{Error, Operation, Result, ServiceDefinition};
use wsdl2rest_soap::{SecurityCredential, SecurityHeader, SoapVersion, decode, encode};

/// Bridge configuration beyond the service definition itself.
#[derive(Debug, Clone, Default)]
pub struct BridgeOptions {
    /// SOAP version used for upstream calls
    pub soap_version: Option<SoapVersion>,
    /// Overrides the endpoint address from the WSDL
    pub endpoint: Option<String>,
    /// WS-Security credential applied to every upstream call
    pub credential: Option<SecurityCredential>,
}

/// Shared, read-only state behind every handler.
#[derive(Debug)]
pub struct BridgeState {
    definition: ServiceDefinition,
    endpoint: Option<String>,
    soap_version: SoapVersion,
    credential: Option<SecurityCredential>,
    http: reqwest::Client,
}

impl BridgeState {
    /// Builds the bridge state from a parsed definition.
    ///
    /// The endpoint defaults to the first port address in the WSDL; a
    /// definition without one still serves, failing only actual
    /// invocations.
    #[must_use]
    pub fn new(definition: ServiceDefinition, options: BridgeOptions) -> Self {
        let endpoint = options
            .endpoint
            .or_else(|| definition.endpoint().map(str::to_string));
        Self {
            definition,
            endpoint,
            soap_version: options.soap_version.unwrap_or(SoapVersion::V11),
            credential: options.credential,
            http: reqwest::Client::new(),
        }
    }

    /// The parsed service definition the bridge serves.
    #[must_use]
    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }
}

/// Builds the bridge router over shared state.
pub fn router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(service_info))
        .route("/api/:operation", post(invoke))
        .route("/api/:operation/info", get(operation_info))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Binds and serves the bridge until the task is stopped.
///
/// # Errors
///
/// Returns [`Error::Transport`] when the address cannot be bound or the
/// server fails.
pub async fn serve(state: Arc<BridgeState>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| Error::Transport {
            message: format!("failed to bind {addr}"),
            source: Some(Box::new(err)),
        })?;
    tracing::info!(%addr, service = %state.definition.name, "bridge listening");
    axum::serve(listener, router(state))
        .await
        .map_err(|err| Error::Transport {
            message: "bridge server failed".to_string(),
            source: Some(Box::new(err)),
        })
}

async fn health(State(state): State<Arc<BridgeState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.definition.name,
    }))
}

async fn service_info(State(state): State<Arc<BridgeState>>) -> Json<Value> {
    let definition = &state.definition;
    let services: Vec<Value> = definition
        .services
        .iter()
        .map(|svc| {
            json!({
                "name": svc.name,
                "ports": svc.ports.iter().map(|p| json!({
                    "name": p.name,
                    "binding": p.binding,
                    "address": p.address,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let operations: Vec<Value> = definition
        .operations()
        .map(|op| {
            json!({
                "name": op.name,
                "documentation": op.documentation,
                "endpoint": format!("/api/{}", op.name),
                "method": "POST",
            })
        })
        .collect();

    Json(json!({
        "name": definition.name,
        "targetNamespace": definition.target_namespace,
        "services": services,
        "operations": operations,
        "totalOperations": operations.len(),
    }))
}

async fn invoke(
    State(state): State<Arc<BridgeState>>,
    Path(operation): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(op) = state.definition.find_operation(&operation) else {
        return unknown_operation(&operation);
    };
    let op = op.clone();

    let params = match flatten(&body) {
        Ok(params) => params,
        Err(key) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "nested values are not supported",
                    "operation": op.name,
                    "key": key,
                })),
            );
        }
    };

    match call_soap(&state, &op, &params).await {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({
                "operation": op.name,
                "status": "success",
                "request": body,
                "response": response,
            })),
        ),
        Err(Error::SoapFault {
            code,
            reason,
            detail,
        }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "SOAP fault",
                "operation": op.name,
                "fault": {
                    "faultcode": code,
                    "faultstring": reason,
                    "detail": detail,
                },
            })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "SOAP call failed",
                "operation": op.name,
                "details": err.to_string(),
            })),
        ),
    }
}

async fn operation_info(
    State(state): State<Arc<BridgeState>>,
    Path(operation): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let Some(op) = state.definition.find_operation(&operation) else {
        return unknown_operation(&operation);
    };

    let soap_action = state.definition.soap_action(&op.name).unwrap_or_default();
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost:8080");

    let info = json!({
        "operation": op.name,
        "documentation": op.documentation,
        "soapAction": soap_action,
        "endpoint": format!("/api/{}", op.name),
        "method": "POST",
        "input": message_info(&state.definition, &op.input_message),
        "output": message_info(&state.definition, &op.output_message),
        "note": "request body is a flat JSON object; nested objects and arrays are not supported",
        "example": {
            "curl": format!(
                "curl -X POST http://{host}/api/{} \\\n  -H \"Content-Type: application/json\" \\\n  -d '{{\"param\": \"value\"}}'",
                op.name
            ),
        },
    });
    (StatusCode::OK, Json(info))
}

/// Field list of a message reference; unresolved references surface as
/// an empty list with the dangling name attached.
fn message_info(definition: &ServiceDefinition, message_ref: &str) -> Value {
    match definition.message_fields(message_ref) {
        Ok(fields) => json!({
            "message": message_ref,
            "fields": fields.iter().map(|f| json!({
                "name": f.name,
                "type": f.type_ref,
                "required": f.min_occurs != "0" && !f.nillable,
            })).collect::<Vec<_>>(),
        }),
        Err(err) => json!({
            "message": message_ref,
            "fields": [],
            "unresolved": err.to_string(),
        }),
    }
}

fn unknown_operation(operation: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "unknown operation",
            "operation": operation,
        })),
    )
}

/// Flattens a JSON object into a single-level key-to-string map.
///
/// `null` values are omitted rather than sent; a nested object or array
/// is rejected with the offending key. Non-object bodies are rejected
/// wholesale.
fn flatten(body: &Value) -> std::result::Result<BTreeMap<String, String>, String> {
    let Some(object) = body.as_object() else {
        return Err("<body>".to_string());
    };
    let mut params = BTreeMap::new();
    for (key, value) in object {
        match value {
            Value::Null => {}
            Value::String(s) => {
                params.insert(key.clone(), s.clone());
            }
            Value::Bool(_) | Value::Number(_) => {
                params.insert(key.clone(), value.to_string());
            }
            Value::Array(_) | Value::Object(_) => return Err(key.clone()),
        }
    }
    Ok(params)
}

/// Builds the `<tns:Operation>` body payload from the flat map.
fn build_payload(
    operation: &str,
    target_namespace: &str,
    params: &BTreeMap<String, String>,
) -> String {
    let tns = if target_namespace.is_empty() {
        "http://tempuri.org/"
    } else {
        target_namespace
    };
    let mut payload = String::new();
    let _ = write!(payload, r#"<tns:{operation} xmlns:tns="{tns}">"#);
    for (key, value) in params {
        let _ = write!(payload, "<{key}>{}</{key}>", escape(value.as_str()));
    }
    let _ = write!(payload, "</tns:{operation}>");
    payload
}

/// One upstream SOAP call: encode, POST, decode.
async fn call_soap(
    state: &BridgeState,
    op: &Operation,
    params: &BTreeMap<String, String>,
) -> Result<Value> {
    let Some(endpoint) = state.endpoint.as_deref() else {
        return Err(Error::Transport {
            message: "SOAP endpoint not configured".to_string(),
            source: None,
        });
    };

    let payload = build_payload(&op.name, &state.definition.target_namespace, params);
    let security = state
        .credential
        .as_ref()
        .map(|credential| SecurityHeader::build(credential, chrono::Utc::now()));
    let envelope = encode(state.soap_version, security.as_ref(), &payload);

    let mut request = state
        .http
        .post(endpoint)
        .header("Content-Type", state.soap_version.content_type())
        .body(envelope);
    if state.soap_version.uses_soap_action() {
        let action = state.definition.soap_action(&op.name).unwrap_or_default();
        request = request.header("SOAPAction", format!("\"{action}\""));
    }

    tracing::debug!(operation = %op.name, endpoint, "forwarding SOAP call");
    let response = request.send().await.map_err(|err| Error::Transport {
        message: format!("SOAP call to {endpoint} failed"),
        source: Some(Box::new(err)),
    })?;
    let status = response.status();
    let body = response.text().await.map_err(|err| Error::Transport {
        message: "failed to read SOAP response".to_string(),
        source: Some(Box::new(err)),
    })?;

    match decode(&body, state.soap_version) {
        Ok(payload) => Ok(response_json(&payload)),
        Err(err) if err.is_soap_fault() => Err(err),
        Err(_) if !status.is_success() => Err(Error::Transport {
            message: format!("SOAP request failed with status {status}"),
            source: None,
        }),
        Err(err) => Err(err),
    }
}

/// Shallow element-text extraction over the decoded body payload.
///
/// Leaf element text becomes `name: value` pairs; the raw payload is
/// always kept under `xml` so nothing is lost to the flattening.
fn response_json(payload: &str) -> Value {
    let mut map = serde_json::Map::new();
    let mut reader = Reader::from_str(payload);
    let mut current = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().trim().to_string();
                if !text.is_empty() && !current.is_empty() && !map.contains_key(&current) {
                    map.insert(current.clone(), Value::String(text));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    map.insert("xml".to_string(), Value::String(payload.to_string()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_drops_null_keeps_scalars() {
        let body = json!({
            "text": "hi",
            "count": 7,
            "flag": true,
            "missing": null,
        });
        let params = flatten(&body).unwrap();
        assert_eq!(params["text"], "hi");
        assert_eq!(params["count"], "7");
        assert_eq!(params["flag"], "true");
        assert!(!params.contains_key("missing"));
    }

    #[test]
    fn test_flatten_rejects_nested() {
        assert_eq!(
            flatten(&json!({"outer": {"inner": 1}})).unwrap_err(),
            "outer"
        );
        assert_eq!(flatten(&json!({"list": [1, 2]})).unwrap_err(), "list");
        assert_eq!(flatten(&json!("just a string")).unwrap_err(), "<body>");
    }

    #[test]
    fn test_build_payload_shape() {
        let mut params = BTreeMap::new();
        params.insert("intA".to_string(), "5".to_string());
        params.insert("intB".to_string(), "3".to_string());
        let payload = build_payload("Add", "http://tempuri.org/", &params);
        assert_eq!(
            payload,
            r#"<tns:Add xmlns:tns="http://tempuri.org/"><intA>5</intA><intB>3</intB></tns:Add>"#
        );
    }

    #[test]
    fn test_build_payload_escapes_values() {
        let mut params = BTreeMap::new();
        params.insert("text".to_string(), "a<b & c".to_string());
        let payload = build_payload("Echo", "", &params);
        assert!(payload.contains("<text>a&lt;b &amp; c</text>"));
        assert!(payload.contains("http://tempuri.org/"));
    }

    #[test]
    fn test_response_json_extracts_leaf_text() {
        let value = response_json(
            r#"<AddResponse xmlns="http://tempuri.org/"><AddResult>8</AddResult></AddResponse>"#,
        );
        assert_eq!(value["AddResult"], "8");
        assert!(value["xml"].as_str().unwrap().contains("AddResponse"));
    }

    #[test]
    fn test_response_json_keeps_raw_for_empty_payload() {
        let value = response_json("");
        assert_eq!(value["xml"], "");
    }
}
