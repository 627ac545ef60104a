//! IR builder: raw WSDL XML to [`ServiceDefinition`].
//!
//! A single forward pass over quick-xml events. The walk is tolerant by
//! design: only a malformed document root is fatal, every inner
//! irregularity (missing attributes, unknown elements, dangling
//! references) leaves a degraded entity behind and surfaces later at
//! lookup time. Cross-references keep their raw spelling; resolution
//! strips namespace prefixes on both sides.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use wsdl2rest_core::{
    AttributeDef, Binding, BindingOperation, ComplexType, ElementDef, Error, Message, Operation,
    Part, Port, PortType, Result, Service, ServiceDefinition,
};

/// Builds the canonical service definition from raw WSDL XML.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the document root is not a `definitions`
/// element or the XML is not well formed. Unresolved inner references are
/// not errors here; they surface from the IR lookup helpers.
pub fn build(xml: &str) -> Result<ServiceDefinition> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let (name, target_namespace) = read_root(&mut reader)?;
    let mut definition = ServiceDefinition {
        name,
        target_namespace,
        ..ServiceDefinition::default()
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"service" => {
                    let service = parse_service(&mut reader, &e)?;
                    definition.services.push(service);
                }
                b"binding" => {
                    let binding = parse_binding(&mut reader, &e)?;
                    definition.bindings.push(binding);
                }
                b"portType" => {
                    let port_type = parse_port_type(&mut reader, &e)?;
                    definition.port_types.push(port_type);
                }
                b"message" => {
                    let message = parse_message(&mut reader, &e)?;
                    definition.messages.push(message);
                }
                b"types" => parse_types(&mut reader, &mut definition.complex_types)?,
                _ => skip(&mut reader, &e)?,
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(
        services = definition.services.len(),
        bindings = definition.bindings.len(),
        port_types = definition.port_types.len(),
        messages = definition.messages.len(),
        complex_types = definition.complex_types.len(),
        "WSDL parsed"
    );
    Ok(definition)
}

/// Finds the document root and validates its shape.
fn read_root(reader: &mut Reader<&[u8]>) -> Result<(String, String)> {
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() != b"definitions" {
                    return Err(Error::Parse {
                        message: format!(
                            "root element is {:?}, expected definitions",
                            String::from_utf8_lossy(e.local_name().as_ref())
                        ),
                    });
                }
                let name = attr(&e, "name")?.unwrap_or_default();
                let tns = attr(&e, "targetNamespace")?.unwrap_or_default();
                return Ok((name, tns));
            }
            Event::Eof => {
                return Err(Error::Parse {
                    message: "document contains no elements".to_string(),
                });
            }
            _ => {}
        }
    }
}

fn parse_service(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Service> {
    let mut service = Service {
        name: attr(start, "name")?.unwrap_or_default(),
        ports: Vec::new(),
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"port" => {
                let mut port = Port {
                    name: attr(&e, "name")?.unwrap_or_default(),
                    binding: attr(&e, "binding")?.unwrap_or_default(),
                    address: String::new(),
                };
                loop {
                    match reader.read_event().map_err(xml_error)? {
                        Event::Empty(a) if a.local_name().as_ref() == b"address" => {
                            port.address = attr(&a, "location")?.unwrap_or_default();
                        }
                        Event::Start(a) => {
                            if a.local_name().as_ref() == b"address" {
                                port.address = attr(&a, "location")?.unwrap_or_default();
                            }
                            skip(reader, &a)?;
                        }
                        Event::End(_) => break,
                        Event::Eof => return Err(truncated()),
                        _ => {}
                    }
                }
                service.ports.push(port);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"port" => {
                service.ports.push(Port {
                    name: attr(&e, "name")?.unwrap_or_default(),
                    binding: attr(&e, "binding")?.unwrap_or_default(),
                    address: String::new(),
                });
            }
            Event::Start(e) => skip(reader, &e)?,
            Event::End(_) => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(service)
}

fn parse_binding(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Binding> {
    let mut binding = Binding {
        name: attr(start, "name")?.unwrap_or_default(),
        type_ref: attr(start, "type")?.unwrap_or_default(),
        operations: Vec::new(),
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"operation" => {
                let mut operation = BindingOperation {
                    name: attr(&e, "name")?.unwrap_or_default(),
                    soap_action: String::new(),
                };
                // The soap:operation child shares the local name of its
                // parent; it is the one carrying soapAction.
                loop {
                    match reader.read_event().map_err(xml_error)? {
                        Event::Empty(i) if i.local_name().as_ref() == b"operation" => {
                            operation.soap_action = attr(&i, "soapAction")?.unwrap_or_default();
                        }
                        Event::Start(i) => {
                            if i.local_name().as_ref() == b"operation" {
                                operation.soap_action = attr(&i, "soapAction")?.unwrap_or_default();
                            }
                            skip(reader, &i)?;
                        }
                        Event::End(_) => break,
                        Event::Eof => return Err(truncated()),
                        _ => {}
                    }
                }
                binding.operations.push(operation);
            }
            Event::Start(e) => skip(reader, &e)?,
            Event::End(_) => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(binding)
}

fn parse_port_type(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<PortType> {
    let mut port_type = PortType {
        name: attr(start, "name")?.unwrap_or_default(),
        operations: Vec::new(),
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"operation" => {
                let mut operation = Operation {
                    name: attr(&e, "name")?.unwrap_or_default(),
                    ..Operation::default()
                };
                loop {
                    match reader.read_event().map_err(xml_error)? {
                        Event::Start(i) => match i.local_name().as_ref() {
                            b"documentation" => {
                                operation.documentation = reader
                                    .read_text(i.name())
                                    .map_err(xml_error)?
                                    .trim()
                                    .to_string();
                            }
                            b"input" => {
                                operation.input_message =
                                    attr(&i, "message")?.unwrap_or_default();
                                skip(reader, &i)?;
                            }
                            b"output" => {
                                operation.output_message =
                                    attr(&i, "message")?.unwrap_or_default();
                                skip(reader, &i)?;
                            }
                            _ => skip(reader, &i)?,
                        },
                        Event::Empty(i) => match i.local_name().as_ref() {
                            b"input" => {
                                operation.input_message = attr(&i, "message")?.unwrap_or_default();
                            }
                            b"output" => {
                                operation.output_message = attr(&i, "message")?.unwrap_or_default();
                            }
                            _ => {}
                        },
                        Event::End(_) => break,
                        Event::Eof => return Err(truncated()),
                        _ => {}
                    }
                }
                port_type.operations.push(operation);
            }
            Event::Start(e) => skip(reader, &e)?,
            Event::End(_) => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(port_type)
}

fn parse_message(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Message> {
    let mut message = Message {
        name: attr(start, "name")?.unwrap_or_default(),
        parts: Vec::new(),
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Empty(e) if e.local_name().as_ref() == b"part" => {
                message.parts.push(part_from(&e)?);
            }
            Event::Start(e) => {
                if e.local_name().as_ref() == b"part" {
                    message.parts.push(part_from(&e)?);
                }
                skip(reader, &e)?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(message)
}

fn part_from(e: &BytesStart<'_>) -> Result<Part> {
    Ok(Part {
        name: attr(e, "name")?.unwrap_or_default(),
        element: attr(e, "element")?,
        type_ref: attr(e, "type")?,
    })
}

/// Walks the `types` section, collecting named complex types and
/// top-level elements with inline complex types.
fn parse_types(reader: &mut Reader<&[u8]>, out: &mut Vec<ComplexType>) -> Result<()> {
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"schema" => {
                parse_schema(reader, out)?;
            }
            Event::Start(e) => skip(reader, &e)?,
            Event::End(_) => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(())
}

fn parse_schema(reader: &mut Reader<&[u8]>, out: &mut Vec<ComplexType>) -> Result<()> {
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"element" => {
                    // Document-style wrapper: the element name doubles as
                    // the type name when a complexType is declared inline.
                    let name = attr(&e, "name")?.unwrap_or_default();
                    let mut inline = None;
                    loop {
                        match reader.read_event().map_err(xml_error)? {
                            Event::Start(c) if c.local_name().as_ref() == b"complexType" => {
                                let mut complex = ComplexType {
                                    name: name.clone(),
                                    ..ComplexType::default()
                                };
                                collect_members(reader, &mut complex)?;
                                inline = Some(complex);
                            }
                            Event::Start(c) => skip(reader, &c)?,
                            Event::End(_) => break,
                            Event::Eof => return Err(truncated()),
                            _ => {}
                        }
                    }
                    if let Some(complex) = inline {
                        out.push(complex);
                    }
                }
                b"complexType" => {
                    let mut complex = ComplexType {
                        name: attr(&e, "name")?.unwrap_or_default(),
                        ..ComplexType::default()
                    };
                    collect_members(reader, &mut complex)?;
                    if !complex.name.is_empty() {
                        out.push(complex);
                    }
                }
                _ => skip(reader, &e)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(())
}

/// Collects element and attribute declarations from inside a complex
/// type, descending through sequence/all/choice/extension containers.
fn collect_members(reader: &mut Reader<&[u8]>, complex: &mut ComplexType) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"element" => {
                    complex.elements.push(element_from(&e)?);
                    skip(reader, &e)?;
                }
                b"attribute" => {
                    complex.attributes.push(attribute_from(&e)?);
                    skip(reader, &e)?;
                }
                _ => depth += 1,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"element" => complex.elements.push(element_from(&e)?),
                b"attribute" => complex.attributes.push(attribute_from(&e)?),
                _ => {}
            },
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(())
}

fn element_from(e: &BytesStart<'_>) -> Result<ElementDef> {
    Ok(ElementDef {
        name: attr(e, "name")?.unwrap_or_default(),
        type_ref: attr(e, "type")?.unwrap_or_default(),
        min_occurs: attr(e, "minOccurs")?.unwrap_or_else(|| "1".to_string()),
        max_occurs: attr(e, "maxOccurs")?.unwrap_or_else(|| "1".to_string()),
        nillable: attr(e, "nillable")?.as_deref() == Some("true"),
    })
}

fn attribute_from(e: &BytesStart<'_>) -> Result<AttributeDef> {
    Ok(AttributeDef {
        name: attr(e, "name")?.unwrap_or_default(),
        type_ref: attr(e, "type")?.unwrap_or_default(),
        usage: attr(e, "use")?.unwrap_or_default(),
    })
}

/// Reads one attribute as an unescaped string.
fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attribute = e.try_get_attribute(name).map_err(xml_error)?;
    match attribute {
        Some(a) => Ok(Some(a.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

/// Skips the subtree opened by `e`.
fn skip(reader: &mut Reader<&[u8]>, e: &BytesStart<'_>) -> Result<()> {
    reader.read_to_end(e.name()).map_err(xml_error)?;
    Ok(())
}

fn truncated() -> Error {
    Error::Parse {
        message: "unexpected end of document".to_string(),
    }
}

fn xml_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Parse {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0"?>
<wsdl:definitions name="Ping" targetNamespace="http://tempuri.org/"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/">
  <wsdl:message name="PingIn">
    <wsdl:part name="text" type="s:string"/>
  </wsdl:message>
  <wsdl:portType name="PingSoap">
    <wsdl:operation name="Ping">
      <wsdl:documentation>Echoes text.</wsdl:documentation>
      <wsdl:input message="tns:PingIn"/>
      <wsdl:output message="tns:PingOut"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="PingSoap" type="tns:PingSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"/>
    <wsdl:operation name="Ping">
      <soap:operation soapAction="http://tempuri.org/Ping" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"/>
      <wsdl:input/>
      <wsdl:output/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="PingService">
    <wsdl:port name="PingSoap" binding="tns:PingSoap">
      <soap:address location="http://example.com/ping" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_minimal_document() {
        let def = build(MINIMAL).unwrap();
        assert_eq!(def.name, "Ping");
        assert_eq!(def.target_namespace, "http://tempuri.org/");

        assert_eq!(def.messages.len(), 1);
        assert_eq!(def.messages[0].parts[0].type_ref.as_deref(), Some("s:string"));

        let op = def.find_operation("Ping").unwrap();
        assert_eq!(op.documentation, "Echoes text.");
        assert_eq!(op.input_message, "tns:PingIn");

        assert_eq!(def.soap_action("Ping"), Some("http://tempuri.org/Ping"));
        assert_eq!(def.endpoint(), Some("http://example.com/ping"));
    }

    #[test]
    fn test_wrong_root_is_fatal() {
        let err = build("<html><body/></html>").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_empty_document_is_fatal() {
        assert!(build("").unwrap_err().is_parse());
        assert!(build("   ").unwrap_err().is_parse());
    }

    #[test]
    fn test_unresolved_references_tolerated_at_build_time() {
        // Operation points at a message that is never declared; the build
        // succeeds and the lookup reports the dangling name.
        let def = build(MINIMAL).unwrap();
        let err = def.message_fields("tns:PingOut").unwrap_err();
        assert!(err.is_unresolved_reference());
    }

    #[test]
    fn test_inline_complex_type_under_element() {
        let xml = r#"<definitions targetNamespace="http://tempuri.org/">
  <types>
    <s:schema xmlns:s="http://www.w3.org/2001/XMLSchema">
      <s:element name="Add">
        <s:complexType>
          <s:sequence>
            <s:element name="intA" type="s:int"/>
            <s:element minOccurs="0" name="note" type="s:string" nillable="true"/>
            <s:element maxOccurs="unbounded" name="tags" type="s:string"/>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:complexType name="UserRecord">
        <s:sequence>
          <s:element name="id" type="s:long"/>
        </s:sequence>
        <s:attribute name="version" type="s:string" use="optional"/>
      </s:complexType>
    </s:schema>
  </types>
</definitions>"#;
        let def = build(xml).unwrap();
        assert_eq!(def.complex_types.len(), 2);

        let add = def.find_complex_type("Add").unwrap();
        assert_eq!(add.elements.len(), 3);
        assert_eq!(add.elements[0].min_occurs, "1");
        assert_eq!(add.elements[1].min_occurs, "0");
        assert!(add.elements[1].nillable);
        assert_eq!(add.elements[2].max_occurs, "unbounded");

        let user = def.find_complex_type("UserRecord").unwrap();
        assert_eq!(user.attributes.len(), 1);
        assert_eq!(user.attributes[0].usage, "optional");
    }

    #[test]
    fn test_alias_element_not_registered() {
        let xml = r#"<definitions>
  <types>
    <schema>
      <element name="Shortcut" type="tns:Elsewhere"/>
    </schema>
  </types>
</definitions>"#;
        let def = build(xml).unwrap();
        assert!(def.complex_types.is_empty());
        assert!(def.find_complex_type("Shortcut").unwrap_err().is_unresolved_reference());
    }

    #[test]
    fn test_multiple_port_types_and_bindings() {
        let xml = r#"<definitions name="Multi">
  <portType name="A"><operation name="One"><input message="m1"/><output message="m2"/></operation></portType>
  <portType name="B"><operation name="Two"><input message="m3"/><output message="m4"/></operation></portType>
  <binding name="BA" type="A"><operation name="One"><operation soapAction="act:one"/></operation></binding>
</definitions>"#;
        let def = build(xml).unwrap();
        assert_eq!(def.port_types.len(), 2);
        assert_eq!(def.operations().count(), 2);
        assert_eq!(def.soap_action("One"), Some("act:one"));
        assert_eq!(def.soap_action("Two"), None);
    }
}
