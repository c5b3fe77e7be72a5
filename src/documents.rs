//! Owned XML element trees and their serialization
//!
//! Generators build `Element` trees and only then turn them into bytes, so
//! element names, namespaces and text are all known before anything is
//! written. Prefixes are chosen at write time from the namespace
//! declarations attached to each element.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// A namespace declaration attached to an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Prefix, `None` for the default namespace
    pub prefix: Option<String>,
    /// Namespace URI
    pub uri: String,
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Unqualified attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element
    pub namespaces: Vec<NamespaceDecl>,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace()
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Declare the default namespace on this element
    pub fn declare_default(mut self, uri: impl Into<String>) -> Self {
        self.namespaces.push(NamespaceDecl {
            prefix: None,
            uri: uri.into(),
        });
        self
    }

    /// Declare a prefixed namespace on this element
    pub fn declare_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push(NamespaceDecl {
            prefix: Some(prefix.into()),
            uri: uri.into(),
        });
        self
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Builder-style `add_child`
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Serialize as a standalone document with an XML declaration
    pub fn to_document_bytes(&self, indent: bool) -> Result<Vec<u8>> {
        let mut writer = if indent {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut scopes = Vec::new();
        write_element(&mut writer, self, &mut scopes)?;
        Ok(writer.into_inner())
    }
}

/// Pick the prefix under which `namespace` is currently in scope.
///
/// `Ok(None)` means "write unprefixed". Inner declarations shadow outer
/// ones with the same prefix.
fn prefix_for<'a>(scopes: &'a [&'a [NamespaceDecl]], namespace: Option<&str>) -> Result<Option<&'a str>> {
    let mut shadowed: Vec<Option<&str>> = Vec::new();
    for decls in scopes.iter().rev() {
        for decl in decls.iter() {
            let prefix = decl.prefix.as_deref();
            if shadowed.contains(&prefix) {
                continue;
            }
            if Some(decl.uri.as_str()) == namespace {
                return Ok(prefix);
            }
            shadowed.push(prefix);
        }
    }

    match namespace {
        None if !shadowed.contains(&None) => Ok(None),
        None => Err(Error::Xml(
            "cannot write an unqualified element inside a default namespace".to_string(),
        )),
        Some(uri) => Err(Error::Xml(format!("namespace '{}' is not declared", uri))),
    }
}

fn write_element<'e, W: Write>(
    writer: &mut Writer<W>,
    element: &'e Element,
    scopes: &mut Vec<&'e [NamespaceDecl]>,
) -> Result<()> {
    scopes.push(&element.namespaces);

    let name = match prefix_for(scopes, element.namespace())? {
        Some(prefix) => format!("{}:{}", prefix, element.local_name()),
        None => element.local_name().to_string(),
    };

    let mut start = BytesStart::new(name.as_str());
    for decl in &element.namespaces {
        let key = match &decl.prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), decl.uri.as_str()));
    }
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = element.text.as_deref().unwrap_or("");
    if text.is_empty() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        if !text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &element.children {
            write_element(writer, child, scopes)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    }

    scopes.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(element: &Element) -> String {
        String::from_utf8(element.to_document_bytes(false).unwrap()).unwrap()
    }

    #[test]
    fn test_default_namespace_is_unprefixed() {
        let root = Element::new(QName::namespaced("urn:example", "Metadata"))
            .declare_default("urn:example")
            .with_child(Element::new(QName::namespaced("urn:example", "id")).with_text("42"));

        assert_eq!(
            to_string(&root),
            r#"<?xml version="1.0" encoding="UTF-8"?><Metadata xmlns="urn:example"><id>42</id></Metadata>"#
        );
    }

    #[test]
    fn test_prefixed_children_and_empty_content() {
        let root = Element::new(QName::namespaced("urn:example", "Metadata"))
            .declare_default("urn:example")
            .declare_prefix("ead", "urn:ead")
            .with_child(Element::new(QName::namespaced("urn:ead", "unitdate")).with_text(""));

        let xml = to_string(&root);
        assert!(xml.contains(r#"xmlns:ead="urn:ead""#));
        assert!(xml.contains("<ead:unitdate/>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let root = Element::new(QName::local("a")).with_text("x < y & \"z\"");
        assert!(to_string(&root).contains("<a>x &lt; y &amp;"));
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let inner = Element::new(QName::namespaced("urn:two", "inner")).declare_prefix("p", "urn:two");
        let root = Element::new(QName::namespaced("urn:one", "outer"))
            .declare_prefix("p", "urn:one")
            .with_child(inner);

        let xml = to_string(&root);
        assert!(xml.contains("<p:outer"));
        assert!(xml.contains(r#"<p:inner xmlns:p="urn:two"/>"#));
    }

    #[test]
    fn test_undeclared_namespace_is_an_error() {
        let root = Element::new(QName::namespaced("urn:nowhere", "a"));
        assert!(matches!(root.to_document_bytes(false), Err(Error::Xml(_))));
    }

    #[test]
    fn test_unqualified_child_under_default_namespace_is_an_error() {
        let root = Element::new(QName::namespaced("urn:a", "a"))
            .declare_default("urn:a")
            .with_child(Element::new(QName::local("b")));
        assert!(root.to_document_bytes(false).is_err());
    }

    #[test]
    fn test_indented_output() {
        let root = Element::new(QName::local("root"))
            .with_child(Element::new(QName::local("a")).with_text("1"))
            .with_child(Element::new(QName::local("b")));
        let xml = String::from_utf8(root.to_document_bytes(true).unwrap()).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <a>1</a>\n  <b/>\n</root>"
        );
    }

    #[test]
    fn test_find_children() {
        let root = Element::new(QName::local("root"))
            .with_child(Element::new(QName::local("a")))
            .with_child(Element::new(QName::local("b")))
            .with_child(Element::new(QName::local("a")));
        assert_eq!(root.find_children("a").len(), 2);
    }
}
