//! XML namespace handling
//!
//! This module provides qualified names and the prefix bindings a
//! generation request carries: one default namespace for unprefixed
//! headers and the root element, and any number of extra prefixes for
//! headers written as `prefix:local`.

use crate::error::{Error, Result};
use crate::names::{is_valid_ncname, is_xml_char};
use indexmap::IndexMap;
use std::fmt;

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XSLT namespace
pub const XSLT_NAMESPACE: &str = "http://www.w3.org/1999/XSL/Transform";

/// XPath functions namespace
pub const XPATH_FUNCTIONS_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions";

/// OPEX metadata namespace used by the `.opex` naming convention
pub const OPEX_NAMESPACE: &str = "http://www.openpreservationexchange.org/opex/v1.2";

/// Preservica custom search index namespace
pub const CUSTOM_INDEX_NAMESPACE: &str = "http://www.preservica.com/customindex/v1";

/// CMIS metadata namespace targeted by the transform
pub const CMIS_METADATA_NAMESPACE: &str = "http://www.tessella.com/sdb/cmis/metadata";

/// XML namespace, bound to `xml` by definition
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Qualified name: namespace URI plus local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Namespace URI, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    /// Clark notation, `{uri}local`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Namespace bindings for one generation request.
///
/// Always has a default namespace; extra prefixes keep insertion order so
/// the declarations in generated documents are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    default_namespace: String,
    prefixes: IndexMap<String, String>,
}

impl NamespaceBinding {
    /// Create a binding with only the default namespace
    pub fn new(default_namespace: impl Into<String>) -> Result<Self> {
        let default_namespace = default_namespace.into().trim().to_string();
        if default_namespace.is_empty() {
            return Err(Error::InvalidNamespace(
                "the default namespace URI must not be empty".to_string(),
            ));
        }
        if !default_namespace.chars().all(is_xml_char) {
            return Err(Error::InvalidNamespace(format!(
                "{:?} contains characters not allowed in XML",
                default_namespace
            )));
        }
        Ok(Self {
            default_namespace,
            prefixes: IndexMap::new(),
        })
    }

    /// Bind an extra prefix
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        let uri = uri.into().trim().to_string();

        if !is_valid_ncname(&prefix) {
            return Err(Error::InvalidNamespace(format!(
                "'{}' is not a valid namespace prefix",
                prefix
            )));
        }
        if prefix.eq_ignore_ascii_case("xml") || prefix.eq_ignore_ascii_case("xmlns") {
            return Err(Error::InvalidNamespace(format!(
                "the prefix '{}' is reserved",
                prefix
            )));
        }
        if uri.is_empty() {
            return Err(Error::InvalidNamespace(format!(
                "no namespace URI given for prefix '{}'",
                prefix
            )));
        }
        if !uri.chars().all(is_xml_char) {
            return Err(Error::InvalidNamespace(format!(
                "{:?} contains characters not allowed in XML",
                uri
            )));
        }
        if uri == XML_NAMESPACE || uri == XMLNS_NAMESPACE {
            return Err(Error::InvalidNamespace(format!(
                "'{}' cannot be bound to a prefix",
                uri
            )));
        }

        self.prefixes.insert(prefix, uri);
        Ok(())
    }

    /// Builder-style `bind`
    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Result<Self> {
        self.bind(prefix, uri)?;
        Ok(self)
    }

    /// Get the default namespace
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Iterate over extra prefix bindings in insertion order
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Resolve an optional prefix to a namespace URI
    pub fn resolve_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            None => Some(self.default_namespace()),
            Some(p) => self.get_namespace(p),
        }
    }

    /// `preferred` if no header prefix is bound to it, else the first of
    /// `preferred1`, `preferred2`, ... that is free
    pub fn unused_prefix(&self, preferred: &str) -> String {
        if !self.prefixes.contains_key(preferred) {
            return preferred.to_string();
        }
        (1..)
            .map(|n| format!("{}{}", preferred, n))
            .find(|candidate| !self.prefixes.contains_key(candidate))
            .unwrap_or_else(|| preferred.to_string())
    }
}
