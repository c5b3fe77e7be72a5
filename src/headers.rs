//! Header analysis and the resolved column model
//!
//! `analyze_headers` is the cheap first pass run right after a file is
//! loaded: it reports the header row and the prefixes the caller must bind.
//! `SchemaDescriptor` is the strict second pass: every header resolved to a
//! namespace and a validated local name. All generators read the same
//! descriptor, which keeps documents, schema, index and transform in step.

use crate::error::{Error, Result};
use crate::names::{ncname_violation, split_qname};
use crate::namespaces::{NamespaceBinding, QName};
use crate::tabular::TabularSource;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Result of the header analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderAnalysis {
    /// Header row, unchanged
    pub headers: Vec<String>,
    /// Distinct non-empty prefixes found in `prefix:local` headers, sorted
    pub prefixes: BTreeSet<String>,
}

/// Analyze the header row of a source.
///
/// A header with no ':' contributes no prefix. A header starting with ':'
/// has an empty prefix and is treated as contributing none here; it is
/// rejected later, when a descriptor is built for generation.
pub fn analyze_headers(source: &TabularSource) -> HeaderAnalysis {
    analyze_header_names(source.headers())
}

/// Same as `analyze_headers`, for a bare header list
pub fn analyze_header_names(headers: &[String]) -> HeaderAnalysis {
    let prefixes = headers
        .iter()
        .filter_map(|header| split_qname(header).0)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect();

    HeaderAnalysis {
        headers: headers.to_vec(),
        prefixes,
    }
}

/// A header resolved to a qualified element name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// 0-based position in the header row
    pub index: usize,
    /// Header text as in the spreadsheet
    pub header: String,
    /// Prefix, `None` for headers in the default namespace
    pub prefix: Option<String>,
    /// Local element name
    pub local_name: String,
    /// Resolved namespace URI
    pub namespace: String,
}

impl Column {
    /// Qualified element name of this column
    pub fn qname(&self) -> QName {
        QName::namespaced(self.namespace.clone(), self.local_name.clone())
    }

    /// Prefixed name, using `default_prefix` for default-namespace columns
    pub fn prefixed_name(&self, default_prefix: &str) -> String {
        format!(
            "{}:{}",
            self.prefix.as_deref().unwrap_or(default_prefix),
            self.local_name
        )
    }
}

/// Resolved shape shared by every generator for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    root_name: String,
    binding: NamespaceBinding,
    columns: Vec<Column>,
}

impl SchemaDescriptor {
    /// Resolve every header against the namespace binding.
    ///
    /// Fails on the first header that cannot become an element name or
    /// uses an unbound prefix. Repeated headers are kept; each column still
    /// gets its own element.
    pub fn build(root_name: &str, headers: &[String], binding: &NamespaceBinding) -> Result<Self> {
        let mut columns = Vec::with_capacity(headers.len());

        for (index, header) in headers.iter().enumerate() {
            let (prefix, local_name) = split_qname(header);

            if let Some(reason) = ncname_violation(local_name) {
                return Err(Error::header(header.as_str(), reason));
            }

            let namespace = match prefix {
                Some("") => {
                    return Err(Error::header(header.as_str(), "the namespace prefix is empty"));
                }
                Some(p) => binding
                    .get_namespace(p)
                    .ok_or_else(|| Error::MissingNamespaceBinding {
                        prefix: p.to_string(),
                        header: header.clone(),
                    })?,
                None => binding.default_namespace(),
            };

            // A prefix bound to the default namespace adds nothing
            let prefix = prefix.filter(|_| namespace != binding.default_namespace());

            columns.push(Column {
                index,
                header: header.clone(),
                prefix: prefix.map(str::to_string),
                local_name: local_name.to_string(),
                namespace: namespace.to_string(),
            });
        }

        Ok(Self {
            root_name: root_name.to_string(),
            binding: binding.clone(),
            columns,
        })
    }

    /// Root element name
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Root element qualified name
    pub fn root_qname(&self) -> QName {
        QName::namespaced(self.default_namespace(), self.root_name.clone())
    }

    /// Default namespace
    pub fn default_namespace(&self) -> &str {
        self.binding.default_namespace()
    }

    /// Namespace bindings
    pub fn binding(&self) -> &NamespaceBinding {
        &self.binding
    }

    /// Resolved columns in header order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Find a column by its header text
    pub fn column(&self, header: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.header == header)
    }

    /// First column for each distinct qualified name, in header order
    pub fn distinct_columns(&self) -> Vec<&Column> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .filter(|c| seen.insert((c.namespace.as_str(), c.local_name.as_str())))
            .collect()
    }

    /// Namespaces of prefixed columns, each with the first prefix that
    /// resolved to it, in order of first use
    pub fn used_namespaces(&self) -> Vec<(&str, &str)> {
        let mut used: Vec<(&str, &str)> = Vec::new();
        for (prefix, uri) in self.used_prefixes() {
            if !used.iter().any(|(_, u)| *u == uri) {
                used.push((prefix, uri));
            }
        }
        used
    }

    /// Prefix bindings used by at least one header, in order of first use
    pub fn used_prefixes(&self) -> Vec<(&str, &str)> {
        let mut used: Vec<(&str, &str)> = Vec::new();
        for column in &self.columns {
            if let Some(prefix) = column.prefix.as_deref() {
                if !used.iter().any(|(p, _)| *p == prefix) {
                    used.push((prefix, column.namespace.as_str()));
                }
            }
        }
        used
    }
}
