//! Row-to-element mapping
//!
//! One data row becomes one element named after the root element, in the
//! default namespace, with a child per column in header order. Columns
//! with a prefix land in the namespace bound to that prefix. Empty cells
//! still produce their (empty) element. Characters XML 1.0 cannot carry
//! are replaced with U+FFFD so the output always parses.

use crate::documents::Element;
use crate::error::{Error, Result};
use crate::headers::{Column, SchemaDescriptor};
use crate::names::{ncname_violation, xml_safe_text};
use crate::namespaces::NamespaceBinding;
use crate::request::{GenerationRequest, NamingColumnMode};
use std::borrow::Cow;
use tracing::{trace, warn};

/// Maps normalized rows onto element trees for one descriptor
#[derive(Debug, Clone, Copy)]
pub struct RowMapper<'a> {
    descriptor: &'a SchemaDescriptor,
    excluded: Option<usize>,
}

impl<'a> RowMapper<'a> {
    /// Create a mapper; `naming_column` is dropped from output when `mode`
    /// is `Exclude`
    pub fn new(descriptor: &'a SchemaDescriptor, naming_column: &Column, mode: NamingColumnMode) -> Self {
        let excluded = match mode {
            NamingColumnMode::Include => None,
            NamingColumnMode::Exclude => Some(naming_column.index),
        };
        Self {
            descriptor,
            excluded,
        }
    }

    /// Mapper configured from a request
    pub fn for_request(request: &'a GenerationRequest) -> Self {
        Self::new(
            request.descriptor(),
            request.naming_column(),
            request.naming_mode(),
        )
    }

    /// Map a row into a standalone element that declares every namespace
    /// its children use.
    ///
    /// `row` holds one cell per column, as returned by
    /// `TabularSource::row`; missing trailing cells count as empty.
    pub fn map_row(&self, row: &[&str]) -> Element {
        self.declare(self.map_record(row))
    }

    /// Map a row without namespace declarations, for nesting inside an
    /// element that already declares them
    pub fn map_record(&self, row: &[&str]) -> Element {
        let mut element = Element::new(self.descriptor.root_qname());
        for column in self.descriptor.columns() {
            if Some(column.index) == self.excluded {
                trace!(column = %column.header, "excluding naming column");
                continue;
            }
            let value = row.get(column.index).copied().unwrap_or("");
            let text = match xml_safe_text(value) {
                Cow::Borrowed(text) => text.to_string(),
                Cow::Owned(text) => {
                    warn!(
                        column = %column.header,
                        value = ?value,
                        "cell holds characters not allowed in XML; replaced with U+FFFD"
                    );
                    text
                }
            };
            element.add_child(Element::new(column.qname()).with_text(text));
        }
        element
    }

    /// Attach the default namespace and every used prefix to `element`
    pub fn declare(&self, element: Element) -> Element {
        self.descriptor
            .used_prefixes()
            .into_iter()
            .fold(
                element.declare_default(self.descriptor.default_namespace()),
                |element, (prefix, uri)| element.declare_prefix(prefix, uri),
            )
    }
}

/// Map a single row given as `(header, value)` pairs.
///
/// Headers are validated and resolved against `binding` first, so this
/// fails with `InvalidHeaderName` or `MissingNamespaceBinding` exactly as
/// a full request would.
pub fn map_row(
    root_element: &str,
    binding: &NamespaceBinding,
    row: &[(&str, &str)],
    naming_column: &str,
    mode: NamingColumnMode,
) -> Result<Element> {
    if let Some(reason) = ncname_violation(root_element) {
        return Err(Error::InvalidRootElement {
            name: root_element.to_string(),
            reason,
        });
    }

    let headers: Vec<String> = row.iter().map(|(header, _)| header.to_string()).collect();
    let descriptor = SchemaDescriptor::build(root_element, &headers, binding)?;
    let naming = descriptor
        .column(naming_column)
        .ok_or_else(|| Error::UnknownNamingColumn(naming_column.to_string()))?;

    let values: Vec<&str> = row.iter().map(|(_, value)| *value).collect();
    Ok(RowMapper::new(&descriptor, naming, mode).map_row(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EAD: &str = "urn:isbn:1-931666-22-9";

    fn binding() -> NamespaceBinding {
        NamespaceBinding::new("urn:example")
            .unwrap()
            .with_prefix("ead", EAD)
            .unwrap()
    }

    fn example_row() -> Vec<(&'static str, &'static str)> {
        vec![("id", "42"), ("title", "Report"), ("ead:unitdate", "2020")]
    }

    #[test]
    fn test_maps_children_in_header_order() {
        let element = map_row("Metadata", &binding(), &example_row(), "id", NamingColumnMode::Include).unwrap();

        assert_eq!(element.local_name(), "Metadata");
        assert_eq!(element.namespace(), Some("urn:example"));

        let names: Vec<_> = element.children.iter().map(|c| c.local_name()).collect();
        assert_eq!(names, vec!["id", "title", "unitdate"]);
        assert_eq!(element.children[0].text.as_deref(), Some("42"));
        assert_eq!(element.children[1].namespace(), Some("urn:example"));
        assert_eq!(element.children[2].namespace(), Some(EAD));
        assert_eq!(element.children[2].text.as_deref(), Some("2020"));
    }

    #[test]
    fn test_exclude_drops_only_naming_column() {
        let included = map_row("Metadata", &binding(), &example_row(), "id", NamingColumnMode::Include).unwrap();
        let excluded = map_row("Metadata", &binding(), &example_row(), "id", NamingColumnMode::Exclude).unwrap();

        assert_eq!(excluded.children.len(), included.children.len() - 1);
        assert_eq!(&excluded.children[..], &included.children[1..]);
    }

    #[test]
    fn test_empty_cell_keeps_element() {
        let row = vec![("id", "1"), ("title", "")];
        let element = map_row("Metadata", &binding(), &row, "id", NamingColumnMode::Include).unwrap();
        assert_eq!(element.children.len(), 2);
        assert_eq!(element.children[1].text.as_deref(), Some(""));
    }

    #[test]
    fn test_declares_only_used_prefixes() {
        let binding = binding().with_prefix("dc", "http://purl.org/dc/elements/1.1/").unwrap();
        let element = map_row("Metadata", &binding, &example_row(), "id", NamingColumnMode::Include).unwrap();

        let prefixes: Vec<_> = element
            .namespaces
            .iter()
            .map(|d| d.prefix.as_deref())
            .collect();
        assert_eq!(prefixes, vec![None, Some("ead")]);
    }

    #[test]
    fn test_invalid_header_fails() {
        let row = vec![("id", "1"), ("first name", "Ada")];
        let err = map_row("Metadata", &binding(), &row, "id", NamingColumnMode::Include).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderName { ref header, .. } if header == "first name"));
    }

    #[test]
    fn test_unbound_prefix_fails() {
        let row = vec![("id", "1"), ("dc:title", "x")];
        let err = map_row("Metadata", &binding(), &row, "id", NamingColumnMode::Include).unwrap_err();
        assert!(matches!(err, Error::MissingNamespaceBinding { ref prefix, .. } if prefix == "dc"));
    }

    #[test]
    fn test_short_row_reads_as_empty() {
        let headers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let descriptor = SchemaDescriptor::build("R", &headers, &binding()).unwrap();
        let mapper = RowMapper::new(&descriptor, &descriptor.columns()[0], NamingColumnMode::Include);

        let element = mapper.map_row(&["1", "2"]);
        assert_eq!(element.children.len(), 3);
        assert_eq!(element.children[2].text.as_deref(), Some(""));
    }

    #[test]
    fn test_non_xml_characters_are_replaced() {
        let row = vec![("id", "1"), ("title", "a\u{B}b\u{1}")];
        let element = map_row("Metadata", &binding(), &row, "id", NamingColumnMode::Include).unwrap();
        assert_eq!(element.children[1].text.as_deref(), Some("a\u{FFFD}b\u{FFFD}"));
        assert_eq!(element.children[0].text.as_deref(), Some("1"));
    }

    #[test]
    fn test_repeated_headers_give_one_child_per_column() {
        let row = vec![("id", "1"), ("note", "a"), ("note", "b")];
        let element = map_row("Metadata", &binding(), &row, "id", NamingColumnMode::Include).unwrap();
        let notes: Vec<_> = element
            .find_children("note")
            .iter()
            .map(|c| c.text.as_deref())
            .collect();
        assert_eq!(notes, vec![Some("a"), Some("b")]);
    }
}
