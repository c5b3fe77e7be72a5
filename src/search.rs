//! Search index generation
//!
//! Two artifacts come from here. The search index is a single document
//! holding every row as a record, shaped exactly like the per-row
//! documents. The index definition tells Preservica which fields of those
//! documents to index, one `term` per distinct element name.

use crate::documents::Element;
use crate::error::Result;
use crate::mapper::RowMapper;
use crate::namespaces::{QName, CUSTOM_INDEX_NAMESPACE};
use crate::pretty::render;
use crate::request::GenerationRequest;
use tracing::debug;

/// Local name of the search index root element
pub const INDEX_ELEMENT: &str = "index";

/// Index type used for every term
pub const INDEX_TYPE: &str = "STRING_DEFAULT";

/// Generate the aggregate search index: one record per data row, in row
/// order, under an `index` root in the default namespace
pub fn generate_search_index(request: &GenerationRequest) -> Result<Vec<u8>> {
    let descriptor = request.descriptor();
    let mapper = RowMapper::for_request(request);

    let index = Element::new(QName::namespaced(descriptor.default_namespace(), INDEX_ELEMENT));
    let index = request
        .source()
        .rows()
        .fold(mapper.declare(index), |index, row| {
            index.with_child(mapper.map_record(&row))
        });

    debug!(records = index.children.len(), "generated search index");
    render(&index, request.formatting())
}

/// Generate the Preservica custom search index definition
pub fn generate_index_definition(request: &GenerationRequest) -> Result<Vec<u8>> {
    let descriptor = request.descriptor();
    let short_name = descriptor.binding().unused_prefix("csv");
    let root_path = format!("//{}:{}", short_name, descriptor.root_name());

    let mut index = index_element("index")
        .declare_default(CUSTOM_INDEX_NAMESPACE)
        .declare_prefix(short_name.as_str(), descriptor.default_namespace());
    for (prefix, uri) in descriptor.used_prefixes() {
        index = index.declare_prefix(prefix, uri);
    }

    index.add_child(index_element("schemaName").with_text(request.title()));
    index.add_child(index_element("schemaUri").with_text(descriptor.default_namespace()));
    index.add_child(index_element("shortName").with_text(short_name.as_str()));

    for column in descriptor.distinct_columns() {
        let qualified = column.prefixed_name(&short_name);
        index.add_child(
            index_element("term")
                .with_attribute("indexName", qualified.replace(':', "_"))
                .with_attribute("displayName", request.label(column))
                .with_attribute("xpath", format!("{}/{}", root_path, qualified))
                .with_attribute("indexType", INDEX_TYPE),
        );
    }

    render(&index, request.formatting())
}

fn index_element(local_name: &str) -> Element {
    Element::new(QName::namespaced(CUSTOM_INDEX_NAMESPACE, local_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Formatting, NamingColumnMode};
    use crate::tabular::TabularSource;

    const EAD: &str = "urn:isbn:1-931666-22-9";

    fn request(mode: NamingColumnMode) -> GenerationRequest {
        let source = TabularSource::from_csv_str("id,title,ead:unitdate\n1,First,2020\n2,Second\n").unwrap();
        GenerationRequest::builder(source, "Metadata", "urn:example")
            .with_prefix("ead", EAD)
            .with_naming_mode(mode)
            .with_formatting(Formatting::Compact)
            .build()
            .unwrap()
    }

    #[test]
    fn test_search_index_has_record_per_row() {
        let xml = String::from_utf8(generate_search_index(&request(NamingColumnMode::Include)).unwrap()).unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();

        assert!(root.has_tag_name(("urn:example", "index")));
        let records: Vec<_> = root.children().filter(|n| n.is_element()).collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.has_tag_name(("urn:example", "Metadata"))));

        let first: Vec<_> = records[0].children().filter(|n| n.is_element()).collect();
        assert_eq!(first.len(), 3);
        assert!(first[2].has_tag_name((EAD, "unitdate")));
        assert_eq!(first[2].text(), Some("2020"));

        let second_date = records[1]
            .children()
            .find(|n| n.has_tag_name((EAD, "unitdate")))
            .unwrap();
        assert_eq!(second_date.text(), None);
    }

    #[test]
    fn test_search_index_honours_exclusion() {
        let xml = String::from_utf8(generate_search_index(&request(NamingColumnMode::Exclude)).unwrap()).unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert!(doc
            .descendants()
            .all(|n| !n.has_tag_name(("urn:example", "id"))));
    }

    #[test]
    fn test_index_definition_terms() {
        let xml = String::from_utf8(generate_index_definition(&request(NamingColumnMode::Include)).unwrap()).unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();

        assert!(root.has_tag_name((CUSTOM_INDEX_NAMESPACE, "index")));
        let text_of = |name: &str| {
            root.children()
                .find(|n| n.has_tag_name((CUSTOM_INDEX_NAMESPACE, name)))
                .and_then(|n| n.text())
        };
        assert_eq!(text_of("schemaName"), Some("Metadata Title"));
        assert_eq!(text_of("schemaUri"), Some("urn:example"));
        assert_eq!(text_of("shortName"), Some("csv"));

        let terms: Vec<_> = root
            .children()
            .filter(|n| n.has_tag_name((CUSTOM_INDEX_NAMESPACE, "term")))
            .collect();
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].attribute("indexName"), Some("csv_id"));
        assert_eq!(terms[0].attribute("xpath"), Some("//csv:Metadata/csv:id"));
        assert_eq!(terms[2].attribute("indexName"), Some("ead_unitdate"));
        assert_eq!(terms[2].attribute("xpath"), Some("//csv:Metadata/ead:unitdate"));
        assert_eq!(terms[2].attribute("displayName"), Some("ead:unitdate"));
        assert_eq!(terms[2].attribute("indexType"), Some(INDEX_TYPE));
        assert_eq!(root.lookup_namespace_uri(Some("csv")), Some("urn:example"));
    }

    #[test]
    fn test_repeated_headers_in_index_and_definition() {
        let source = TabularSource::from_csv_str("id,note,note\n1,a,b\n").unwrap();
        let request = GenerationRequest::builder(source, "Metadata", "urn:example")
            .with_formatting(Formatting::Compact)
            .build()
            .unwrap();

        let index = String::from_utf8(generate_search_index(&request).unwrap()).unwrap();
        assert!(index.contains("<note>a</note><note>b</note>"));

        let definition = String::from_utf8(generate_index_definition(&request).unwrap()).unwrap();
        assert_eq!(definition.matches("indexName=\"csv_note\"").count(), 1);
    }
}
