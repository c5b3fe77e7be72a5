//! Per-row XML document generation
//!
//! `generate_documents` walks the data rows in order and yields one
//! `GeneratedDocument` per row. The file stem comes from the naming
//! column; names are not made unique, so a naming column with repeated
//! values yields repeated file names (logged, and left to the caller).

use crate::documents::Element;
use crate::error::Result;
use crate::mapper::RowMapper;
use crate::names::sanitize_file_stem;
use crate::namespaces::{QName, OPEX_NAMESPACE};
use crate::pretty::render;
use crate::request::{GenerationRequest, NamingConvention};
use std::collections::HashSet;
use tracing::{debug, warn};

/// One generated per-row document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    /// File name including the convention's extension
    pub file_name: String,
    /// 0-based data row the document was built from
    pub row: usize,
    /// Element tree that was serialized (including any OPEX envelope)
    pub element: Element,
    /// Serialized document
    pub bytes: Vec<u8>,
}

/// Lazy, row-ordered sequence of generated documents.
///
/// Stateless with respect to the request; calling `generate_documents`
/// again restarts from the first row.
#[derive(Debug)]
pub struct Documents<'a> {
    request: &'a GenerationRequest,
    mapper: RowMapper<'a>,
    next_row: usize,
    seen: HashSet<String>,
}

/// Generate one document per data row, in row order
pub fn generate_documents(request: &GenerationRequest) -> Documents<'_> {
    debug!(
        rows = request.source().row_count(),
        convention = %request.convention(),
        "generating documents"
    );
    Documents {
        request,
        mapper: RowMapper::for_request(request),
        next_row: 0,
        seen: HashSet::new(),
    }
}

impl<'a> Documents<'a> {
    fn build(&mut self, index: usize, row: &[&str]) -> Result<GeneratedDocument> {
        let naming = self.request.naming_column();
        let value = row.get(naming.index).copied().unwrap_or("");
        let stem = file_stem(value, index);
        let convention = self.request.convention();
        let file_name = format!("{}{}", stem, convention.extension());

        if !self.seen.insert(file_name.clone()) {
            warn!(
                row = index + 1,
                file = %file_name,
                column = %naming.header,
                "file name already used by an earlier row; it will overwrite that file"
            );
        }

        let mut element = self.mapper.map_row(row);
        if convention == NamingConvention::Opex {
            element = wrap_opex(element);
        }

        let bytes = render(&element, self.request.formatting())?;
        Ok(GeneratedDocument {
            file_name,
            row: index,
            element,
            bytes,
        })
    }
}

impl<'a> Iterator for Documents<'a> {
    type Item = Result<GeneratedDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_row;
        let row = self.request.source().row(index)?;
        self.next_row += 1;
        Some(self.build(index, &row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.request.source().row_count().saturating_sub(self.next_row);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Documents<'a> {}

/// Sanitized stem for a naming-column value, or `row-<n>` (1-based) when
/// the value is unusable
pub fn file_stem(value: &str, row: usize) -> String {
    sanitize_file_stem(value).unwrap_or_else(|| {
        let placeholder = format!("row-{}", row + 1);
        warn!(
            row = row + 1,
            value,
            placeholder = %placeholder,
            "naming column value is not a usable file name; using placeholder"
        );
        placeholder
    })
}

/// Wrap a row element in `OPEXMetadata/DescriptiveMetadata`
pub fn wrap_opex(element: Element) -> Element {
    let descriptive = Element::new(QName::namespaced(OPEX_NAMESPACE, "DescriptiveMetadata")).with_child(element);
    Element::new(QName::namespaced(OPEX_NAMESPACE, "OPEXMetadata"))
        .declare_prefix("opex", OPEX_NAMESPACE)
        .with_child(descriptive)
}
