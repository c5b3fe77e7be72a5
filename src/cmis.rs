//! CMIS transform generation
//!
//! Produces an XSLT 2.0 stylesheet that turns a generated document into the
//! `group`/`item` structure the Preservica CMIS metadata view expects. The
//! stylesheet mirrors the header list: one `item` per distinct qualified
//! name, selecting that element. A repeated header yields one item whose
//! value joins every occurrence.

use crate::documents::Element;
use crate::error::Result;
use crate::namespaces::{
    QName, CMIS_METADATA_NAMESPACE, XPATH_FUNCTIONS_NAMESPACE, XSD_NAMESPACE, XSLT_NAMESPACE,
};
use crate::pretty::render;
use crate::request::GenerationRequest;

/// Field type written for every item
pub const ITEM_TYPE: &str = "string";

/// Generate the CMIS transform for a request
pub fn generate_cmis_transform(request: &GenerationRequest) -> Result<Vec<u8>> {
    let descriptor = request.descriptor();
    let binding = descriptor.binding();
    let xsl = binding.unused_prefix("xsl");
    let functions = binding.unused_prefix("fn");
    let xs = binding.unused_prefix("xs");
    let csv = binding.unused_prefix("csv");

    let mut excluded = vec![functions.clone(), xs.clone(), csv.clone()];
    let mut stylesheet = xslt("stylesheet")
        .declare_prefix(xsl, XSLT_NAMESPACE)
        .declare_prefix(functions, XPATH_FUNCTIONS_NAMESPACE)
        .declare_prefix(xs, XSD_NAMESPACE)
        .declare_prefix(csv.as_str(), descriptor.default_namespace());
    for (prefix, uri) in descriptor.used_prefixes() {
        stylesheet = stylesheet.declare_prefix(prefix, uri);
        excluded.push(prefix.to_string());
    }
    let mut stylesheet = stylesheet
        .declare_default(CMIS_METADATA_NAMESPACE)
        .with_attribute("version", "2.0")
        .with_attribute("exclude-result-prefixes", excluded.join(" "));

    stylesheet.add_child(
        xslt("output")
            .with_attribute("method", "xml")
            .with_attribute("indent", "yes"),
    );

    let mut group = cmis("group").with_child(cmis("title").with_text(request.title()));
    for column in descriptor.distinct_columns() {
        let select = xslt("value-of").with_attribute("select", column.prefixed_name(&csv));
        group.add_child(
            cmis("item")
                .with_child(cmis("name").with_text(request.label(column)))
                .with_child(cmis("value").with_child(select))
                .with_child(cmis("type").with_text(ITEM_TYPE)),
        );
    }

    stylesheet.add_child(
        xslt("template")
            .with_attribute("match", format!("{}:{}", csv, descriptor.root_name()))
            .with_child(group),
    );

    render(&stylesheet, request.formatting())
}

fn xslt(local_name: &str) -> Element {
    Element::new(QName::namespaced(XSLT_NAMESPACE, local_name))
}

fn cmis(local_name: &str) -> Element {
    Element::new(QName::namespaced(CMIS_METADATA_NAMESPACE, local_name))
}
