//! XSD schema synthesis
//!
//! The main schema declares the root element with an anonymous complex
//! type. Normally that is a sequence with one optional particle per run of
//! equal headers, in header order, whose `maxOccurs` is the run length.
//! When a repeated header is split by other columns no sequence can
//! describe the documents unambiguously, so the content model becomes an
//! unbounded choice over the distinct names instead.
//!
//! Columns in the default namespace are declared locally as `xs:string`;
//! columns in other namespaces are referenced by qualified name and
//! imported from a small schema per namespace.

use crate::documents::Element;
use crate::error::Result;
use crate::headers::{Column, SchemaDescriptor};
use crate::namespaces::{QName, XSD_NAMESPACE};
use crate::pretty::render;
use crate::request::GenerationRequest;
use tracing::debug;

/// A schema document and the file name it is referenced by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    /// File name, e.g. `Metadata.xsd` or `ead.xsd`
    pub file_name: String,
    /// Target namespace of the schema
    pub target_namespace: String,
    /// Serialized schema
    pub bytes: Vec<u8>,
}

/// Generate the main XSD for a request
pub fn generate_schema(request: &GenerationRequest) -> Result<Vec<u8>> {
    let builder = SchemaBuilder::new(request.descriptor());
    render(&builder.main_schema(), request.formatting())
}

/// Generate the main XSD plus one imported schema per namespace used by
/// a prefixed header.
///
/// The main schema comes first; import `schemaLocation`s match the file
/// names of the others.
pub fn generate_schema_set(request: &GenerationRequest) -> Result<Vec<SchemaFile>> {
    let builder = SchemaBuilder::new(request.descriptor());
    let formatting = request.formatting();
    let descriptor = request.descriptor();

    let mut files = vec![SchemaFile {
        file_name: builder.main_file_name(),
        target_namespace: descriptor.default_namespace().to_string(),
        bytes: render(&builder.main_schema(), formatting)?,
    }];

    for (prefix, uri) in descriptor.used_namespaces() {
        files.push(SchemaFile {
            file_name: builder.import_file_name(prefix),
            target_namespace: uri.to_string(),
            bytes: render(&builder.import_schema(uri), formatting)?,
        });
    }

    debug!(files = files.len(), "generated schema set");
    Ok(files)
}

/// Builds schema element trees for one descriptor
struct SchemaBuilder<'a> {
    descriptor: &'a SchemaDescriptor,
    xs: String,
}

impl<'a> SchemaBuilder<'a> {
    fn new(descriptor: &'a SchemaDescriptor) -> Self {
        Self {
            descriptor,
            xs: descriptor.binding().unused_prefix("xs"),
        }
    }

    fn xs(&self, local_name: &str) -> Element {
        Element::new(QName::namespaced(XSD_NAMESPACE, local_name))
    }

    fn string_type(&self) -> String {
        format!("{}:string", self.xs)
    }

    fn main_file_name(&self) -> String {
        format!("{}.xsd", self.descriptor.root_name())
    }

    fn import_file_name(&self, prefix: &str) -> String {
        let name = format!("{}.xsd", prefix);
        if name == self.main_file_name() {
            format!("{}-import.xsd", prefix)
        } else {
            name
        }
    }

    fn schema_root(&self, target_namespace: &str) -> Element {
        self.xs("schema")
            .declare_prefix(self.xs.as_str(), XSD_NAMESPACE)
            .with_attribute("targetNamespace", target_namespace)
            .with_attribute("elementFormDefault", "qualified")
            .with_attribute("attributeFormDefault", "unqualified")
    }

    fn main_schema(&self) -> Element {
        let descriptor = self.descriptor;
        let mut schema = self.schema_root(descriptor.default_namespace());
        for (prefix, uri) in descriptor.used_prefixes() {
            schema = schema.declare_prefix(prefix, uri);
        }

        for (prefix, uri) in descriptor.used_namespaces() {
            schema.add_child(
                self.xs("import")
                    .with_attribute("namespace", uri)
                    .with_attribute("schemaLocation", self.import_file_name(prefix)),
            );
        }

        schema.with_child(
            self.xs("element")
                .with_attribute("name", descriptor.root_name())
                .with_child(self.xs("complexType").with_child(self.content_model())),
        )
    }

    fn content_model(&self) -> Element {
        let runs = column_runs(self.descriptor.columns());
        let distinct = self.descriptor.distinct_columns();

        if runs.len() == distinct.len() {
            return runs.into_iter().fold(self.xs("sequence"), |sequence, (column, count)| {
                sequence.with_child(
                    self.particle(column)
                        .with_attribute("minOccurs", "0")
                        .with_attribute("maxOccurs", count.to_string()),
                )
            });
        }

        debug!(
            columns = self.descriptor.columns().len(),
            distinct = distinct.len(),
            "repeated headers are not adjacent; using an unbounded choice"
        );
        distinct.into_iter().fold(
            self.xs("choice")
                .with_attribute("minOccurs", "0")
                .with_attribute("maxOccurs", "unbounded"),
            |choice, column| choice.with_child(self.particle(column)),
        )
    }

    fn particle(&self, column: &Column) -> Element {
        match column.prefix.as_deref() {
            None => self
                .xs("element")
                .with_attribute("name", column.local_name.as_str())
                .with_attribute("type", self.string_type()),
            Some(prefix) => self
                .xs("element")
                .with_attribute("ref", format!("{}:{}", prefix, column.local_name)),
        }
    }

    fn import_schema(&self, namespace: &str) -> Element {
        self.descriptor
            .distinct_columns()
            .into_iter()
            .filter(|c| c.prefix.is_some() && c.namespace == namespace)
            .fold(self.schema_root(namespace), |schema, column| {
                schema.with_child(
                    self.xs("element")
                        .with_attribute("name", column.local_name.as_str())
                        .with_attribute("type", self.string_type()),
                )
            })
    }
}

/// Consecutive columns with the same qualified name, as (first column, count)
fn column_runs(columns: &[Column]) -> Vec<(&Column, usize)> {
    let mut runs: Vec<(&Column, usize)> = Vec::new();
    for column in columns {
        if let Some((first, count)) = runs.last_mut() {
            if first.namespace == column.namespace && first.local_name == column.local_name {
                *count += 1;
                continue;
            }
        }
        runs.push((column, 1));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Formatting;
    use crate::tabular::TabularSource;

    const EAD: &str = "urn:isbn:1-931666-22-9";

    fn request(csv: &str) -> GenerationRequest {
        GenerationRequest::builder(TabularSource::from_csv_str(csv).unwrap(), "Metadata", "urn:example")
            .with_prefix("ead", EAD)
            .with_formatting(Formatting::Compact)
            .build()
            .unwrap()
    }

    fn parse(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_main_schema_shape() {
        let xsd = parse(&generate_schema(&request("id,title,ead:unitdate\n")).unwrap());
        let doc = roxmltree::Document::parse(&xsd).unwrap();
        let root = doc.root_element();

        assert_eq!(root.tag_name().namespace(), Some(XSD_NAMESPACE));
        assert_eq!(root.attribute("targetNamespace"), Some("urn:example"));
        assert_eq!(root.attribute("elementFormDefault"), Some("qualified"));

        let import = root.children().find(|n| n.has_tag_name((XSD_NAMESPACE, "import"))).unwrap();
        assert_eq!(import.attribute("namespace"), Some(EAD));
        assert_eq!(import.attribute("schemaLocation"), Some("ead.xsd"));

        let particles: Vec<_> = root
            .descendants()
            .filter(|n| n.has_tag_name((XSD_NAMESPACE, "sequence")))
            .flat_map(|s| s.children().filter(|n| n.is_element()))
            .collect();
        assert_eq!(particles.len(), 3);
        assert_eq!(particles[0].attribute("name"), Some("id"));
        assert_eq!(particles[0].attribute("type"), Some("xs:string"));
        assert_eq!(particles[2].attribute("ref"), Some("ead:unitdate"));
        assert!(particles.iter().all(|p| p.attribute("minOccurs") == Some("0")));
        assert!(particles.iter().all(|p| p.attribute("maxOccurs") == Some("1")));
    }

    #[test]
    fn test_schema_set_includes_imports() {
        let files = generate_schema_set(&request("id,ead:unitdate,ead:unittitle\n")).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "Metadata.xsd");
        assert_eq!(files[1].file_name, "ead.xsd");
        assert_eq!(files[1].target_namespace, EAD);

        let xsd = parse(&files[1].bytes);
        let doc = roxmltree::Document::parse(&xsd).unwrap();
        let names: Vec<_> = doc
            .root_element()
            .children()
            .filter(|n| n.is_element())
            .filter_map(|n| n.attribute("name"))
            .collect();
        assert_eq!(names, vec!["unitdate", "unittitle"]);
    }

    #[test]
    fn test_schema_prefix_avoids_header_prefix() {
        let source = TabularSource::from_csv_str("id,xs:thing\n").unwrap();
        let request = GenerationRequest::builder(source, "Metadata", "urn:example")
            .with_prefix("xs", "urn:not-xsd")
            .build()
            .unwrap();
        let xsd = parse(&generate_schema(&request).unwrap());
        assert!(xsd.contains("xmlns:xs1=\"http://www.w3.org/2001/XMLSchema\""));
        assert!(xsd.contains("type=\"xs1:string\""));
        assert!(xsd.contains("ref=\"xs:thing\""));
    }

    fn content_model(xsd: &str) -> (String, Vec<(String, String)>) {
        let doc = roxmltree::Document::parse(xsd).unwrap();
        let model = doc
            .descendants()
            .find(|n| n.has_tag_name((XSD_NAMESPACE, "complexType")))
            .and_then(|n| n.children().find(|c| c.is_element()))
            .unwrap();
        let particles = model
            .children()
            .filter(|n| n.is_element())
            .map(|p| {
                let name = p.attribute("name").or(p.attribute("ref")).unwrap_or("");
                (name.to_string(), p.attribute("maxOccurs").unwrap_or("1").to_string())
            })
            .collect();
        (model.tag_name().name().to_string(), particles)
    }

    #[test]
    fn test_adjacent_repeats_raise_max_occurs() {
        let xsd = parse(&generate_schema(&request("id,note,note,ead:unitdate\n")).unwrap());
        let (kind, particles) = content_model(&xsd);
        assert_eq!(kind, "sequence");
        assert_eq!(
            particles,
            vec![
                ("id".to_string(), "1".to_string()),
                ("note".to_string(), "2".to_string()),
                ("ead:unitdate".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_repeats_use_unbounded_choice() {
        let xsd = parse(&generate_schema(&request("id,note,title,note\n")).unwrap());
        let (kind, particles) = content_model(&xsd);
        assert_eq!(kind, "choice");
        let names: Vec<_> = particles.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "note", "title"]);
        assert!(xsd.contains(r#"maxOccurs="unbounded""#));
    }

    #[test]
    fn test_shared_namespace_gets_one_import() {
        let source = TabularSource::from_csv_str("id,a:x,b:y,a:y\n").unwrap();
        let request = GenerationRequest::builder(source, "Metadata", "urn:example")
            .with_prefix("a", "urn:shared")
            .with_prefix("b", "urn:shared")
            .with_formatting(Formatting::Compact)
            .build()
            .unwrap();

        let files = generate_schema_set(&request).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["Metadata.xsd", "a.xsd"]);

        let main = parse(&files[0].bytes);
        assert_eq!(main.matches("<xs:import ").count(), 1);
        assert!(main.contains(r#"ref="b:y""#));

        let stub = parse(&files[1].bytes);
        let doc = roxmltree::Document::parse(&stub).unwrap();
        let declared: Vec<_> = doc
            .root_element()
            .children()
            .filter_map(|n| n.attribute("name"))
            .collect();
        assert_eq!(declared, vec!["x", "y"]);
    }
}
