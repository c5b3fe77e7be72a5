//! # csv2xml
//!
//! Turn a CSV spreadsheet into a family of XML artifacts: one XML document
//! per row, an XSD schema describing those documents, a search index, a
//! Preservica custom index definition and a CMIS transform stylesheet.
//!
//! Headers become element names. A header written as `prefix:local` puts
//! its element in the namespace bound to `prefix`; every other header uses
//! the default namespace given with the request.
//!
//! ## Example
//!
//! ```rust
//! use csv2xml::{generate_documents, GenerationRequest, TabularSource};
//!
//! let source = TabularSource::from_csv_str("id,title,ead:unitdate\n42,Report,2020\n")?;
//! let request = GenerationRequest::builder(source, "Metadata", "urn:example")
//!     .with_prefix("ead", "urn:isbn:1-931666-22-9")
//!     .with_naming_column("id")
//!     .build()?;
//!
//! let documents = generate_documents(&request).collect::<csv2xml::Result<Vec<_>>>()?;
//! assert_eq!(documents[0].file_name, "42.xml");
//! # Ok::<(), csv2xml::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod namespaces;
pub mod documents;

// Input
pub mod tabular;
pub mod headers;
pub mod request;

// Generators
pub mod mapper;
pub mod generator;
pub mod schema;
pub mod search;
pub mod cmis;
pub mod pretty;

// Output
pub mod bundle;

// Re-exports for convenience
pub use bundle::{generate_bundle, ArtifactSink, Bundle, DirectorySink, MemorySink};
pub use cmis::generate_cmis_transform;
pub use error::{Error, Result};
pub use generator::{generate_documents, Documents, GeneratedDocument};
pub use headers::{analyze_headers, HeaderAnalysis, SchemaDescriptor};
pub use mapper::{map_row, RowMapper};
pub use namespaces::NamespaceBinding;
pub use pretty::pretty_print;
pub use request::{Formatting, GenerationRequest, NamingColumnMode, NamingConvention};
pub use schema::{generate_schema, generate_schema_set, SchemaFile};
pub use search::{generate_index_definition, generate_search_index};
pub use tabular::TabularSource;

/// Version of the csv2xml library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
