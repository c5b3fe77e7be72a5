//! Whole-request generation and output
//!
//! `generate_bundle` runs every generator for one request and only returns
//! once all artifacts exist in memory; any fatal error means no bundle at
//! all. Writing is a separate step through an `ArtifactSink`, so the core
//! never assumes a directory layout or archive format.

use crate::cmis::generate_cmis_transform;
use crate::error::{Error, Result};
use crate::generator::{generate_documents, GeneratedDocument};
use crate::request::GenerationRequest;
use crate::schema::{generate_schema_set, SchemaFile};
use crate::search::{generate_index_definition, generate_search_index};
use indexmap::IndexMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Directory (relative to the sink) holding per-row documents
pub const DOCUMENTS_DIR: &str = "documents";

/// File name of the aggregate search index
pub const SEARCH_INDEX_FILE: &str = "search-index.xml";

/// File name of the custom search index definition
pub const INDEX_DEFINITION_FILE: &str = "custom-index.xml";

/// File name of the CMIS transform
pub const CMIS_TRANSFORM_FILE: &str = "cmis-transform.xslt";

/// Destination for generated artifacts
pub trait ArtifactSink {
    /// Store `bytes` under a relative, `/`-separated path
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()>;
}

/// Every artifact generated for one request
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Per-row documents in row order
    pub documents: Vec<GeneratedDocument>,
    /// Main schema first, then imported schemas
    pub schemas: Vec<SchemaFile>,
    /// Aggregate search index
    pub search_index: Vec<u8>,
    /// Custom search index definition
    pub index_definition: Vec<u8>,
    /// CMIS transform
    pub cmis_transform: Vec<u8>,
}

/// Generate all artifacts for a request, all or nothing
pub fn generate_bundle(request: &GenerationRequest) -> Result<Bundle> {
    let documents = generate_documents(request).collect::<Result<Vec<_>>>()?;
    let bundle = Bundle {
        documents,
        schemas: generate_schema_set(request)?,
        search_index: generate_search_index(request)?,
        index_definition: generate_index_definition(request)?,
        cmis_transform: generate_cmis_transform(request)?,
    };

    info!(
        documents = bundle.documents.len(),
        schemas = bundle.schemas.len(),
        "generated bundle"
    );
    Ok(bundle)
}

impl Bundle {
    /// Write every artifact to `sink`.
    ///
    /// Documents go under `documents/` in row order, so a later row with
    /// the same file name replaces an earlier one.
    pub fn write_to(&self, sink: &mut dyn ArtifactSink) -> Result<()> {
        for document in &self.documents {
            sink.write(&format!("{}/{}", DOCUMENTS_DIR, document.file_name), &document.bytes)?;
        }
        for schema in &self.schemas {
            sink.write(&schema.file_name, &schema.bytes)?;
        }
        sink.write(SEARCH_INDEX_FILE, &self.search_index)?;
        sink.write(INDEX_DEFINITION_FILE, &self.index_definition)?;
        sink.write(CMIS_TRANSFORM_FILE, &self.cmis_transform)?;
        Ok(())
    }
}

/// Sink writing into a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create a sink rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write outside the output directory: {}", path),
            )));
        }

        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        Ok(())
    }
}

/// Sink collecting artifacts in memory, keyed by path in first-write order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Stored artifacts
    pub files: IndexMap<String, Vec<u8>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
