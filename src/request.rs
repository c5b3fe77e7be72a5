//! Generation requests and their options
//!
//! A `GenerationRequest` is built once, validated as a whole, and then only
//! read by the generators. Every user choice is a closed enum so that an
//! unknown option cannot silently fall back to a default.

use crate::error::{Error, Result};
use crate::headers::{Column, SchemaDescriptor};
use crate::names::{ncname_violation, xml_safe_text};
use crate::namespaces::NamespaceBinding;
use crate::tabular::TabularSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Title used by the index definition and the CMIS transform
pub const DEFAULT_TITLE: &str = "Metadata Title";

/// File naming convention for per-row documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    /// `<stem>.xml`
    #[default]
    Plain,
    /// `<stem>.metadata`, for the Preservica SIP Creator
    #[serde(alias = "metadata")]
    #[cfg_attr(feature = "cli", value(alias = "metadata"))]
    PreservicaMetadata,
    /// `<stem>.opex` wrapped in an OPEX envelope, for the PUT tool
    Opex,
}

impl NamingConvention {
    /// File extension including the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            NamingConvention::Plain => ".xml",
            NamingConvention::PreservicaMetadata => ".metadata",
            NamingConvention::Opex => ".opex",
        }
    }
}

/// Output formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Formatting {
    /// Indented, for humans
    #[default]
    Pretty,
    /// Single line, for machines
    Compact,
}

/// Whether the naming column also appears inside each document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingColumnMode {
    /// Keep the naming column's element in its header position
    #[default]
    Include,
    /// Leave the naming column's element out
    Exclude,
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One validated generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    source: TabularSource,
    descriptor: SchemaDescriptor,
    naming_column: usize,
    naming_mode: NamingColumnMode,
    convention: NamingConvention,
    formatting: Formatting,
    title: String,
    labels: HashMap<String, String>,
}

impl GenerationRequest {
    /// Start building a request
    pub fn builder(
        source: TabularSource,
        root_element: impl Into<String>,
        default_namespace: impl Into<String>,
    ) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            source,
            root_element: root_element.into(),
            default_namespace: default_namespace.into(),
            prefixes: Vec::new(),
            naming_column: None,
            naming_mode: NamingColumnMode::default(),
            convention: NamingConvention::default(),
            formatting: Formatting::default(),
            title: DEFAULT_TITLE.to_string(),
            labels: HashMap::new(),
        }
    }

    /// Source rows
    pub fn source(&self) -> &TabularSource {
        &self.source
    }

    /// Resolved column model
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Column whose value names each output file
    pub fn naming_column(&self) -> &Column {
        &self.descriptor.columns()[self.naming_column]
    }

    /// Include or exclude the naming column from documents
    pub fn naming_mode(&self) -> NamingColumnMode {
        self.naming_mode
    }

    /// File naming convention
    pub fn convention(&self) -> NamingConvention {
        self.convention
    }

    /// Output formatting
    pub fn formatting(&self) -> Formatting {
        self.formatting
    }

    /// Title for the index definition and CMIS transform
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Display label for a column: caller-supplied, else the header text
    pub fn label<'a>(&'a self, column: &'a Column) -> &'a str {
        self.labels
            .get(&column.header)
            .map(String::as_str)
            .unwrap_or(&column.header)
    }
}

/// Builder for `GenerationRequest`
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    source: TabularSource,
    root_element: String,
    default_namespace: String,
    prefixes: Vec<(String, String)>,
    naming_column: Option<String>,
    naming_mode: NamingColumnMode,
    convention: NamingConvention,
    formatting: Formatting,
    title: String,
    labels: HashMap<String, String>,
}

impl GenerationRequestBuilder {
    /// Bind an extra namespace prefix used by headers
    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), uri.into()));
        self
    }

    /// Set the column whose values name the output files
    pub fn with_naming_column(mut self, header: impl Into<String>) -> Self {
        self.naming_column = Some(header.into());
        self
    }

    /// Include or exclude the naming column
    pub fn with_naming_mode(mut self, mode: NamingColumnMode) -> Self {
        self.naming_mode = mode;
        self
    }

    /// Set the naming convention
    pub fn with_convention(mut self, convention: NamingConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Set the output formatting
    pub fn with_formatting(mut self, formatting: Formatting) -> Self {
        self.formatting = formatting;
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set a CMIS display label for a header
    pub fn with_label(mut self, header: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(header.into(), label.into());
        self
    }

    /// Validate everything and produce the request.
    ///
    /// The naming column defaults to the first header.
    pub fn build(self) -> Result<GenerationRequest> {
        let root = self.root_element.trim().to_string();
        if let Some(reason) = ncname_violation(&root) {
            return Err(Error::InvalidRootElement { name: root, reason });
        }

        let mut binding = NamespaceBinding::new(self.default_namespace)?;
        for (prefix, uri) in self.prefixes {
            binding.bind(prefix, uri)?;
        }

        let descriptor = SchemaDescriptor::build(&root, self.source.headers(), &binding)?;

        let naming_column = match self.naming_column {
            Some(header) => descriptor
                .columns()
                .iter()
                .position(|c| c.header == header.trim())
                .ok_or(Error::UnknownNamingColumn(header))?,
            None => 0,
        };

        Ok(GenerationRequest {
            source: self.source,
            descriptor,
            naming_column,
            naming_mode: self.naming_mode,
            convention: self.convention,
            formatting: self.formatting,
            title: xml_safe_text(&self.title).into_owned(),
            labels: self
                .labels
                .into_iter()
                .map(|(header, label)| (header, xml_safe_text(&label).into_owned()))
                .collect(),
        })
    }
}
