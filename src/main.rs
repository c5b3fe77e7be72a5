//! Command-line interface for csv2xml

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::collections::HashSet;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use csv2xml::{
    analyze_headers, generate_bundle, DirectorySink, Formatting, GenerationRequest,
    NamingColumnMode, NamingConvention, TabularSource,
};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "csv2xml")]
#[command(author, version, about = "Generate XML documents, schemas and indexes from CSV spreadsheets", long_about = None)]
struct Cli {
    /// Log per-row decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the headers of a CSV file and the prefixes that need a namespace
    Analyze {
        /// Path to the CSV file (UTF-8)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Generate XML documents, schemas, search index and CMIS transform
    Generate {
        /// Path to the CSV file (UTF-8)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Root element of the XML documents, e.g. Metadata
        #[arg(short, long)]
        root: String,

        /// Default namespace for the root element and unprefixed headers
        #[arg(short, long)]
        namespace: String,

        /// Column used to name the XML files; its values should be unique
        #[arg(short, long)]
        column: Option<String>,

        /// Namespace for a header prefix, as PREFIX=URI (repeatable)
        #[arg(long = "ns", value_name = "PREFIX=URI", value_parser = parse_key_value)]
        namespaces: Vec<(String, String)>,

        /// Display label for a header in the CMIS transform, as HEADER=LABEL
        #[arg(long = "label", value_name = "HEADER=LABEL", value_parser = parse_key_value)]
        labels: Vec<(String, String)>,

        /// Leave the naming column out of the XML documents
        #[arg(long)]
        exclude_column: bool,

        /// File naming convention
        #[arg(long, value_enum, default_value_t = NamingConvention::Plain)]
        convention: NamingConvention,

        /// Output formatting
        #[arg(short, long, value_enum, default_value_t = Formatting::Pretty)]
        format: Formatting,

        /// Title for the search index definition and CMIS transform
        #[arg(short, long, default_value = csv2xml::request::DEFAULT_TITLE)]
        title: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyze { file, json } => cmd_analyze(file, json),
        Commands::Generate {
            file,
            root,
            namespace,
            column,
            namespaces,
            labels,
            exclude_column,
            convention,
            format,
            title,
            output,
        } => {
            let options = GenerateOptions {
                root,
                namespace,
                column,
                namespaces,
                labels,
                exclude_column,
                convention,
                format,
                title,
            };
            cmd_generate(file, options, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_analyze(file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = TabularSource::from_csv_path(&file)?;
    let analysis = analyze_headers(&source);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("csv2xml v{}", csv2xml::VERSION);
    println!();
    println!("Rows: {}", source.row_count());
    println!("Columns: {}", source.column_count());
    println!("Headers:");
    for header in &analysis.headers {
        println!("  {}", header);
    }
    if analysis.prefixes.is_empty() {
        println!("No namespace prefixes found");
    } else {
        println!("Prefixes needing a namespace (--ns PREFIX=URI):");
        for prefix in &analysis.prefixes {
            println!("  xmlns:{}", prefix);
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
struct GenerateOptions {
    root: String,
    namespace: String,
    column: Option<String>,
    namespaces: Vec<(String, String)>,
    labels: Vec<(String, String)>,
    exclude_column: bool,
    convention: NamingConvention,
    format: Formatting,
    title: String,
}

#[cfg(feature = "cli")]
fn cmd_generate(
    file: PathBuf,
    options: GenerateOptions,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = TabularSource::from_csv_path(&file)?;

    let mode = if options.exclude_column {
        NamingColumnMode::Exclude
    } else {
        NamingColumnMode::Include
    };

    let mut builder = GenerationRequest::builder(source, options.root, options.namespace)
        .with_naming_mode(mode)
        .with_convention(options.convention)
        .with_formatting(options.format)
        .with_title(options.title);
    if let Some(column) = options.column {
        builder = builder.with_naming_column(column);
    }
    for (prefix, uri) in options.namespaces {
        builder = builder.with_prefix(prefix, uri);
    }
    for (header, label) in options.labels {
        builder = builder.with_label(header, label);
    }
    let request = builder.build()?;

    let bundle = generate_bundle(&request)?;
    let mut sink = DirectorySink::new(&output);
    bundle.write_to(&mut sink)?;

    let distinct: HashSet<_> = bundle.documents.iter().map(|d| &d.file_name).collect();
    println!(
        "Wrote {} documents, {} schema file(s), search index and CMIS transform to {}",
        bundle.documents.len(),
        bundle.schemas.len(),
        output.display()
    );
    if distinct.len() < bundle.documents.len() {
        eprintln!(
            "Warning: column '{}' has repeated values; {} document(s) were overwritten",
            request.naming_column().header,
            bundle.documents.len() - distinct.len()
        );
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
