use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use xmlobject::config::{ParserConfig, WriterConfig};
use xmlobject::{dom, marshaller, unmarshaller, ProviderRegistry};

#[derive(Debug, Parser)]
#[command(
    name = "xmlobject",
    version,
    about = "Unmarshall a SAML document into an object tree and marshall it back"
)]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Indent the output and write an XML declaration
    #[arg(short, long)]
    pretty: bool,
    /// Print the element owning this ID instead of the whole document
    #[arg(short, long, value_name = "ID")]
    resolve: Option<String>,
    /// Drop cached forms so the output is rebuilt from the object tree
    #[arg(long)]
    rebuild: bool,
    /// Accept documents with a DOCTYPE declaration
    #[arg(long)]
    allow_doctype: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let input = read_input(args.input.as_ref())?;

    let config = ParserConfig {
        allow_doctype: args.allow_doctype,
        ..ParserConfig::default()
    };
    let element =
        dom::from_bytes_with_config(input.as_bytes(), config).context("failed to parse input")?;
    let registry = ProviderRegistry::global();
    let root = unmarshaller::unmarshall(&element, registry).context("failed to unmarshall")?;
    info!(element = %root.element_qname(), ids = root.id_index().len(), "unmarshalled document");

    let target = match &args.resolve {
        Some(id) => match root.resolve_id(id) {
            Some(node) => node,
            None => bail!("no element with ID {id:?}"),
        },
        None => root,
    };
    if args.rebuild {
        target.release_cached_form(false);
        target.release_children_cached_form(true);
    }

    let marshalled = marshaller::marshall(&target, registry).context("failed to marshall")?;
    let writer_config = if args.pretty {
        WriterConfig::pretty()
    } else {
        WriterConfig::default()
    };
    let mut output = dom::Writer::new(writer_config).write(&marshalled);
    output.push('\n');

    write_output(args.output.as_ref(), output.as_bytes())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => io::stdout()
            .write_all(data)
            .context("failed to write stdout"),
    }
}
