//! Batch converter: MARCXML files in, one RDF document per record out.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use marcrdf::mapper::{
    Converter, ConverterConfig, RdfFormat, StatementSink, Vocabulary, DEFAULT_HOST,
};
use marcrdf::marcxml::read_marcxml_file;
use marcrdf::Record;

/// Convert MARCXML records to RDF with a mapping document.
#[derive(Debug, Parser)]
#[command(name = "marcrdf", version, about)]
struct Cli {
    /// Mapping document (YAML, or JSON with a .json extension)
    #[arg(short, long, default_value = "mapping.yaml")]
    mapping: PathBuf,

    /// MARCXML file to convert
    #[arg(short, long, conflicts_with = "input_dir", required_unless_present = "input_dir")]
    input: Option<PathBuf>,

    /// Directory of *.marcxml files to convert
    #[arg(short = 'd', long)]
    input_dir: Option<PathBuf>,

    /// Write one file per record here instead of standard output
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format: ntriples, turtle, rdfxml or jsonld
    #[arg(short, long, default_value_t = RdfFormat::NTriples)]
    format: RdfFormat,

    /// Host of minted subject URIs
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Class asserted as rdf:type of every record (repeatable)
    #[arg(long = "type", value_name = "CLASS", default_value = "ONTOLOGY.Publication")]
    types: Vec<String>,

    /// Assert no rdf:type for records
    #[arg(long, conflicts_with = "types")]
    untyped: bool,

    /// Extra vocabulary prefix (repeatable)
    #[arg(long = "prefix", value_name = "NAME=URI", value_parser = parse_prefix)]
    prefixes: Vec<(String, String)>,
}

fn parse_prefix(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, uri)) if !name.is_empty() && !uri.is_empty() => {
            Ok((name.to_string(), uri.to_string()))
        },
        _ => Err(format!("expected NAME=URI, got `{s}`")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let started = Instant::now();

    let vocabulary = Vocabulary::builder()
        .extend(&Vocabulary::standard())
        .with_prefixes(cli.prefixes.iter().map(|(name, uri)| (name, uri.clone())))
        .build();
    let config = converter_config(&cli);
    let converter = Converter::from_mapping_path(&cli.mapping, &vocabulary, config)
        .with_context(|| format!("Failed to load mapping {}", cli.mapping.display()))?;
    info!(
        mapping = %cli.mapping.display(),
        rules = converter.mapping().rules.len(),
        "mapping loaded"
    );

    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut stdout = io::stdout().lock();
    let (converted, failed) = convert_inputs(&converter, &cli, &mut stdout)?;
    stdout.flush()?;
    info!(converted, failed, elapsed = ?started.elapsed(), "conversion finished");
    Ok(())
}

fn converter_config(cli: &Cli) -> ConverterConfig {
    let types: &[String] = if cli.untyped { &[] } else { &cli.types };
    types
        .iter()
        .fold(
            ConverterConfig::new().with_host(cli.host.as_str()),
            |config, class| config.with_record_type(class.as_str()),
        )
        .with_output_format(cli.format)
}

/// Converts every input record, returning the converted and failed counts.
///
/// N-Triples on `out` is written record by record. Other formats are
/// document formats, so their statements are collected and written once.
fn convert_inputs(
    converter: &Converter,
    cli: &Cli,
    out: &mut impl Write,
) -> Result<(usize, usize)> {
    let format = converter.config().output_format;
    let mut pending = StatementSink::new();
    let mut converted = 0usize;
    let mut failed = 0usize;

    for path in input_files(cli)? {
        let records = match read_marcxml_file(&path) {
            Ok(records) => records,
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping unreadable input");
                failed += 1;
                continue;
            },
        };

        for record in &records {
            let written = converter.convert(record).and_then(|statements| {
                match (&cli.output_dir, format) {
                    (Some(dir), _) => {
                        write_file(&output_path(dir, record, format), &statements, format)
                    },
                    (None, RdfFormat::NTriples) => {
                        statements.serialize_to_writer(&mut *out, format)
                    },
                    (None, _) => {
                        pending.extend(statements);
                        Ok(())
                    },
                }
            });
            match written {
                Ok(()) => converted += 1,
                Err(e) if e.is_configuration_error() => {
                    return Err(e).with_context(|| {
                        format!("Mapping error while converting {}", path.display())
                    });
                },
                Err(e) => {
                    error!(
                        path = %path.display(),
                        id = record.control_number().unwrap_or_default(),
                        error = %e,
                        "skipping record"
                    );
                    failed += 1;
                },
            }
        }
    }

    if cli.output_dir.is_none() && format != RdfFormat::NTriples {
        pending
            .serialize_to_writer(&mut *out, format)
            .context("Failed to write statements")?;
    }
    Ok((converted, failed))
}

/// Input files in a stable order.
fn input_files(cli: &Cli) -> Result<Vec<PathBuf>> {
    match (&cli.input, &cli.input_dir) {
        (Some(file), _) => Ok(vec![file.clone()]),
        (None, Some(dir)) => {
            let mut files = Vec::new();
            for entry in fs::read_dir(dir)
                .with_context(|| format!("Failed to read input directory {}", dir.display()))?
            {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "marcxml") {
                    files.push(path);
                }
            }
            files.sort();
            if files.is_empty() {
                warn!(dir = %dir.display(), "no .marcxml files found");
            }
            Ok(files)
        },
        (None, None) => bail!("one of --input or --input-dir is required"),
    }
}

fn write_file(path: &Path, statements: &StatementSink, format: RdfFormat) -> marcrdf::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    statements.serialize_to_writer(&mut writer, format)?;
    writer.flush()?;
    Ok(())
}

/// `{dir}/{control number}.{ext}`, path separators in the identifier replaced.
fn output_path(dir: &Path, record: &Record, format: RdfFormat) -> PathBuf {
    let id: String = record
        .control_number()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or("unidentified")
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    dir.join(format!("{id}.{}", format.file_extension()))
}
