use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use tempfile::NamedTempFile;

use crate::error::ConvertError;
use crate::generator::csv::{CsvGenerator, ExportReport};
use crate::generator::testlink_xml::TestLinkXmlGenerator;
use crate::parser::csv::{CsvOptions, CsvParser, ImportReport};
use crate::parser::testlink_xml::TestLinkXmlParser;

/// Where `import` writes when no output path is given: `<stem>_converted.xml`
/// next to the input.
pub fn default_import_output(input: &Path) -> PathBuf {
    sibling_path(input, "_converted.xml")
}

/// Where `export` writes when no output path is given: `<stem>.csv` next to
/// the input.
pub fn default_export_output(input: &Path) -> PathBuf {
    sibling_path(input, ".csv")
}

fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, suffix))
}

/// Converts the CSV sheet at `input` into TestLink import XML at `output`.
///
/// # Arguments
/// * `input` - Path of the CSV file to read.
/// * `output` - Path of the XML file to write. It is replaced only when the
///   conversion succeeds.
/// * `options` - How the CSV file is encoded and laid out.
///
/// # Returns
/// * `Ok(ImportReport)` - Counts of the imported test cases and steps, and the
///   skipped records or groups.
pub fn run_import(input: &Path, output: &Path, options: &CsvOptions) -> Result<ImportReport> {
    let bytes = read_source(input)?;
    let (spec, report) = CsvParser::new(options.clone())
        .parse_bytes(&bytes)
        .with_context(|| format!("failed to import {}", input.display()))?;
    let xml = TestLinkXmlGenerator::new(&spec).output()?;
    write_atomically(output, xml.as_bytes())?;

    info!(
        "{} -> {}: {} test cases, {} steps, {} records or groups skipped",
        input.display(),
        output.display(),
        report.test_cases,
        report.steps,
        report.diagnostics.len()
    );
    Ok(report)
}

/// Converts the TestLink XML at `input` into a CSV sheet at `output`.
pub fn run_export(input: &Path, output: &Path, options: &CsvOptions) -> Result<ExportReport> {
    let bytes = read_source(input)?;
    let (text, _, _) = encoding_rs::UTF_8.decode(&bytes);
    let spec = TestLinkXmlParser::new()
        .parse(&text)
        .with_context(|| format!("failed to export {}", input.display()))?;
    let (csv, report) = CsvGenerator::new(&spec, options.clone()).output_bytes()?;
    write_atomically(output, &csv)?;

    info!(
        "{} -> {}: {} test cases, {} rows",
        input.display(),
        output.display(),
        report.test_cases,
        report.rows
    );
    Ok(report)
}

fn read_source(path: &Path) -> Result<Vec<u8>, ConvertError> {
    fs::read(path).map_err(|source| ConvertError::SourceAccess {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `contents` to a temporary file beside `path` and renames it into
/// place, so a failed conversion never leaves a partial destination.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ConvertError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let persist_error = |source: std::io::Error| ConvertError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(persist_error)?;
    file.write_all(contents).map_err(persist_error)?;
    file.flush().map_err(persist_error)?;
    file.persist(path).map_err(|e| persist_error(e.error))?;
    Ok(())
}
