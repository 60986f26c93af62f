use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::error::{ConvertError, Diagnostic, Result};
use crate::parser::builder::TestTreeBuilder;
use crate::parser::rows::{Row, RowGrouper};
use crate::parser::schema::{HeaderVocabulary, TabularSchema};
use crate::rich_text::{RichTextCodec, DEFAULT_BULLET};
use crate::testcase::TestSpecification;

/// Options shared by the CSV reader and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Encoding label as understood by the WHATWG Encoding Standard.
    pub encoding: String,
    pub delimiter: u8,
    pub vocabulary: HeaderVocabulary,
    /// List item marker of plain text fields.
    pub bullet: String,
}

impl Default for CsvOptions {
    /// Returns the options matching the Japanese TestLink spreadsheets.
    ///
    /// Default values:
    /// - `encoding`: "shift_jis"
    /// - `delimiter`: `,`
    /// - `vocabulary`: Japanese headers
    /// - `bullet`: "・"
    fn default() -> Self {
        CsvOptions {
            encoding: "shift_jis".to_string(),
            delimiter: b',',
            vocabulary: HeaderVocabulary::default(),
            bullet: DEFAULT_BULLET.to_string(),
        }
    }
}

impl CsvOptions {
    pub fn encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConvertError::UnknownEncoding(self.encoding.clone()))
    }
}

/// Outcome of a CSV import besides the document itself.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub test_cases: usize,
    pub steps: usize,
    /// Records and groups that were skipped.
    pub diagnostics: Vec<Diagnostic>,
}

/// Reads a TestLink CSV sheet into a `TestSpecification`.
pub struct CsvParser {
    options: CsvOptions,
}

impl CsvParser {
    /// Creates a new `CsvParser` with the given options.
    ///
    /// # Arguments
    /// * `options` - A `CsvOptions` instance selecting the encoding, delimiter,
    ///   header vocabulary and bullet marker.
    pub fn new(options: CsvOptions) -> Self {
        CsvParser { options }
    }

    /// Decodes `bytes` with the configured encoding and parses the text.
    ///
    /// Malformed byte sequences are replaced rather than rejected. A byte
    /// order mark takes precedence over the configured encoding.
    ///
    /// # Arguments
    /// * `bytes` - The raw content of a CSV file.
    ///
    /// # Returns
    /// * `Ok((TestSpecification, ImportReport))` - The imported test cases and
    ///   the records or groups that were skipped.
    /// * `Err(ConvertError)` - If the encoding label is unknown or the sheet
    ///   is structurally unusable.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<(TestSpecification, ImportReport)> {
        let encoding = self.options.encoding()?;
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!(
                "the source is not valid {}; undecodable bytes were replaced",
                used.name()
            );
        }
        self.parse(&text)
    }

    /// Parses CSV text whose first record is the header.
    ///
    /// # Arguments
    /// * `input` - Decoded CSV text.
    pub fn parse(&self, input: &str) -> Result<(TestSpecification, ImportReport)> {
        let mut records = self.read_records(input)?.into_iter();
        let header = records.next().ok_or(ConvertError::EmptySource)?;
        let schema = TabularSchema::resolve(&header.cells, self.options.vocabulary)?;
        debug!("resolved columns: {:?}", schema);

        let rows: Vec<Row> = records.collect();
        if rows.is_empty() {
            return Err(ConvertError::NoDataRows);
        }
        info!("read {} data records", rows.len());

        let grouped = RowGrouper::new(&schema).group(rows);
        let codec = RichTextCodec::new(&self.options.bullet);
        let (spec, group_diagnostics) = TestTreeBuilder::new(&schema, &codec).build(&grouped.groups);

        let mut diagnostics = grouped.diagnostics;
        diagnostics.extend(group_diagnostics);
        let report = ImportReport {
            test_cases: spec.case_count(),
            steps: spec.iter_cases().map(|(_, c)| c.steps.len()).sum(),
            diagnostics,
        };
        Ok((spec, report))
    }

    fn read_records(&self, input: &str) -> Result<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.options.delimiter)
            .from_reader(input.as_bytes());

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1);
            rows.push(Row::new(line, record.iter().map(String::from).collect()));
        }
        Ok(rows)
    }
}
