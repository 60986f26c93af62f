use indexmap::IndexSet;
use log::{debug, warn};

use crate::error::Result;
use crate::parser::csv::CsvOptions;
use crate::parser::schema::{Field, CUSTOM_FIELD_PREFIX};
use crate::rich_text::RichTextCodec;
use crate::testcase::{Step, TestCase, TestSpecification};

/// Outcome of a CSV export.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub test_cases: usize,
    /// Data records written, header excluded.
    pub rows: usize,
}

/// Flattens a `TestSpecification` into a TestLink CSV sheet.
///
/// Each step becomes one record that repeats the scalar fields of its test
/// case; a test case without steps still yields one record with blank step
/// columns. Rich text is decoded back to plain lines. Custom fields get one
/// `cf:<name>` column each, in the order their names are first seen.
pub struct CsvGenerator<'a> {
    spec: &'a TestSpecification,
    options: CsvOptions,
}

impl<'a> CsvGenerator<'a> {
    /// Creates a new `CsvGenerator`.
    ///
    /// # Arguments
    /// * `spec` - The document to flatten.
    /// * `options` - Delimiter, encoding, header vocabulary and bullet marker
    ///   of the sheet to write.
    pub fn new(spec: &'a TestSpecification, options: CsvOptions) -> Self {
        CsvGenerator { spec, options }
    }

    /// The header record followed by the data records.
    pub fn records(&self) -> Vec<Vec<String>> {
        let codec = RichTextCodec::new(&self.options.bullet);
        let custom_names: IndexSet<&str> = self
            .spec
            .iter_cases()
            .flat_map(|(_, c)| c.custom_fields.iter().map(|f| f.name.as_str()))
            .collect();

        let mut header: Vec<String> = Field::EXPORT_ORDER
            .iter()
            .map(|f| self.options.vocabulary.header(*f).to_string())
            .collect();
        header.extend(custom_names.iter().map(|n| format!("{}{}", CUSTOM_FIELD_PREFIX, n)));

        let mut records = vec![header];
        for (suite, case) in self.spec.iter_cases() {
            if case.steps.is_empty() {
                records.push(self.record(&codec, &custom_names, suite, case, None));
            }
            for step in &case.steps {
                records.push(self.record(&codec, &custom_names, suite, case, Some(step)));
            }
        }
        records
    }

    fn record(
        &self,
        codec: &RichTextCodec,
        custom_names: &IndexSet<&str>,
        suite: Option<&str>,
        case: &TestCase,
        step: Option<&Step>,
    ) -> Vec<String> {
        let mut record: Vec<String> = Field::EXPORT_ORDER
            .iter()
            .map(|field| match field {
                Field::Id => case.internal_id.clone().unwrap_or_default(),
                Field::ExternalId => case.external_id.clone().unwrap_or_default(),
                Field::Version => case.version.clone(),
                Field::Name => case.name.clone(),
                Field::Summary => codec.decode(&case.summary),
                Field::Importance => case.importance.clone(),
                Field::Preconditions => codec.decode(&case.preconditions),
                Field::StepNumber => step.map(|s| s.number.clone()).unwrap_or_default(),
                Field::Actions => step.map(|s| codec.decode(&s.actions)).unwrap_or_default(),
                Field::ExpectedResults => step
                    .map(|s| codec.decode(&s.expected_results))
                    .unwrap_or_default(),
                Field::ExecutionType => case.execution_type.clone(),
                Field::EstimatedDuration => case.estimated_duration.clone().unwrap_or_default(),
                Field::Status => case.status.clone(),
                Field::Active => case.active.clone(),
                Field::IsOpen => case.is_open.clone(),
                Field::TestSuite => suite.unwrap_or("").to_string(),
            })
            .collect();

        record.extend(custom_names.iter().map(|name| {
            case.custom_fields
                .iter()
                .find(|f| f.name == *name)
                .map(|f| f.value.clone())
                .unwrap_or_default()
        }));
        record
    }

    /// Writes the sheet as UTF-8 text with every field quoted and CRLF record
    /// terminators.
    pub fn output(&self) -> Result<(String, ExportReport)> {
        let records = self.records();
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .delimiter(self.options.delimiter)
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());
        for record in &records {
            writer.write_record(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let report = ExportReport {
            test_cases: self.spec.case_count(),
            rows: records.len().saturating_sub(1),
        };
        debug!("flattened {} test cases into {} rows", report.test_cases, report.rows);
        Ok((text, report))
    }

    /// Like [`CsvGenerator::output`], encoded with the configured encoding.
    ///
    /// Characters the encoding cannot represent become numeric character
    /// references.
    ///
    /// # Returns
    /// * `Ok((Vec<u8>, ExportReport))` - The encoded sheet and its row counts.
    /// * `Err(ConvertError::UnknownEncoding)` - If the encoding label is not
    ///   recognised.
    pub fn output_bytes(&self) -> Result<(Vec<u8>, ExportReport)> {
        let encoding = self.options.encoding()?;
        let (text, report) = self.output()?;
        let (bytes, used, unmappable) = encoding.encode(&text);
        if unmappable {
            warn!(
                "some characters cannot be represented in {}; written as character references",
                used.name()
            );
        }
        Ok((bytes.into_owned(), report))
    }
}
