use indexmap::IndexMap;
use log::warn;

use crate::error::{Diagnostic, GroupDataError};
use crate::parser::rows::Row;
use crate::parser::schema::{Field, TabularSchema};
use crate::rich_text::RichTextCodec;
use crate::testcase::{CustomField, Step, TestCase, TestSpecification, DEFAULT_FLAG};

/// Scalar columns that must hold a value on the first row of a group.
const REQUIRED_VALUES: [Field; 5] = [
    Field::Name,
    Field::Version,
    Field::Summary,
    Field::Importance,
    Field::ExecutionType,
];

/// Builds test cases out of grouped CSV rows.
pub struct TestTreeBuilder<'a> {
    schema: &'a TabularSchema,
    codec: &'a RichTextCodec,
}

impl<'a> TestTreeBuilder<'a> {
    /// Creates a new `TestTreeBuilder`.
    ///
    /// # Arguments
    /// * `schema` - The column positions resolved from the CSV header.
    /// * `codec` - The codec that turns plain text cells into rich text.
    pub fn new(schema: &'a TabularSchema, codec: &'a RichTextCodec) -> Self {
        TestTreeBuilder { schema, codec }
    }

    /// Builds a `TestSpecification` from every group.
    ///
    /// Groups that fail [`TestTreeBuilder::build_test_case`] are left out and
    /// reported as diagnostics.
    pub fn build(&self, groups: &IndexMap<String, Vec<Row>>) -> (TestSpecification, Vec<Diagnostic>) {
        let mut spec = TestSpecification::new();
        let mut diagnostics = Vec::new();

        for (key, rows) in groups {
            let Some(first) = rows.first() else {
                continue;
            };
            match self.build_test_case(key, rows) {
                Ok(case) => {
                    let suite = first.non_empty(self.schema.test_suite);
                    spec.add_test_case(suite, case);
                }
                Err(err) => {
                    warn!("{}", err);
                    diagnostics.push(err.into());
                }
            }
        }

        (spec, diagnostics)
    }

    /// Builds one test case from the rows of group `key`.
    ///
    /// Scalar fields come from the first row. Every row with a step number
    /// adds one step, in row order. Free text goes through the rich text codec.
    pub fn build_test_case(&self, key: &str, rows: &[Row]) -> Result<TestCase, GroupDataError> {
        let Some(first) = rows.first() else {
            return Err(GroupDataError::MissingValue {
                key: key.to_string(),
                field: self.schema.vocabulary.header(Field::Name).to_string(),
            });
        };

        for field in REQUIRED_VALUES {
            if first.non_empty(self.schema.position(field)).is_none() {
                return Err(GroupDataError::MissingValue {
                    key: key.to_string(),
                    field: self.schema.vocabulary.header(field).to_string(),
                });
            }
        }

        let schema = self.schema;
        let flag = |column: Option<usize>| {
            first
                .non_empty(column)
                .unwrap_or(DEFAULT_FLAG)
                .to_string()
        };

        let mut case = TestCase::new(first.get(schema.name));
        case.internal_id = first.non_empty(schema.id).map(String::from);
        case.external_id = first.non_empty(schema.external_id).map(String::from);
        case.version = first.get(schema.version).to_string();
        case.summary = self.codec.encode(first.get(schema.summary));
        case.preconditions = self.codec.encode(first.get_opt(schema.preconditions));
        case.importance = first.get(schema.importance).to_string();
        case.execution_type = first.get(schema.execution_type).to_string();
        case.estimated_duration = first.non_empty(schema.estimated_duration).map(String::from);
        case.status = flag(schema.status);
        case.is_open = flag(schema.is_open);
        case.active = flag(schema.active);
        case.custom_fields = schema
            .custom_fields
            .iter()
            .filter_map(|(name, column)| {
                first.non_empty(Some(*column)).map(|value| CustomField {
                    name: name.clone(),
                    value: without_blank_lines(value),
                })
            })
            .collect();
        case.steps = rows.iter().filter_map(|row| self.build_step(key, row)).collect();

        Ok(case)
    }

    fn build_step(&self, key: &str, row: &Row) -> Option<Step> {
        let number = row.non_empty(Some(self.schema.step_number))?;
        let actions = row.get(self.schema.actions);
        let expected = row.get(self.schema.expected_results);
        if actions.is_empty() || expected.is_empty() {
            warn!(
                "test case {}: step {} (line {}) has empty actions or expected results",
                key, number, row.line
            );
        }

        Some(Step {
            number: number.to_string(),
            actions: self.codec.encode(actions),
            expected_results: self.codec.encode(expected),
            execution_type: row
                .non_empty(Some(self.schema.execution_type))
                .unwrap_or(DEFAULT_FLAG)
                .to_string(),
        })
    }
}

/// Custom field values are written verbatim, and the XML output carries no
/// blank lines.
fn without_blank_lines(value: &str) -> String {
    value
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
