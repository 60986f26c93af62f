use log::{debug, warn};
use quick_xml::de::Deserializer;
use regex::Regex;
use serde::Deserialize;

use crate::error::{ConvertError, Result};
use crate::testcase::{
    CustomField, Step, TestCase, TestSpecification, DEFAULT_FLAG, DEFAULT_IMPORTANCE,
};

// Element layout of a TestLink export. Both `<testcases>` and `<testsuite>`
// roots deserialize into `RawSuite`; unknown elements are ignored.

#[derive(Debug, Default, Deserialize)]
struct RawSuite {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(rename = "testsuite", default)]
    suites: Vec<RawSuite>,
    #[serde(rename = "testcase", default)]
    test_cases: Vec<RawTestCase>,
}

#[derive(Debug, Deserialize)]
struct RawTestCase {
    #[serde(rename = "@internalid", default)]
    internal_id: Option<String>,
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(default)]
    externalid: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    preconditions: Option<String>,
    #[serde(default)]
    execution_type: Option<String>,
    #[serde(default)]
    importance: Option<String>,
    #[serde(default)]
    estimated_exec_duration: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_open: Option<String>,
    #[serde(default)]
    active: Option<String>,
    #[serde(default)]
    steps: Option<RawSteps>,
    #[serde(default)]
    custom_fields: Option<RawCustomFields>,
}

#[derive(Debug, Deserialize)]
struct RawSteps {
    #[serde(rename = "step", default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    step_number: Option<String>,
    #[serde(default)]
    actions: Option<String>,
    #[serde(default)]
    expectedresults: Option<String>,
    #[serde(default)]
    execution_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCustomFields {
    #[serde(rename = "custom_field", default)]
    fields: Vec<RawCustomField>,
}

#[derive(Debug, Deserialize)]
struct RawCustomField {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

/// A parser for TestLink test case XML (`<testcases>` or `<testsuite>` roots).
///
/// Rich text fields are returned as stored, still in markup form.
#[derive(Debug, Default)]
pub struct TestLinkXmlParser;

impl TestLinkXmlParser {
    pub fn new() -> Self {
        TestLinkXmlParser
    }

    /// Parses the given XML input and returns a `TestSpecification`.
    ///
    /// Nested CDATA sections (`<![CDATA[<![CDATA[...]]>]]>`), written by older
    /// converters, are collapsed before parsing. A test case belongs to the
    /// nearest enclosing suite that has a name.
    ///
    /// # Arguments
    /// * `input` - A string slice containing TestLink XML.
    ///
    /// # Returns
    /// * `Ok(TestSpecification)` - The test cases and suites found in the input.
    /// * `Err(ConvertError::MalformedMarkup)` - If the XML cannot be read; the
    ///   message ends with the byte offset the reader stopped at.
    pub fn parse(&self, input: &str) -> Result<TestSpecification> {
        let repaired = repair_double_cdata(input)?;
        let mut de = Deserializer::from_str(&repaired);
        let root = RawSuite::deserialize(&mut de).map_err(|e| {
            let reader = de.get_ref().get_ref();
            let position = match reader.error_position() {
                0 => reader.buffer_position(),
                pos => pos,
            };
            ConvertError::MalformedMarkup(format!("{} (at byte {})", e, position))
        })?;

        let residual = Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>")?;
        let mut spec = TestSpecification::new();
        collect_suite(&residual, root, None, &mut spec);
        spec.validate()?;

        debug!("parsed {} test cases", spec.case_count());
        Ok(spec)
    }
}

fn repair_double_cdata(input: &str) -> Result<String> {
    let nested = Regex::new(r"(?s)<!\[CDATA\[<!\[CDATA\[(.*?)\]\]>\]\]>")?;
    Ok(nested.replace_all(input, "<![CDATA[${1}]]>").into_owned())
}

fn collect_suite(residual: &Regex, raw: RawSuite, parent: Option<&str>, spec: &mut TestSpecification) {
    let own_name = Some(raw.name.trim()).filter(|n| !n.is_empty());
    let suite_name = own_name.or(parent);

    if let Some(name) = own_name {
        let details = clean_text(residual, raw.details);
        let suite = spec.suite_mut(name);
        if suite.details.is_empty() {
            suite.details = details;
        }
    }

    for raw_case in raw.test_cases {
        let case = build_test_case(residual, raw_case);
        spec.add_test_case(suite_name, case);
    }
    for child in raw.suites {
        collect_suite(residual, child, suite_name, spec);
    }
}

fn build_test_case(residual: &Regex, raw: RawTestCase) -> TestCase {
    let text = |value: Option<String>| clean_text(residual, value);
    let or_default = |value: Option<String>, default: &str| {
        Some(clean_text(residual, value))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    };
    let optional = |value: Option<String>| Some(clean_text(residual, value)).filter(|v| !v.is_empty());

    let mut case = TestCase::new(raw.name.trim());
    case.internal_id = optional(raw.internal_id);
    case.external_id = optional(raw.externalid);
    case.version = or_default(raw.version, DEFAULT_FLAG);
    case.summary = text(raw.summary);
    case.preconditions = text(raw.preconditions);
    case.execution_type = or_default(raw.execution_type, DEFAULT_FLAG);
    case.importance = or_default(raw.importance, DEFAULT_IMPORTANCE);
    case.estimated_duration = optional(raw.estimated_exec_duration);
    case.status = or_default(raw.status, DEFAULT_FLAG);
    case.is_open = or_default(raw.is_open, DEFAULT_FLAG);
    case.active = or_default(raw.active, DEFAULT_FLAG);

    for raw_step in raw.steps.map(|s| s.steps).unwrap_or_default() {
        let number = text(raw_step.step_number);
        if number.is_empty() {
            warn!("test case \"{}\": step without a step number ignored", case.name);
            continue;
        }
        case.steps.push(Step {
            number,
            actions: text(raw_step.actions),
            expected_results: text(raw_step.expectedresults),
            execution_type: or_default(raw_step.execution_type, DEFAULT_FLAG),
        });
    }

    case.custom_fields = raw
        .custom_fields
        .map(|c| c.fields)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|f| {
            let name = text(f.name);
            (!name.is_empty()).then(|| CustomField {
                name,
                value: text(f.value),
            })
        })
        .collect();

    case
}

/// Unwraps CDATA markers left inside a text value and trims it.
fn clean_text(residual: &Regex, value: Option<String>) -> String {
    let value = value.unwrap_or_default();
    residual.replace_all(&value, "${1}").trim().to_string()
}
