use log::debug;

use crate::error::Result;
use crate::generator::element::Element;
use crate::testcase::{CustomField, Step, TestCase, TestSpecification, TestSuite};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Writes a `TestSpecification` as TestLink import XML.
///
/// Documents without suites get a `<testcases>` root. Otherwise the root is an
/// unnamed `<testsuite>` holding one `<testsuite>` per suite, followed by the
/// suite-less test cases.
pub struct TestLinkXmlGenerator<'a> {
    spec: &'a TestSpecification,
}

impl<'a> TestLinkXmlGenerator<'a> {
    /// Creates a new `TestLinkXmlGenerator`.
    ///
    /// # Arguments
    /// * `spec` - The document to render.
    pub fn new(spec: &'a TestSpecification) -> Self {
        TestLinkXmlGenerator { spec }
    }

    /// Renders the whole document, declaration included.
    ///
    /// The document is validated first. The output never contains blank lines,
    /// not even inside CDATA sections.
    ///
    /// # Returns
    /// * `Ok(String)` - The XML text, ending with a newline.
    /// * `Err(ConvertError::Model)` - If a test case has no name or a step has
    ///   no step number.
    pub fn output(&self) -> Result<String> {
        self.spec.validate()?;

        let mut body = String::new();
        self.root().render(0, &mut body);

        let mut out = String::with_capacity(body.len() + XML_DECLARATION.len() + 1);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            out.push_str(line);
            out.push('\n');
        }

        debug!("rendered {} test cases", self.spec.case_count());
        Ok(out)
    }

    fn root(&self) -> Element {
        let cases = self.spec.test_cases.iter().map(test_case_element);
        if self.spec.suites.is_empty() {
            return Element::parent("testcases", cases.collect());
        }

        let children = self
            .spec
            .suites
            .iter()
            .map(suite_element)
            .chain(cases)
            .collect();
        Element::parent("testsuite", children).with_attr("name", "")
    }
}

fn suite_element(suite: &TestSuite) -> Element {
    let mut children = vec![
        Element::text("node_order", &suite.node_order.to_string()),
        Element::text("details", &suite.details),
    ];
    children.extend(suite.test_cases.iter().map(test_case_element));
    Element::parent("testsuite", children).with_attr("name", &suite.name)
}

fn test_case_element(case: &TestCase) -> Element {
    let mut children = vec![
        Element::text("node_order", &case.node_order.to_string()),
        Element::text("externalid", case.external_id.as_deref().unwrap_or("")),
        Element::text("version", &case.version),
        Element::text("summary", &case.summary),
        Element::text("preconditions", &case.preconditions),
        Element::text("execution_type", &case.execution_type),
        Element::text("importance", &case.importance),
        Element::text(
            "estimated_exec_duration",
            case.estimated_duration.as_deref().unwrap_or(""),
        ),
        Element::text("status", &case.status),
        Element::text("is_open", &case.is_open),
        Element::text("active", &case.active),
    ];
    if !case.steps.is_empty() {
        children.push(Element::parent(
            "steps",
            case.steps.iter().map(step_element).collect(),
        ));
    }
    if !case.custom_fields.is_empty() {
        children.push(Element::parent(
            "custom_fields",
            case.custom_fields.iter().map(custom_field_element).collect(),
        ));
    }

    let mut element = Element::parent("testcase", children);
    if let Some(id) = &case.internal_id {
        element = element.with_attr("internalid", id);
    }
    element.with_attr("name", &case.name)
}

fn step_element(step: &Step) -> Element {
    Element::parent(
        "step",
        vec![
            Element::text("step_number", &step.number),
            Element::text("actions", &step.actions),
            Element::text("expectedresults", &step.expected_results),
            Element::text("execution_type", &step.execution_type),
        ],
    )
}

fn custom_field_element(field: &CustomField) -> Element {
    Element::parent(
        "custom_field",
        vec![
            Element::text("name", &field.name),
            Element::text("value", &field.value),
        ],
    )
}
