use thiserror::Error;

/// Value TestLink assumes for `version`, `execution_type` and the status flags
/// when a source leaves them out.
pub const DEFAULT_FLAG: &str = "1";
/// Value TestLink assumes for `importance` (medium) when a source leaves it out.
pub const DEFAULT_IMPORTANCE: &str = "2";

/// Represents errors that can occur during test specification validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// Indicates a validation failure with a descriptive message.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A single step of a test case.
///
/// `actions` and `expected_results` hold rich text. Which form (plain lines or
/// `<p>`/`<ol>` markup) depends on the side of the conversion the step came from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Step {
    /// The step number as written in the source. Never blank.
    pub number: String,
    pub actions: String,
    pub expected_results: String,
    pub execution_type: String,
}

impl Step {
    /// Creates a new `Step` with the default execution type.
    pub fn new(number: &str, actions: &str, expected_results: &str) -> Self {
        Step {
            number: number.to_string(),
            actions: actions.to_string(),
            expected_results: expected_results.to_string(),
            execution_type: DEFAULT_FLAG.to_string(),
        }
    }
}

/// A TestLink custom field attached to a test case.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

/// A test case and its ordered steps.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TestCase {
    /// TestLink's `internalid`. Rows sharing it belong to the same case.
    pub internal_id: Option<String>,
    pub external_id: Option<String>,
    pub name: String,
    pub version: String,
    /// Position of the case among its siblings.
    pub node_order: usize,
    pub summary: String,
    pub preconditions: String,
    pub importance: String,
    pub execution_type: String,
    pub estimated_duration: Option<String>,
    pub status: String,
    pub is_open: String,
    pub active: String,
    /// Steps in order of first appearance in the source.
    pub steps: Vec<Step>,
    pub custom_fields: Vec<CustomField>,
}

impl TestCase {
    /// Creates a new `TestCase` named `name` with every other field at its
    /// TestLink default.
    pub fn new(name: &str) -> Self {
        TestCase {
            internal_id: None,
            external_id: None,
            name: name.to_string(),
            version: DEFAULT_FLAG.to_string(),
            node_order: 0,
            summary: String::new(),
            preconditions: String::new(),
            importance: DEFAULT_IMPORTANCE.to_string(),
            execution_type: DEFAULT_FLAG.to_string(),
            estimated_duration: None,
            status: DEFAULT_FLAG.to_string(),
            is_open: DEFAULT_FLAG.to_string(),
            active: DEFAULT_FLAG.to_string(),
            steps: Vec::new(),
            custom_fields: Vec::new(),
        }
    }

    /// Validates the `TestCase`.
    ///
    /// The name must not be blank, and neither may any step number.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Validation(
                "test case name must not be empty".to_string(),
            ));
        }
        if let Some(pos) = self.steps.iter().position(|s| s.number.trim().is_empty()) {
            return Err(ModelError::Validation(format!(
                "step #{} of test case \"{}\" has no step number",
                pos + 1,
                self.name
            )));
        }
        Ok(())
    }

    /// Checks if the `TestCase` is valid.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// A named test suite holding test cases. Suites do not nest.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TestSuite {
    pub name: String,
    pub node_order: usize,
    /// Rich text describing the suite.
    pub details: String,
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        TestSuite {
            name: name.to_string(),
            node_order: 0,
            details: String::new(),
            test_cases: Vec::new(),
        }
    }
}

/// A whole TestLink import document.
///
/// Test cases that belong to no suite live in `test_cases`; the rest are
/// grouped in `suites`, in the order the suites were first seen.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct TestSpecification {
    pub test_cases: Vec<TestCase>,
    pub suites: Vec<TestSuite>,
}

impl TestSpecification {
    /// Creates a new, empty `TestSpecification`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The suite called `name`, created at the end of the suite list on
    /// first use.
    pub fn suite_mut(&mut self, name: &str) -> &mut TestSuite {
        let pos = match self.suites.iter().position(|s| s.name == name) {
            Some(pos) => pos,
            None => {
                let mut suite = TestSuite::new(name);
                suite.node_order = self.suites.len() + 1;
                self.suites.push(suite);
                self.suites.len() - 1
            }
        };
        &mut self.suites[pos]
    }

    /// Adds `case` to the suite called `suite`, or to the suite-less list when
    /// `suite` is `None`.
    ///
    /// The case's `node_order` is set to its position among its siblings.
    pub fn add_test_case(&mut self, suite: Option<&str>, mut case: TestCase) {
        let siblings = match suite {
            None => &mut self.test_cases,
            Some(name) => &mut self.suite_mut(name).test_cases,
        };
        case.node_order = siblings.len();
        siblings.push(case);
    }

    /// Iterates over every test case together with the name of its suite,
    /// suites first, then the suite-less cases.
    pub fn iter_cases(&self) -> impl Iterator<Item = (Option<&str>, &TestCase)> {
        self.suites
            .iter()
            .flat_map(|s| s.test_cases.iter().map(move |c| (Some(s.name.as_str()), c)))
            .chain(self.test_cases.iter().map(|c| (None, c)))
    }

    /// Total number of test cases in the document.
    pub fn case_count(&self) -> usize {
        self.test_cases.len() + self.suites.iter().map(|s| s.test_cases.len()).sum::<usize>()
    }

    /// Validates every test case in the document.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (_, case) in self.iter_cases() {
            case.validate()?;
        }
        Ok(())
    }

    /// Checks if the `TestSpecification` is valid.
    pub fn valid(&self) -> bool {
        self.validate().is_ok()
    }
}
