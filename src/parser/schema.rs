use clap::ValueEnum;

use crate::error::SchemaError;

/// Header prefix that marks a column as a TestLink custom field, e.g.
/// `cf:Priority`.
pub const CUSTOM_FIELD_PREFIX: &str = "cf:";

/// A logical CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    ExternalId,
    Version,
    Name,
    Summary,
    Importance,
    Preconditions,
    StepNumber,
    Actions,
    ExpectedResults,
    ExecutionType,
    EstimatedDuration,
    Status,
    Active,
    IsOpen,
    TestSuite,
}

impl Field {
    /// Columns a CSV source must have.
    pub const REQUIRED: [Field; 8] = [
        Field::Name,
        Field::Version,
        Field::Summary,
        Field::Importance,
        Field::StepNumber,
        Field::Actions,
        Field::ExpectedResults,
        Field::ExecutionType,
    ];

    /// Columns a CSV source may have.
    pub const OPTIONAL: [Field; 8] = [
        Field::Id,
        Field::ExternalId,
        Field::Preconditions,
        Field::EstimatedDuration,
        Field::Status,
        Field::Active,
        Field::IsOpen,
        Field::TestSuite,
    ];

    /// Column order of exported CSV files.
    pub const EXPORT_ORDER: [Field; 16] = [
        Field::Id,
        Field::ExternalId,
        Field::Version,
        Field::Name,
        Field::Summary,
        Field::Importance,
        Field::Preconditions,
        Field::StepNumber,
        Field::Actions,
        Field::ExpectedResults,
        Field::ExecutionType,
        Field::EstimatedDuration,
        Field::Status,
        Field::Active,
        Field::IsOpen,
        Field::TestSuite,
    ];
}

/// The set of header names a CSV file uses for the logical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HeaderVocabulary {
    /// Headers of the Japanese TestLink spreadsheets (`テストケース名`, ...).
    #[default]
    #[value(name = "ja")]
    Japanese,
    /// Headers named after TestLink's XML elements (`name`, `summary`, ...).
    #[value(name = "en")]
    English,
}

impl HeaderVocabulary {
    /// The exact header text of `field` in this vocabulary.
    pub fn header(self, field: Field) -> &'static str {
        match self {
            HeaderVocabulary::Japanese => match field {
                Field::Id => "ID",
                Field::ExternalId => "外部ID",
                Field::Version => "バージョン",
                Field::Name => "テストケース名",
                Field::Summary => "サマリ（概要）",
                Field::Importance => "重要度",
                Field::Preconditions => "事前条件",
                Field::StepNumber => "ステップ番号",
                Field::Actions => "アクション（手順）",
                Field::ExpectedResults => "期待結果",
                Field::ExecutionType => "実行タイプ",
                Field::EstimatedDuration => "推定実行時間",
                Field::Status => "ステータス",
                Field::Active => "有効/無効",
                Field::IsOpen => "開いているか",
                Field::TestSuite => "親テストスイート名",
            },
            HeaderVocabulary::English => match field {
                Field::Id => "id",
                Field::ExternalId => "externalid",
                Field::Version => "version",
                Field::Name => "name",
                Field::Summary => "summary",
                Field::Importance => "importance",
                Field::Preconditions => "preconditions",
                Field::StepNumber => "step_number",
                Field::Actions => "actions",
                Field::ExpectedResults => "expected_results",
                Field::ExecutionType => "execution_type",
                Field::EstimatedDuration => "estimated_exec_duration",
                Field::Status => "status",
                Field::Active => "active",
                Field::IsOpen => "is_open",
                Field::TestSuite => "testsuite_name",
            },
        }
    }
}

/// Column positions of a CSV source, resolved once from its header.
///
/// Required columns always have a position; optional ones are `None` when the
/// header does not contain them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularSchema {
    /// Number of columns in the header.
    pub width: usize,
    pub vocabulary: HeaderVocabulary,
    pub name: usize,
    pub version: usize,
    pub summary: usize,
    pub importance: usize,
    pub step_number: usize,
    pub actions: usize,
    pub expected_results: usize,
    pub execution_type: usize,
    pub id: Option<usize>,
    pub external_id: Option<usize>,
    pub preconditions: Option<usize>,
    pub estimated_duration: Option<usize>,
    pub status: Option<usize>,
    pub active: Option<usize>,
    pub is_open: Option<usize>,
    pub test_suite: Option<usize>,
    /// Custom field names and their columns, in header order.
    pub custom_fields: Vec<(String, usize)>,
}

impl TabularSchema {
    /// Resolves the columns of `header` against `vocabulary`.
    ///
    /// Header names must match exactly. Fails with every missing required
    /// header name when any is absent.
    ///
    /// # Arguments
    /// * `header` - The cells of the header record.
    /// * `vocabulary` - The header names to look for.
    pub fn resolve(header: &[String], vocabulary: HeaderVocabulary) -> Result<Self, SchemaError> {
        let find = |field: Field| {
            let name = vocabulary.header(field);
            header.iter().position(|h| h == name)
        };

        let missing: Vec<String> = Field::REQUIRED
            .iter()
            .filter(|f| find(**f).is_none())
            .map(|f| vocabulary.header(*f).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }
        let required = |field: Field| find(field).unwrap_or_default();

        let custom_fields = header
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                h.strip_prefix(CUSTOM_FIELD_PREFIX)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), idx))
            })
            .collect();

        Ok(TabularSchema {
            width: header.len(),
            vocabulary,
            name: required(Field::Name),
            version: required(Field::Version),
            summary: required(Field::Summary),
            importance: required(Field::Importance),
            step_number: required(Field::StepNumber),
            actions: required(Field::Actions),
            expected_results: required(Field::ExpectedResults),
            execution_type: required(Field::ExecutionType),
            id: find(Field::Id),
            external_id: find(Field::ExternalId),
            preconditions: find(Field::Preconditions),
            estimated_duration: find(Field::EstimatedDuration),
            status: find(Field::Status),
            active: find(Field::Active),
            is_open: find(Field::IsOpen),
            test_suite: find(Field::TestSuite),
            custom_fields,
        })
    }

    /// The column of `field`, if the source has one.
    pub fn position(&self, field: Field) -> Option<usize> {
        match field {
            Field::Name => Some(self.name),
            Field::Version => Some(self.version),
            Field::Summary => Some(self.summary),
            Field::Importance => Some(self.importance),
            Field::StepNumber => Some(self.step_number),
            Field::Actions => Some(self.actions),
            Field::ExpectedResults => Some(self.expected_results),
            Field::ExecutionType => Some(self.execution_type),
            Field::Id => self.id,
            Field::ExternalId => self.external_id,
            Field::Preconditions => self.preconditions,
            Field::EstimatedDuration => self.estimated_duration,
            Field::Status => self.status,
            Field::Active => self.active,
            Field::IsOpen => self.is_open,
            Field::TestSuite => self.test_suite,
        }
    }
}
