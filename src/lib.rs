pub mod cli;
pub mod error;
pub mod generator;
pub mod parser;
pub mod rich_text;
pub mod testcase;

use parser::schema::{Field, HeaderVocabulary, CUSTOM_FIELD_PREFIX};

/// Lines describing the CSV columns understood in `vocabulary`.
pub fn column_listing(vocabulary: HeaderVocabulary) -> Vec<String> {
    let names = |fields: &[Field]| {
        fields
            .iter()
            .map(|f| vocabulary.header(*f))
            .collect::<Vec<_>>()
            .join(", ")
    };
    vec![
        format!("required columns: {}", names(&Field::REQUIRED[..])),
        format!("optional columns: {}", names(&Field::OPTIONAL[..])),
        format!("custom fields:    {}<name>", CUSTOM_FIELD_PREFIX),
    ]
}
