//! Readers that turn a CSV sheet or TestLink XML into a `TestSpecification`.

pub mod builder;
pub mod csv;
pub mod rows;
pub mod schema;
pub mod testlink_xml;
