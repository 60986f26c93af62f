//! Writers for the two sides of the conversion.
//!
//! `testlink_xml` renders a `TestSpecification` as TestLink import XML through
//! the element tree of `element`; `csv` flattens it back into a sheet.

pub mod csv;
pub mod element;
pub mod testlink_xml;
