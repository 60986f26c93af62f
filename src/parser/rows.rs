use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{Diagnostic, RowShapeError};
use crate::parser::schema::TabularSchema;

/// One data record of a CSV source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line of the record in the source; the header is line 1.
    pub line: usize,
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(line: usize, cells: Vec<String>) -> Self {
        Row { line, cells }
    }

    /// The trimmed value at `column`, or `""` when the record is shorter.
    pub fn get(&self, column: usize) -> &str {
        self.cells.get(column).map(|s| s.trim()).unwrap_or("")
    }

    /// Like [`Row::get`] for an optional column; absent columns read as `""`.
    pub fn get_opt(&self, column: Option<usize>) -> &str {
        column.map(|c| self.get(c)).unwrap_or("")
    }

    /// The trimmed value at `column`, or `None` when it is absent or blank.
    pub fn non_empty(&self, column: Option<usize>) -> Option<&str> {
        Some(self.get_opt(column)).filter(|v| !v.is_empty())
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Rows grouped per test case, in first-seen order, plus the problems met
/// while grouping.
#[derive(Debug, Default)]
pub struct RowGroups {
    pub groups: IndexMap<String, Vec<Row>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Folds CSV records into per-test-case groups.
///
/// A record joins the group of its test case ID (`ID_<id>`) when it has one,
/// otherwise the group of its name (`NAME_<name>`). Group order is the order in
/// which keys first appear, and rows keep their source order inside a group.
pub struct RowGrouper<'a> {
    schema: &'a TabularSchema,
}

impl<'a> RowGrouper<'a> {
    pub fn new(schema: &'a TabularSchema) -> Self {
        RowGrouper { schema }
    }

    /// The grouping key of `row`, or `None` when it carries neither an ID nor
    /// a name.
    pub fn group_key(&self, row: &Row) -> Option<String> {
        if let Some(id) = row.non_empty(self.schema.id) {
            return Some(format!("ID_{}", id));
        }
        row.non_empty(Some(self.schema.name))
            .map(|name| format!("NAME_{}", name))
    }

    pub fn group<I>(&self, rows: I) -> RowGroups
    where
        I: IntoIterator<Item = Row>,
    {
        let mut result = RowGroups::default();

        for row in rows {
            if row.is_blank() {
                debug!("line {}: blank record ignored", row.line);
                continue;
            }
            if row.cells.len() != self.schema.width {
                self.reject(
                    &mut result,
                    RowShapeError::ColumnCount {
                        line: row.line,
                        expected: self.schema.width,
                        found: row.cells.len(),
                    },
                );
                continue;
            }
            let Some(key) = self.group_key(&row) else {
                self.reject(&mut result, RowShapeError::Unlinked { line: row.line });
                continue;
            };
            result.groups.entry(key).or_default().push(row);
        }

        result
    }

    fn reject(&self, result: &mut RowGroups, err: RowShapeError) {
        warn!("{}", err);
        result.diagnostics.push(err.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::HeaderVocabulary;

    fn schema() -> TabularSchema {
        let header: Vec<String> = [
            "id",
            "name",
            "version",
            "summary",
            "importance",
            "execution_type",
            "step_number",
            "actions",
            "expected_results",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        TabularSchema::resolve(&header, HeaderVocabulary::English).unwrap()
    }

    fn row(line: usize, id: &str, name: &str, step: &str) -> Row {
        Row::new(
            line,
            vec![id, name, "1", "sum", "2", "1", step, "act", "exp"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    #[test]
    fn test_row_accessors() {
        let r = Row::new(2, vec![" a ".to_string(), "".to_string()]);
        assert_eq!(r.get(0), "a");
        assert_eq!(r.get(5), "");
        assert_eq!(r.get_opt(None), "");
        assert_eq!(r.non_empty(Some(1)), None);
        assert_eq!(r.non_empty(Some(0)), Some("a"));
    }

    #[test]
    fn test_group_key_prefers_id() {
        let schema = schema();
        let grouper = RowGrouper::new(&schema);
        assert_eq!(grouper.group_key(&row(2, "42", "Login", "1")), Some("ID_42".to_string()));
        assert_eq!(grouper.group_key(&row(2, " ", "Login", "1")), Some("NAME_Login".to_string()));
        assert_eq!(grouper.group_key(&row(2, "", "", "1")), None);
    }

    #[test]
    fn test_group_preserves_first_seen_order() {
        let schema = schema();
        let grouper = RowGrouper::new(&schema);
        let rows = vec![
            row(2, "", "B", "1"),
            row(3, "", "A", "1"),
            row(4, "", "B", "2"),
            row(5, "7", "C", "1"),
            row(6, "", "A", "2"),
            row(7, "7", "C renamed", "2"),
        ];

        let grouped = grouper.group(rows.clone());
        let keys: Vec<_> = grouped.groups.keys().cloned().collect();
        assert_eq!(keys, vec!["NAME_B", "NAME_A", "ID_7"]);
        let b_lines: Vec<_> = grouped.groups["NAME_B"].iter().map(|r| r.line).collect();
        assert_eq!(b_lines, vec![2, 4]);
        let c_lines: Vec<_> = grouped.groups["ID_7"].iter().map(|r| r.line).collect();
        assert_eq!(c_lines, vec![5, 7]);
        assert!(grouped.diagnostics.is_empty());

        // Same input, same output order.
        for _ in 0..3 {
            let again: Vec<_> = grouper.group(rows.clone()).groups.keys().cloned().collect();
            assert_eq!(again, keys);
        }
    }

    #[test]
    fn test_group_drops_bad_rows() {
        let schema = schema();
        let grouper = RowGrouper::new(&schema);
        let short = Row::new(3, vec!["".to_string(), "Short".to_string()]);
        let blank = Row::new(4, vec![String::new(); 9]);
        let rows = vec![row(2, "", "A", "1"), short, blank, row(5, "", "", "1")];

        let grouped = grouper.group(rows);
        assert_eq!(grouped.groups.len(), 1);
        assert_eq!(
            grouped.diagnostics,
            vec![
                Diagnostic::Row(RowShapeError::ColumnCount {
                    line: 3,
                    expected: 9,
                    found: 2
                }),
                Diagnostic::Row(RowShapeError::Unlinked { line: 5 }),
            ]
        );
    }
}
