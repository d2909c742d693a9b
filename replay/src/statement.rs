//! Reconstruction of row-change statements from row images.
//!
//! Columns are referenced by 0-based position because table map events carry column types but
//! no column names.

use std::fmt;

use crate::bail;
use crate::conversions::text::{CellConverter, DefaultCellConverter};
use crate::conversions::value::ValueFormatter;
use crate::error::{ErrorKind, ReplayResult};
use crate::types::{ColumnType, RowImage, RowsEventKind, TableName};

/// Kind of a reconstructed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
}

impl From<RowsEventKind> for StatementKind {
    fn from(kind: RowsEventKind) -> Self {
        match kind {
            RowsEventKind::Write => StatementKind::Insert,
            RowsEventKind::Update => StatementKind::Update,
            RowsEventKind::Delete => StatementKind::Delete,
        }
    }
}

/// A reconstructed statement for a single row change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub table: TableName,
    pub text: String,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builds `INSERT`, `UPDATE` and `DELETE` statements for row images of one table.
#[derive(Debug, Clone)]
pub struct StatementBuilder<C = DefaultCellConverter> {
    formatter: ValueFormatter<C>,
}

impl Default for StatementBuilder {
    fn default() -> Self {
        Self::new(ValueFormatter::default())
    }
}

impl<C> StatementBuilder<C>
where
    C: CellConverter,
{
    pub fn new(formatter: ValueFormatter<C>) -> Self {
        Self { formatter }
    }

    /// Reconstructs every row of a rows event.
    ///
    /// Returns one result per row, or per before/after pair for updates, so a failing row does
    /// not prevent the others from being rendered. An update with an unpaired image yields a
    /// single [`ErrorKind::ProtocolShape`] error and no statements.
    pub fn reconstruct(
        &self,
        kind: RowsEventKind,
        table: &TableName,
        column_types: &[ColumnType],
        images: &[RowImage],
    ) -> Vec<ReplayResult<Statement>> {
        match kind {
            RowsEventKind::Write => images
                .iter()
                .map(|image| self.insert(table, column_types, image))
                .collect(),
            RowsEventKind::Delete => images
                .iter()
                .map(|image| self.delete(table, column_types, image))
                .collect(),
            RowsEventKind::Update => {
                if images.len() % 2 != 0 {
                    return vec![Err(crate::replay_error!(
                        ErrorKind::ProtocolShape,
                        "Update rows event has an unpaired row image",
                        format!("{} images for table {table}", images.len())
                    ))];
                }

                images
                    .chunks_exact(2)
                    .map(|pair| self.update(table, column_types, &pair[0], &pair[1]))
                    .collect()
            }
        }
    }

    /// `INSERT INTO <t> VALUES (<v0>, <v1>, ...)`
    pub fn insert(
        &self,
        table: &TableName,
        column_types: &[ColumnType],
        image: &RowImage,
    ) -> ReplayResult<Statement> {
        let values = self.render(column_types, image)?;
        let text = format!("INSERT INTO {table} VALUES ({})", values.join(", "));

        Ok(self.statement(StatementKind::Insert, table, text))
    }

    /// `UPDATE <t> SET 0= <a0>, ... WHERE 0= <b0> AND ... LIMIT 1`
    pub fn update(
        &self,
        table: &TableName,
        column_types: &[ColumnType],
        before: &RowImage,
        after: &RowImage,
    ) -> ReplayResult<Statement> {
        let before = self.render(column_types, before)?;
        let after = self.render(column_types, after)?;
        let text = format!(
            "UPDATE {table} SET {} WHERE {} LIMIT 1",
            positional(&after, ", "),
            positional(&before, " AND ")
        );

        Ok(self.statement(StatementKind::Update, table, text))
    }

    /// `DELETE FROM <t> WHERE 0= <v0> AND ... LIMIT 1`
    pub fn delete(
        &self,
        table: &TableName,
        column_types: &[ColumnType],
        image: &RowImage,
    ) -> ReplayResult<Statement> {
        let values = self.render(column_types, image)?;
        let text = format!(
            "DELETE FROM {table} WHERE {} LIMIT 1",
            positional(&values, " AND ")
        );

        Ok(self.statement(StatementKind::Delete, table, text))
    }

    fn render(&self, column_types: &[ColumnType], image: &RowImage) -> ReplayResult<Vec<String>> {
        if image.len() != column_types.len() {
            bail!(
                ErrorKind::ConversionError,
                "Row image does not match the table definition",
                format!(
                    "{} values for {} columns",
                    image.len(),
                    column_types.len()
                )
            );
        }

        column_types
            .iter()
            .zip(image.values.iter())
            .map(|(column_type, cell)| self.formatter.format(*column_type, cell))
            .collect()
    }

    fn statement(&self, kind: StatementKind, table: &TableName, text: String) -> Statement {
        Statement {
            kind,
            table: table.clone(),
            text,
        }
    }
}

/// Joins values as `0= v0<separator>1= v1...`.
fn positional(values: &[String], separator: &str) -> String {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| format!("{index}= {value}"))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use insta::assert_snapshot;

    fn builder() -> StatementBuilder {
        StatementBuilder::default()
    }

    fn table() -> TableName {
        TableName::new("db1", "t1")
    }

    fn columns() -> Vec<ColumnType> {
        vec![ColumnType::Long, ColumnType::Varchar]
    }

    fn image(id: i64, name: Option<&str>) -> RowImage {
        RowImage::new(vec![Cell::I64(id), Cell::from(name)])
    }

    #[test]
    fn test_insert() {
        let statement = builder()
            .insert(&table(), &columns(), &image(7, Some("hello")))
            .unwrap();

        assert_eq!(statement.kind, StatementKind::Insert);
        assert_snapshot!(statement, @"INSERT INTO db1.t1 VALUES (7, 'hello')");
    }

    #[test]
    fn test_update_uses_after_for_set_and_before_for_where() {
        let statement = builder()
            .update(
                &table(),
                &columns(),
                &image(7, Some("hello")),
                &image(7, Some("world")),
            )
            .unwrap();

        assert_snapshot!(
            statement,
            @"UPDATE db1.t1 SET 0= 7, 1= 'world' WHERE 0= 7 AND 1= 'hello' LIMIT 1"
        );
    }

    #[test]
    fn test_delete_with_null() {
        let statement = builder()
            .delete(&table(), &columns(), &image(7, None))
            .unwrap();

        assert_snapshot!(statement, @"DELETE FROM db1.t1 WHERE 0= 7 AND 1= NULL LIMIT 1");
    }

    #[test]
    fn test_cardinality_mismatch_is_a_conversion_error() {
        let err = builder()
            .insert(&table(), &columns(), &RowImage::new(vec![Cell::I64(1)]))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
        assert_eq!(
            err.summary(),
            "Row image does not match the table definition: 1 values for 2 columns"
        );
    }

    #[test]
    fn test_reconstruct_pairs_update_images() {
        let images = vec![
            image(1, Some("a")),
            image(1, Some("b")),
            image(2, Some("c")),
            image(2, None),
        ];
        let statements = builder()
            .reconstruct(RowsEventKind::Update, &table(), &columns(), &images)
            .into_iter()
            .map(|result| result.unwrap().text)
            .collect::<Vec<_>>();

        assert_eq!(
            statements,
            vec![
                "UPDATE db1.t1 SET 0= 1, 1= 'b' WHERE 0= 1 AND 1= 'a' LIMIT 1",
                "UPDATE db1.t1 SET 0= 2, 1= NULL WHERE 0= 2 AND 1= 'c' LIMIT 1",
            ]
        );
    }

    #[test]
    fn test_reconstruct_rejects_unpaired_update_image() {
        let images = vec![image(1, Some("a")), image(1, Some("b")), image(2, Some("c"))];
        let results =
            builder().reconstruct(RowsEventKind::Update, &table(), &columns(), &images);

        assert_eq!(results.len(), 1);
        let err = results.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolShape);
    }

    #[test]
    fn test_reconstruct_is_row_granular() {
        let images = vec![
            image(1, Some("a")),
            RowImage::new(vec![Cell::from("not a number"), Cell::from("b")]),
            image(3, Some("c")),
        ];
        let results =
            builder().reconstruct(RowsEventKind::Write, &table(), &columns(), &images);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::ConversionError
        );
        assert_eq!(
            results[2].as_ref().unwrap().text,
            "INSERT INTO db1.t1 VALUES (3, 'c')"
        );
    }
}
