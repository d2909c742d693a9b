use config::shared::{FormatterConfig, QuotePolicy};

use crate::conversions::text::{CellConverter, CellText, DefaultCellConverter};
use crate::error::ReplayResult;
use crate::types::{Cell, ColumnType};

/// Renders column values as they appear in a reconstructed statement.
///
/// Nulls become the configured null literal, never quoted. Values of variable-length text and
/// blob columns are wrapped in single quotes, every other type is written bare. Literals built
/// by the converter, such as hex literals for binary data, are never quoted.
#[derive(Debug, Clone)]
pub struct ValueFormatter<C = DefaultCellConverter> {
    converter: C,
    quote_policy: QuotePolicy,
    null_literal: String,
}

impl ValueFormatter {
    /// Creates a formatter using the [`DefaultCellConverter`].
    pub fn new(config: &FormatterConfig) -> Self {
        Self::with_converter(config, DefaultCellConverter)
    }
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(&FormatterConfig::default())
    }
}

impl<C> ValueFormatter<C>
where
    C: CellConverter,
{
    pub fn with_converter(config: &FormatterConfig, converter: C) -> Self {
        Self {
            converter,
            quote_policy: config.quote_policy,
            null_literal: config.null_literal.clone(),
        }
    }

    /// Formats one cell of a column with the given type.
    pub fn format(&self, column_type: ColumnType, cell: &Cell) -> ReplayResult<String> {
        if cell.is_null() {
            return Ok(self.null_literal.clone());
        }

        match self.converter.to_text(column_type, cell)? {
            CellText::Plain(text) if column_type.is_text() => Ok(self.quote(&text)),
            CellText::Plain(text) | CellText::Literal(text) => Ok(text),
        }
    }

    fn quote(&self, text: &str) -> String {
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('\'');
        match self.quote_policy {
            QuotePolicy::Verbatim => quoted.push_str(text),
            QuotePolicy::Escaped => {
                for c in text.chars() {
                    match c {
                        '\'' => quoted.push_str("''"),
                        '\\' => quoted.push_str("\\\\"),
                        c => quoted.push(c),
                    }
                }
            }
        }
        quoted.push('\'');

        quoted
    }
}
