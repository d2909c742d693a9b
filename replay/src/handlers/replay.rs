use std::sync::Arc;

use tracing::{debug, warn};

use crate::bail;
use crate::conversions::text::{CellConverter, DefaultCellConverter};
use crate::error::{ErrorKind, ReplayResult};
use crate::handlers::emit;
use crate::pipeline::ContentHandler;
use crate::schema::directory::TableDirectory;
use crate::sink::{Diagnostic, Output, Sink};
use crate::statement::StatementBuilder;
use crate::types::{
    Event, EventPayload, EventType, TableDefinition, TransactionEntry, TransactionRows,
};

/// Turns each collected transaction unit into statements.
///
/// Every rows entry is resolved through the table directory carried by its unit, so the last
/// table map announced for an id in the unit decides the table and column types. Failures are
/// reported per row and never stop the unit. Transaction events are always consumed, every
/// other event passes through.
#[derive(Debug)]
pub struct ReplayHandler<D, C = DefaultCellConverter> {
    builder: StatementBuilder<C>,
    sink: D,
}

impl<D> ReplayHandler<D>
where
    D: Sink,
{
    /// Creates a handler that renders values with the default formatting.
    pub fn new(sink: D) -> Self {
        Self::with_builder(StatementBuilder::default(), sink)
    }
}

impl<D, C> ReplayHandler<D, C>
where
    D: Sink,
    C: CellConverter,
{
    pub fn with_builder(builder: StatementBuilder<C>, sink: D) -> Self {
        Self { builder, sink }
    }

    fn replay_rows(&self, entry: &TransactionRows, directory: &TableDirectory) {
        let table = match resolve_table(entry, directory) {
            Ok(table) => table,
            Err(err) => {
                warn!(table_id = %entry.rows.table_id, "rows event for an unregistered table id");
                emit(&self.sink, Diagnostic::from_error(&err));
                return;
            }
        };

        let results = self.builder.reconstruct(
            entry.rows.kind,
            &table.name,
            &table.column_types,
            &entry.rows.images,
        );
        for result in results {
            match result {
                Ok(statement) => emit(&self.sink, Output::Statement(statement)),
                Err(err) => {
                    warn!(table = %table.name, error = %err.summary(), "failed to replay row");
                    emit(&self.sink, Diagnostic::from_error(&err));
                }
            }
        }
    }
}

/// Rows events seen before any table map for their id stay unresolved, even when the id is
/// announced later in the unit.
fn resolve_table(
    entry: &TransactionRows,
    directory: &TableDirectory,
) -> ReplayResult<Arc<TableDefinition>> {
    match directory.lookup(&entry.rows.table_id) {
        Some(table) if entry.registered => Ok(table),
        _ => bail!(
            ErrorKind::UnresolvedTable,
            "Table id was not registered by any preceding table map event",
            entry.rows.table_id
        ),
    }
}

impl<D, C> ContentHandler for ReplayHandler<D, C>
where
    D: Sink,
    C: CellConverter,
{
    fn process_event(&mut self, event: Event) -> Option<Event> {
        let header = event.header;
        let transaction = match event.payload {
            EventPayload::Transaction(transaction) => transaction,
            payload => return Some(Event::new(header, payload)),
        };

        debug!(
            "Replay: Event type: [{}] length: {} next pos: {}",
            EventType::UserDefined,
            header.event_length,
            header.next_position
        );

        for entry in &transaction.entries {
            match entry {
                TransactionEntry::Rows(rows) => {
                    self.replay_rows(rows, &transaction.table_directory)
                }
                TransactionEntry::TableMap(table_map) => {
                    debug!(
                        table_id = %table_map.table_id,
                        schema = %table_map.schema,
                        table = %table_map.table,
                        "table map"
                    );
                }
            }
        }

        None
    }
}
