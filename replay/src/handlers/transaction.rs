use std::mem;

use tracing::{debug, warn};

use crate::error::{ErrorKind, ReplayError};
use crate::handlers::emit;
use crate::pipeline::ContentHandler;
use crate::replay_error;
use crate::schema::directory::TableDirectory;
use crate::sink::{Diagnostic, Sink};
use crate::types::{
    Event, EventHeader, EventPayload, QueryEvent, RowsEvent, TransactionEntry, TransactionEvent,
    TransactionRows,
};

/// Events buffered since the last begin marker.
#[derive(Debug)]
struct TransactionUnit {
    begin_position: u64,
    entries: Vec<TransactionEntry>,
}

#[derive(Debug)]
enum AggregatorState {
    Idle,
    Collecting(TransactionUnit),
    /// The current unit was abandoned, events are dropped until the next boundary.
    Discarding,
}

/// Groups the table map and rows events between a begin and an end marker into one
/// [`EventPayload::Transaction`] event.
///
/// The begin marker is a `BEGIN` query. The end marker is an `Xid` event or a `COMMIT` query.
/// Each rows event records whether its table id was announced earlier in the unit. The unit
/// carries its table directory, which is consulted when the unit is replayed. Events outside a
/// unit pass through untouched.
#[derive(Debug)]
pub struct TransactionAggregator<D> {
    state: AggregatorState,
    directory: TableDirectory,
    sink: D,
}

impl<D> TransactionAggregator<D>
where
    D: Sink,
{
    pub fn new(sink: D) -> Self {
        Self {
            state: AggregatorState::Idle,
            directory: TableDirectory::new(),
            sink,
        }
    }

    /// Returns `true` while a unit is being collected.
    pub fn is_collecting(&self) -> bool {
        matches!(self.state, AggregatorState::Collecting(_))
    }

    fn begin(&mut self, header: &EventHeader) {
        if let AggregatorState::Collecting(unit) = &self.state {
            self.report(replay_error!(
                ErrorKind::ProtocolShape,
                "Transaction unit is missing its end marker",
                format!(
                    "unit started at {} dropped with {} events when a new unit began at {}",
                    unit.begin_position,
                    unit.entries.len(),
                    header.start_position()
                )
            ));
        }

        self.directory.clear();
        self.state = AggregatorState::Collecting(TransactionUnit {
            begin_position: header.start_position(),
            entries: Vec::new(),
        });
    }

    fn collect(&mut self, event: Event) -> Option<Event> {
        let header = event.header;
        match event.payload {
            EventPayload::TableMap(table_map) => {
                self.directory.register(table_map.definition());
                self.push(TransactionEntry::TableMap(table_map));
                None
            }
            EventPayload::Rows(rows) => {
                self.collect_rows(header, rows);
                None
            }
            EventPayload::Xid(xid) => Some(self.finish(header, Some(xid.xid))),
            EventPayload::Query(query) if query.is_commit() => Some(self.finish(header, None)),
            EventPayload::Query(query) if query.is_rollback() => {
                self.rollback(&query);
                None
            }
            payload => Some(Event::new(header, payload)),
        }
    }

    fn collect_rows(&mut self, header: EventHeader, rows: RowsEvent) {
        if rows.has_unpaired_update_image() {
            self.report(replay_error!(
                ErrorKind::ProtocolShape,
                "Update rows event has an unpaired row image",
                format!(
                    "{} images for table id {} at position {}",
                    rows.images.len(),
                    rows.table_id,
                    header.start_position()
                )
            ));
            self.state = AggregatorState::Discarding;
            return;
        }

        let registered = self.directory.lookup(&rows.table_id).is_some();
        if !registered {
            debug!(table_id = %rows.table_id, "rows event for an unregistered table id");
        }

        self.push(TransactionEntry::Rows(TransactionRows {
            header,
            rows,
            registered,
        }));
    }

    fn push(&mut self, entry: TransactionEntry) {
        if let AggregatorState::Collecting(unit) = &mut self.state {
            unit.entries.push(entry);
        }
    }

    fn finish(&mut self, end: EventHeader, xid: Option<u64>) -> Event {
        let state = mem::replace(&mut self.state, AggregatorState::Idle);
        let (begin_position, entries) = match state {
            AggregatorState::Collecting(unit) => (unit.begin_position, unit.entries),
            _ => (end.start_position(), Vec::new()),
        };

        debug!(
            begin_position,
            next_position = end.next_position,
            entries = entries.len(),
            "transaction unit complete"
        );

        let header = EventHeader {
            timestamp: end.timestamp,
            server_id: end.server_id,
            event_length: end.event_length,
            next_position: end.next_position,
            flags: 0,
        };
        let transaction = TransactionEvent {
            begin_position,
            xid,
            entries,
            table_directory: mem::take(&mut self.directory),
        };

        Event::new(header, EventPayload::Transaction(transaction))
    }

    fn rollback(&mut self, query: &QueryEvent) {
        if let AggregatorState::Collecting(unit) = &self.state {
            debug!(
                begin_position = unit.begin_position,
                entries = unit.entries.len(),
                query = %query.query,
                "transaction unit rolled back"
            );
        }

        self.directory.clear();
        self.state = AggregatorState::Idle;
    }

    fn report(&self, err: ReplayError) {
        warn!(error = %err.summary(), "abandoning transaction unit");
        emit(&self.sink, Diagnostic::from_error(&err));
    }
}

impl<D> ContentHandler for TransactionAggregator<D>
where
    D: Sink,
{
    fn process_event(&mut self, event: Event) -> Option<Event> {
        if event.as_query().is_some_and(QueryEvent::is_begin) {
            self.begin(&event.header);
            return None;
        }

        match self.state {
            AggregatorState::Idle => Some(event),
            AggregatorState::Collecting(_) => self.collect(event),
            AggregatorState::Discarding => {
                if ends_unit(&event) {
                    self.state = AggregatorState::Idle;
                    return None;
                }

                match event.payload {
                    EventPayload::TableMap(_) | EventPayload::Rows(_) => None,
                    _ => Some(event),
                }
            }
        }
    }

    fn shutdown(&mut self) {
        if let AggregatorState::Collecting(unit) = &self.state {
            self.report(replay_error!(
                ErrorKind::ProtocolShape,
                "Stream stopped inside a transaction unit",
                format!(
                    "unit started at {} dropped with {} events",
                    unit.begin_position,
                    unit.entries.len()
                )
            ));
        }

        self.directory.clear();
        self.state = AggregatorState::Idle;
    }
}

/// Returns `true` for an `Xid` event or a `COMMIT` or `ROLLBACK` query.
fn ends_unit(event: &Event) -> bool {
    match &event.payload {
        EventPayload::Xid(_) => true,
        EventPayload::Query(query) => query.is_commit() || query.is_rollback(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DiagnosticKind;
    use crate::sink::memory::MemorySink;
    use crate::test_utils::event::EventStreamBuilder;
    use crate::types::{Cell, ColumnType, RowsEventKind, TableId};

    fn dispatch_all(
        aggregator: &mut TransactionAggregator<MemorySink>,
        events: Vec<Event>,
    ) -> Vec<Event> {
        events
            .into_iter()
            .filter_map(|event| aggregator.process_event(event))
            .collect()
    }

    fn transaction(event: &Event) -> &TransactionEvent {
        match &event.payload {
            EventPayload::Transaction(transaction) => transaction,
            other => panic!("expected a transaction, got {other:?}"),
        }
    }

    #[test]
    fn test_unit_is_emitted_once_at_end_marker() {
        let sink = MemorySink::new();
        let mut aggregator = TransactionAggregator::new(sink.clone());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .rows(1, RowsEventKind::Write, vec![vec![Cell::I64(1)]])
            .xid(77)
            .build();
        let end_header = events[3].header;

        let emitted = dispatch_all(&mut aggregator, events);

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].header.event_length, end_header.event_length);
        assert_eq!(emitted[0].header.next_position, end_header.next_position);
        let unit = transaction(&emitted[0]);
        assert_eq!(unit.xid, Some(77));
        assert_eq!(unit.len(), 2);
        assert_eq!(unit.table_directory.len(), 1);
        assert!(unit.rows().all(|rows| rows.registered));
        assert!(sink.outputs().is_empty());
    }

    #[test]
    fn test_commit_query_ends_unit() {
        let mut aggregator = TransactionAggregator::new(MemorySink::new());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .query("db1", "commit")
            .build();

        let emitted = dispatch_all(&mut aggregator, events);
        assert_eq!(emitted.len(), 1);
        assert_eq!(transaction(&emitted[0]).xid, None);
    }

    #[test]
    fn test_events_outside_a_unit_pass_through() {
        let mut aggregator = TransactionAggregator::new(MemorySink::new());
        let events = EventStreamBuilder::new()
            .query("db1", "CREATE TABLE t1 (a INT)")
            .rotate("binlog.000002", 4)
            .build();

        let emitted = dispatch_all(&mut aggregator, events.clone());
        assert_eq!(emitted, events);
        assert!(!aggregator.is_collecting());
    }

    #[test]
    fn test_directory_does_not_leak_between_units() {
        let mut aggregator = TransactionAggregator::new(MemorySink::new());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .xid(1)
            .begin()
            .rows(1, RowsEventKind::Delete, vec![vec![Cell::I64(1)]])
            .xid(2)
            .build();

        let emitted = dispatch_all(&mut aggregator, events);
        let second = transaction(&emitted[1]);
        assert!(second.table_directory.is_empty());
        assert!(second.rows().all(|rows| !rows.registered));
    }

    #[test]
    fn test_rows_are_registered_only_after_a_table_map() {
        let mut aggregator = TransactionAggregator::new(MemorySink::new());
        let events = EventStreamBuilder::new()
            .begin()
            .rows(1, RowsEventKind::Write, vec![vec![Cell::I64(1)]])
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .rows(1, RowsEventKind::Write, vec![vec![Cell::I64(2)]])
            .table_map(1, "db1", "t2", vec![ColumnType::Long])
            .xid(3)
            .build();

        let emitted = dispatch_all(&mut aggregator, events);
        let unit = transaction(&emitted[0]);
        let registered = unit.rows().map(|rows| rows.registered).collect::<Vec<_>>();
        assert_eq!(registered, vec![false, true]);

        // The directory keeps the last definition announced for the id.
        let table = unit.table_directory.lookup(&TableId::new(1)).unwrap();
        assert_eq!(table.name.to_string(), "db1.t2");
    }

    #[test]
    fn test_unpaired_update_abandons_unit_until_next_boundary() {
        let sink = MemorySink::new();
        let mut aggregator = TransactionAggregator::new(sink.clone());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .rows(1, RowsEventKind::Update, vec![vec![Cell::I64(1)]])
            .rows(1, RowsEventKind::Write, vec![vec![Cell::I64(2)]])
            .xid(4)
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .xid(5)
            .build();

        let emitted = dispatch_all(&mut aggregator, events);

        assert_eq!(emitted.len(), 1);
        assert_eq!(transaction(&emitted[0]).xid, Some(5));
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ProtocolShape);
        assert!(
            diagnostics[0]
                .message
                .starts_with("Transaction log event error: Update rows event has an unpaired row image")
        );
    }

    #[test]
    fn test_missing_end_marker_starts_new_unit() {
        let sink = MemorySink::new();
        let mut aggregator = TransactionAggregator::new(sink.clone());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .begin()
            .table_map(2, "db1", "t2", vec![ColumnType::Long])
            .xid(6)
            .build();

        let emitted = dispatch_all(&mut aggregator, events);

        assert_eq!(emitted.len(), 1);
        let unit = transaction(&emitted[0]);
        assert!(unit.table_directory.lookup(&TableId::new(1)).is_none());
        assert!(unit.table_directory.lookup(&TableId::new(2)).is_some());
        assert_eq!(sink.diagnostics()[0].kind, DiagnosticKind::ProtocolShape);
    }

    #[test]
    fn test_rollback_drops_unit_silently() {
        let sink = MemorySink::new();
        let mut aggregator = TransactionAggregator::new(sink.clone());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .rows(1, RowsEventKind::Write, vec![vec![Cell::I64(1)]])
            .query("db1", "ROLLBACK")
            .build();

        assert!(dispatch_all(&mut aggregator, events).is_empty());
        assert!(!aggregator.is_collecting());
        assert!(sink.outputs().is_empty());
    }

    #[test]
    fn test_incident_inside_unit_passes_through() {
        let mut aggregator = TransactionAggregator::new(MemorySink::new());
        let events = EventStreamBuilder::new()
            .begin()
            .incident(1, "lost events")
            .xid(7)
            .build();

        let emitted = dispatch_all(&mut aggregator, events);
        assert_eq!(emitted.len(), 2);
        assert!(matches!(emitted[0].payload, EventPayload::Incident(_)));
    }

    #[test]
    fn test_shutdown_reports_unfinished_unit() {
        let sink = MemorySink::new();
        let mut aggregator = TransactionAggregator::new(sink.clone());
        let events = EventStreamBuilder::new()
            .begin()
            .table_map(1, "db1", "t1", vec![ColumnType::Long])
            .build();

        assert!(dispatch_all(&mut aggregator, events).is_empty());
        aggregator.shutdown();

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(
            diagnostics[0]
                .message
                .contains("Stream stopped inside a transaction unit")
        );
        assert!(!aggregator.is_collecting());
    }
}
