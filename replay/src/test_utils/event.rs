use std::collections::HashMap;

use crate::types::{
    Cell, ColumnType, Event, EventHeader, EventPayload, EventType, IncidentEvent, IncidentType,
    QueryEvent, RotateEvent, RowImage, RowsEvent, RowsEventKind, RowsEventVersion, TableId,
    TableMapEvent, XidEvent,
};

/// Position of the first event in a binlog file, after the magic header.
pub const FIRST_EVENT_POSITION: u64 = 4;

/// Size of the common event header.
const HEADER_LENGTH: u32 = 19;

/// Builds a stream of events with consistent positions.
///
/// Each appended event starts where the previous one ended, so `next_position` and
/// `event_length` always agree with the stream order.
#[derive(Debug, Clone)]
pub struct EventStreamBuilder {
    position: u64,
    timestamp: u32,
    events: Vec<Event>,
}

impl Default for EventStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStreamBuilder {
    pub fn new() -> Self {
        Self::starting_at(FIRST_EVENT_POSITION)
    }

    pub fn starting_at(position: u64) -> Self {
        Self {
            position,
            timestamp: 1_700_000_000,
            events: Vec::new(),
        }
    }

    /// Appends an event with the given payload and body length.
    pub fn event(mut self, payload: EventPayload, body_length: u32) -> Self {
        let event_length = HEADER_LENGTH + body_length;
        let next_position = self.position + u64::from(event_length);
        let header = EventHeader {
            timestamp: self.timestamp,
            server_id: 1,
            event_length,
            next_position,
            flags: 0,
        };

        self.events.push(Event::new(header, payload));
        self.position = next_position;
        self.timestamp += 1;
        self
    }

    pub fn query(self, schema: &str, query: &str) -> Self {
        let body_length = 13 + schema.len() as u32 + 1 + query.len() as u32;
        self.event(
            EventPayload::Query(QueryEvent {
                thread_id: 1,
                exec_time: 0,
                error_code: 0,
                schema: schema.to_string(),
                query: query.to_string(),
            }),
            body_length,
        )
    }

    pub fn begin(self) -> Self {
        self.query("", "BEGIN")
    }

    pub fn xid(self, xid: u64) -> Self {
        self.event(EventPayload::Xid(XidEvent { xid }), 12)
    }

    pub fn rotate(self, next_binlog: &str, position: u64) -> Self {
        let body_length = 8 + next_binlog.len() as u32;
        self.event(
            EventPayload::Rotate(RotateEvent {
                next_binlog: next_binlog.to_string(),
                position,
            }),
            body_length,
        )
    }

    pub fn table_map(
        self,
        table_id: u64,
        schema: &str,
        table: &str,
        column_types: Vec<ColumnType>,
    ) -> Self {
        let body_length = 10 + schema.len() as u32 + table.len() as u32 + 2 * column_types.len() as u32;
        self.event(
            EventPayload::TableMap(TableMapEvent {
                table_id: TableId::new(table_id),
                schema: schema.to_string(),
                table: table.to_string(),
                column_types,
                flags: 1,
            }),
            body_length,
        )
    }

    /// Appends a v1 rows event. For updates, `images` are `before, after` pairs laid out flat.
    pub fn rows(self, table_id: u64, kind: RowsEventKind, images: Vec<Vec<Cell>>) -> Self {
        self.rows_with_version(table_id, kind, RowsEventVersion::V1, images)
    }

    pub fn rows_with_version(
        self,
        table_id: u64,
        kind: RowsEventKind,
        version: RowsEventVersion,
        images: Vec<Vec<Cell>>,
    ) -> Self {
        let cells: usize = images.iter().map(Vec::len).sum();
        let body_length = 10 + 8 * cells as u32;
        self.event(
            EventPayload::Rows(RowsEvent {
                table_id: TableId::new(table_id),
                kind,
                version,
                flags: 0,
                images: images.into_iter().map(RowImage::new).collect(),
            }),
            body_length,
        )
    }

    pub fn incident(self, code: u16, message: &str) -> Self {
        let body_length = 3 + message.len() as u32;
        self.event(
            EventPayload::Incident(IncidentEvent {
                incident: IncidentType::from_code(code),
                message: message.to_string(),
            }),
            body_length,
        )
    }

    pub fn unsupported(self, event_type: EventType) -> Self {
        self.event(EventPayload::Unsupported(event_type), 8)
    }

    /// Position at which the next appended event would start.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn build(self) -> Vec<Event> {
        self.events
    }
}

/// Groups events by their [`EventType`].
pub fn group_events_by_type(events: &[Event]) -> HashMap<EventType, Vec<Event>> {
    let mut grouped = HashMap::new();
    for event in events {
        grouped
            .entry(event.event_type())
            .or_insert_with(Vec::new)
            .push(event.clone());
    }

    grouped
}

/// Returns `true` when every `(type, count)` condition holds exactly.
pub fn check_events_count(events: &[Event], conditions: Vec<(EventType, u64)>) -> bool {
    let grouped_events = group_events_by_type(events);

    conditions.into_iter().all(|(event_type, count)| {
        grouped_events
            .get(&event_type)
            .map(|inner| inner.len() == count as usize)
            .unwrap_or(count == 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_chain() {
        let events = EventStreamBuilder::new().begin().xid(1).build();

        assert_eq!(events[0].header.start_position(), FIRST_EVENT_POSITION);
        assert_eq!(
            events[1].header.start_position(),
            events[0].header.next_position
        );
    }

    #[test]
    fn test_check_events_count() {
        let events = EventStreamBuilder::new().begin().xid(1).xid(2).build();

        assert!(check_events_count(
            &events,
            vec![
                (EventType::Query, 1),
                (EventType::Xid, 2),
                (EventType::Incident, 0)
            ]
        ));
        assert!(!check_events_count(&events, vec![(EventType::Xid, 1)]));
    }
}
