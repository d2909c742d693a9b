use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ColumnType, RowsEvent, RowsEventKind, RowsEventVersion, TableDefinition};
use crate::types::{TableId, TableName, TransactionEvent};

/// Common header carried by every binlog event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventHeader {
    /// Seconds since the epoch at which the statement began executing on the server.
    #[serde(default)]
    pub timestamp: u32,
    #[serde(default)]
    pub server_id: u32,
    /// Size of the event in bytes, header included.
    pub event_length: u32,
    /// Position of the next event in the current binlog file.
    pub next_position: u64,
    #[serde(default)]
    pub flags: u16,
}

impl EventHeader {
    pub fn new(event_length: u32, next_position: u64) -> Self {
        Self {
            event_length,
            next_position,
            ..Default::default()
        }
    }

    /// Position at which this event starts in the current binlog file.
    pub fn start_position(&self) -> u64 {
        self.next_position
            .saturating_sub(u64::from(self.event_length))
    }
}

/// A statement logged in statement format, including `BEGIN` and `COMMIT` markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEvent {
    #[serde(default)]
    pub thread_id: u32,
    #[serde(default)]
    pub exec_time: u32,
    #[serde(default)]
    pub error_code: u16,
    /// Default database at the time the statement ran.
    #[serde(default)]
    pub schema: String,
    pub query: String,
}

impl QueryEvent {
    /// Returns `true` if the statement is `BEGIN`, ignoring case and surrounding whitespace.
    pub fn is_begin(&self) -> bool {
        self.query.trim().eq_ignore_ascii_case("BEGIN")
    }

    /// Returns `true` if the statement is `COMMIT`, ignoring case and surrounding whitespace.
    pub fn is_commit(&self) -> bool {
        self.query.trim().eq_ignore_ascii_case("COMMIT")
    }

    /// Returns `true` if the statement is `ROLLBACK`, ignoring case and surrounding whitespace.
    pub fn is_rollback(&self) -> bool {
        self.query.trim().eq_ignore_ascii_case("ROLLBACK")
    }
}

/// Announces the binlog file and position the stream continues from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateEvent {
    pub next_binlog: String,
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptionEvent {
    pub binlog_version: u16,
    pub server_version: String,
}

/// Commit marker of a transaction on a transactional storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XidEvent {
    pub xid: u64,
}

/// Binds a table id to a qualified name and column types for the rest of the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapEvent {
    pub table_id: TableId,
    pub schema: String,
    pub table: String,
    pub column_types: Vec<ColumnType>,
    #[serde(default)]
    pub flags: u16,
}

impl TableMapEvent {
    /// Builds the [`TableDefinition`] announced by this event.
    pub fn definition(&self) -> TableDefinition {
        TableDefinition::new(
            self.table_id,
            TableName::new(self.schema.clone(), self.table.clone()),
            self.column_types.clone(),
        )
    }
}

/// Classification of an incident reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentType {
    None,
    /// The server may have lost events, replicas must be re-synchronised.
    LostEvents,
    Other(u16),
}

impl IncidentType {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => IncidentType::None,
            1 => IncidentType::LostEvents,
            other => IncidentType::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            IncidentType::None => 0,
            IncidentType::LostEvents => 1,
            IncidentType::Other(code) => *code,
        }
    }
}

/// Anomaly marker signalling an unexpected condition on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentEvent {
    pub incident: IncidentType,
    #[serde(default)]
    pub message: String,
}

/// Decoded content of a binlog event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    Query(QueryEvent),
    Rotate(RotateEvent),
    FormatDescription(FormatDescriptionEvent),
    Xid(XidEvent),
    TableMap(TableMapEvent),
    Rows(RowsEvent),
    Incident(IncidentEvent),
    /// A complete transaction unit assembled by
    /// [`crate::handlers::transaction::TransactionAggregator`]. Never read from a transport.
    #[serde(skip)]
    Transaction(TransactionEvent),
    /// An event whose content is not decoded, only its type is known.
    Unsupported(EventType),
}

/// A single event of the change stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub header: EventHeader,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(header: EventHeader, payload: EventPayload) -> Self {
        Self { header, payload }
    }

    /// Returns the [`EventType`] that corresponds to this event.
    pub fn event_type(&self) -> EventType {
        self.into()
    }

    /// Returns the query event if this is one.
    pub fn as_query(&self) -> Option<&QueryEvent> {
        match &self.payload {
            EventPayload::Query(query) => Some(query),
            _ => None,
        }
    }
}

/// Classification of binlog events, mirroring the server's type codes.
///
/// [`EventType::UserDefined`] has no wire code and identifies events synthesised in process,
/// such as a collected transaction unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Unknown,
    StartV3,
    Query,
    Stop,
    Rotate,
    Intvar,
    Load,
    Slave,
    CreateFile,
    AppendBlock,
    ExecLoad,
    DeleteFile,
    NewLoad,
    Rand,
    UserVar,
    FormatDescription,
    Xid,
    BeginLoadQuery,
    ExecuteLoadQuery,
    TableMap,
    WriteRowsV0,
    UpdateRowsV0,
    DeleteRowsV0,
    WriteRowsV1,
    UpdateRowsV1,
    DeleteRowsV1,
    Incident,
    Heartbeat,
    Ignorable,
    RowsQuery,
    WriteRowsV2,
    UpdateRowsV2,
    DeleteRowsV2,
    Gtid,
    AnonymousGtid,
    PreviousGtids,
    TransactionContext,
    ViewChange,
    XaPrepare,
    PartialUpdateRows,
    TransactionPayload,
    UserDefined,
}

impl EventType {
    /// Maps a wire type code to an [`EventType`], falling back to [`EventType::Unknown`].
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => EventType::StartV3,
            2 => EventType::Query,
            3 => EventType::Stop,
            4 => EventType::Rotate,
            5 => EventType::Intvar,
            6 => EventType::Load,
            7 => EventType::Slave,
            8 => EventType::CreateFile,
            9 => EventType::AppendBlock,
            10 => EventType::ExecLoad,
            11 => EventType::DeleteFile,
            12 => EventType::NewLoad,
            13 => EventType::Rand,
            14 => EventType::UserVar,
            15 => EventType::FormatDescription,
            16 => EventType::Xid,
            17 => EventType::BeginLoadQuery,
            18 => EventType::ExecuteLoadQuery,
            19 => EventType::TableMap,
            20 => EventType::WriteRowsV0,
            21 => EventType::UpdateRowsV0,
            22 => EventType::DeleteRowsV0,
            23 => EventType::WriteRowsV1,
            24 => EventType::UpdateRowsV1,
            25 => EventType::DeleteRowsV1,
            26 => EventType::Incident,
            27 => EventType::Heartbeat,
            28 => EventType::Ignorable,
            29 => EventType::RowsQuery,
            30 => EventType::WriteRowsV2,
            31 => EventType::UpdateRowsV2,
            32 => EventType::DeleteRowsV2,
            33 => EventType::Gtid,
            34 => EventType::AnonymousGtid,
            35 => EventType::PreviousGtids,
            36 => EventType::TransactionContext,
            37 => EventType::ViewChange,
            38 => EventType::XaPrepare,
            39 => EventType::PartialUpdateRows,
            40 => EventType::TransactionPayload,
            _ => EventType::Unknown,
        }
    }

    /// Returns the event type of a rows event of the given kind and version.
    pub fn for_rows(kind: RowsEventKind, version: RowsEventVersion) -> Self {
        match (kind, version) {
            (RowsEventKind::Write, RowsEventVersion::V0) => EventType::WriteRowsV0,
            (RowsEventKind::Update, RowsEventVersion::V0) => EventType::UpdateRowsV0,
            (RowsEventKind::Delete, RowsEventVersion::V0) => EventType::DeleteRowsV0,
            (RowsEventKind::Write, RowsEventVersion::V1) => EventType::WriteRowsV1,
            (RowsEventKind::Update, RowsEventVersion::V1) => EventType::UpdateRowsV1,
            (RowsEventKind::Delete, RowsEventVersion::V1) => EventType::DeleteRowsV1,
            (RowsEventKind::Write, RowsEventVersion::V2) => EventType::WriteRowsV2,
            (RowsEventKind::Update, RowsEventVersion::V2) => EventType::UpdateRowsV2,
            (RowsEventKind::Delete, RowsEventVersion::V2) => EventType::DeleteRowsV2,
        }
    }

    /// Server-style name of the event type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::StartV3 => "Start_v3",
            Self::Query => "Query",
            Self::Stop => "Stop",
            Self::Rotate => "Rotate",
            Self::Intvar => "Intvar",
            Self::Load => "Load",
            Self::Slave => "Slave",
            Self::CreateFile => "Create_file",
            Self::AppendBlock => "Append_block",
            Self::ExecLoad => "Exec_load",
            Self::DeleteFile => "Delete_file",
            Self::NewLoad => "New_load",
            Self::Rand => "RAND",
            Self::UserVar => "User var",
            Self::FormatDescription => "Format_desc",
            Self::Xid => "Xid",
            Self::BeginLoadQuery => "Begin_load_query",
            Self::ExecuteLoadQuery => "Execute_load_query",
            Self::TableMap => "Table_map",
            Self::WriteRowsV0 => "Write_rows_event_old",
            Self::UpdateRowsV0 => "Update_rows_event_old",
            Self::DeleteRowsV0 => "Delete_rows_event_old",
            Self::WriteRowsV1 => "Write_rows_v1",
            Self::UpdateRowsV1 => "Update_rows_v1",
            Self::DeleteRowsV1 => "Delete_rows_v1",
            Self::Incident => "Incident",
            Self::Heartbeat => "Heartbeat",
            Self::Ignorable => "Ignorable",
            Self::RowsQuery => "Rows_query",
            Self::WriteRowsV2 => "Write_rows",
            Self::UpdateRowsV2 => "Update_rows",
            Self::DeleteRowsV2 => "Delete_rows",
            Self::Gtid => "Gtid",
            Self::AnonymousGtid => "Anonymous_Gtid",
            Self::PreviousGtids => "Previous_gtids",
            Self::TransactionContext => "Transaction_context",
            Self::ViewChange => "View_change",
            Self::XaPrepare => "XA_prepare",
            Self::PartialUpdateRows => "Update_rows_partial",
            Self::TransactionPayload => "Transaction_payload",
            Self::UserDefined => "User defined",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&Event> for EventType {
    fn from(event: &Event) -> Self {
        match &event.payload {
            EventPayload::Query(_) => EventType::Query,
            EventPayload::Rotate(_) => EventType::Rotate,
            EventPayload::FormatDescription(_) => EventType::FormatDescription,
            EventPayload::Xid(_) => EventType::Xid,
            EventPayload::TableMap(_) => EventType::TableMap,
            EventPayload::Rows(rows) => EventType::for_rows(rows.kind, rows.version),
            EventPayload::Incident(_) => EventType::Incident,
            EventPayload::Transaction(_) => EventType::UserDefined,
            EventPayload::Unsupported(event_type) => *event_type,
        }
    }
}

impl From<Event> for EventType {
    fn from(event: Event) -> Self {
        (&event).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_is_derived_from_header() {
        let header = EventHeader::new(50, 154);
        assert_eq!(header.start_position(), 104);
        assert_eq!(EventHeader::new(50, 10).start_position(), 0);
    }

    #[test]
    fn test_markers_are_case_insensitive_and_trimmed() {
        let query = |text: &str| QueryEvent {
            thread_id: 0,
            exec_time: 0,
            error_code: 0,
            schema: String::new(),
            query: text.to_string(),
        };

        assert!(query(" begin ").is_begin());
        assert!(query("COMMIT").is_commit());
        assert!(query("Rollback").is_rollback());
        assert!(!query("BEGIN WORK; SELECT 1").is_begin());
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::from_code(19).to_string(), "Table_map");
        assert_eq!(EventType::from_code(23).to_string(), "Write_rows_v1");
        assert_eq!(EventType::from_code(31).to_string(), "Update_rows");
        assert_eq!(EventType::from_code(200), EventType::Unknown);
        assert_eq!(EventType::UserDefined.to_string(), "User defined");
        assert_eq!(
            EventType::for_rows(RowsEventKind::Delete, RowsEventVersion::V0),
            EventType::DeleteRowsV0
        );
    }

    #[test]
    fn test_event_from_json_line() {
        let line = r#"{"header":{"event_length":60,"next_position":200},"payload":{"TableMap":{"table_id":12,"schema":"db1","table":"t1","column_types":["Long","Varchar"]}}}"#;
        let event: Event = serde_json::from_str(line).unwrap();

        assert_eq!(event.event_type(), EventType::TableMap);
        let EventPayload::TableMap(table_map) = &event.payload else {
            panic!("expected table map");
        };
        let definition = table_map.definition();
        assert_eq!(definition.name.to_string(), "db1.t1");
        assert_eq!(
            definition.column_types,
            vec![ColumnType::Long, ColumnType::Varchar]
        );
    }
}
