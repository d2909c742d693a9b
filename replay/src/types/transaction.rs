use crate::schema::directory::TableDirectory;
use crate::types::{EventHeader, RowsEvent, TableMapEvent};

/// A rows event collected inside a transaction unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRows {
    pub header: EventHeader,
    pub rows: RowsEvent,
    /// Whether a table map for the table id preceded this event in its unit.
    pub registered: bool,
}

/// One buffered event of a transaction unit, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEntry {
    TableMap(TableMapEvent),
    Rows(TransactionRows),
}

/// A complete transaction unit: every table map and rows event between a begin marker and
/// its end marker.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    /// Position of the begin marker in the binlog file.
    pub begin_position: u64,
    /// Transaction id of the `Xid` end marker. `None` when the unit ended with `COMMIT`.
    pub xid: Option<u64>,
    pub entries: Vec<TransactionEntry>,
    /// Table definitions registered while the unit was collected. A table id announced more
    /// than once holds its last definition.
    pub table_directory: TableDirectory,
}

impl TransactionEvent {
    /// Iterates the rows entries of the unit in stream order.
    pub fn rows(&self) -> impl Iterator<Item = &TransactionRows> {
        self.entries.iter().filter_map(|entry| match entry {
            TransactionEntry::Rows(rows) => Some(rows),
            TransactionEntry::TableMap(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
