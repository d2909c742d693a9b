use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::types::{TableDefinition, TableId};

/// Table definitions announced within one transaction unit, keyed by table id.
///
/// Lookups hand out shared [`Arc`] handles. The most recent registration of an id wins. The
/// directory is cleared at every unit boundary: a table id is never resolved against a
/// definition from a previous unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDirectory {
    tables: HashMap<TableId, Arc<TableDefinition>>,
}

impl TableDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its table id.
    ///
    /// A later registration for the same id overwrites the earlier one, the replaced definition
    /// is returned.
    pub fn register(&mut self, definition: TableDefinition) -> Option<Arc<TableDefinition>> {
        let table_id = definition.table_id;
        let previous = self.tables.insert(table_id, Arc::new(definition));
        if previous.is_some() {
            debug!(%table_id, "table id re-registered within the current unit");
        }

        previous
    }

    /// Returns the definition registered for `table_id`, if any.
    pub fn lookup(&self, table_id: &TableId) -> Option<Arc<TableDefinition>> {
        self.tables.get(table_id).cloned()
    }

    /// Removes every definition.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterates the registered definitions in no particular order.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<TableDefinition>> {
        self.tables.values()
    }
}
