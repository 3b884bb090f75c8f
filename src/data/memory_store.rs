use std::collections::BTreeMap;
use std::path::PathBuf;

use super::dataset::Table;
use super::store::DataStore;
use crate::error::Result;

/// In-memory `DataStore` that also counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub tables: BTreeMap<String, Table>,
    pub writes: usize,
}

impl MemoryStore {
    pub fn with_table(name: &str, table: Table) -> Self {
        let mut store = Self::default();
        store.tables.insert(name.to_string(), table);
        store
    }
}

impl DataStore for MemoryStore {
    fn location(&self) -> PathBuf {
        PathBuf::from("memory")
    }

    fn list_candidates(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        Ok(self.tables.get(name).cloned())
    }

    fn write_table(&mut self, name: &str, table: &Table) -> Result<()> {
        self.tables.insert(name.to_string(), table.clone());
        self.writes += 1;
        Ok(())
    }
}
