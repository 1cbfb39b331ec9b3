use crate::errors::{Result, TarsierError};
use crate::repr::chunk::Chunk;
use crate::repr::schema::Schema;
use crate::source::{DataSource, PinnedChunkStream};
use async_trait::async_trait;
use futures::stream;
use hashbrown::HashMap;

/// An in-memory data source holding fully materialized tables.
///
/// Used by tests and demos; a production caller would implement
/// [`DataSource`] against a remote catalog instead.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, Chunk>,
}

impl MemorySource {
    pub fn new() -> MemorySource {
        MemorySource {
            tables: HashMap::new(),
        }
    }

    /// Register a table under a name, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, chunk: Chunk) {
        self.tables.insert(name.into(), chunk);
    }

    pub fn with_table(mut self, name: impl Into<String>, chunk: Chunk) -> MemorySource {
        self.register(name, chunk);
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn resolve(&self, table: &str) -> Result<Schema> {
        self.tables
            .get(table)
            .map(|chunk| chunk.schema().clone())
            .ok_or_else(|| TarsierError::UnknownTable(table.to_string()))
    }

    async fn scan(&self, table: &str) -> Result<PinnedChunkStream> {
        let chunk = self
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| TarsierError::UnknownTable(table.to_string()))?;
        Ok(Box::pin(stream::iter([Ok(chunk)])))
    }
}
