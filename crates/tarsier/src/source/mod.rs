//! The data source boundary.
//!
//! The core does not own a catalog or storage; a caller supplies something
//! implementing [`DataSource`] and the engine only ever resolves table
//! schemas and scans rows through it.

pub mod memory;

use crate::errors::Result;
use crate::repr::chunk::Chunk;
use crate::repr::schema::Schema;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub use memory::MemorySource;

pub type PinnedChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk>> + Send>>;

/// A catalog plus row source.
#[async_trait]
pub trait DataSource: Send + Sync + std::fmt::Debug {
    /// Resolve a table name to its schema.
    ///
    /// Errors with `UnknownTable` if the name is not registered. Read-only
    /// metadata lookup; called while plans are being built.
    fn resolve(&self, table: &str) -> Result<Schema>;

    /// Scan a table, returning a stream of chunks.
    ///
    /// Every chunk's schema must match what `resolve` reported for the
    /// table.
    async fn scan(&self, table: &str) -> Result<PinnedChunkStream>;
}
