//! Plan evaluation.
//!
//! Plans execute bottom-up: each node materializes its input(s), applies
//! its own transform, and hands a fresh chunk upward. Nothing is cached
//! between terminal calls; `count`/`collect`/`show` each re-evaluate from
//! the leaves.

pub mod aggregate;
pub mod join;
pub mod sort;
pub mod window;

use crate::errors::{Result, TarsierError};
use crate::plan::{Filter, Limit, Project, ReadPlan, Rename, Scan};
use crate::repr::chunk::{Chunk, Row};
use crate::repr::datatype::Value;
use crate::source::DataSource;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

#[async_trait]
pub trait ReadExecutor {
    /// Execute the node against the source, producing a materialized chunk.
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk>;
}

#[async_trait]
impl ReadExecutor for ReadPlan {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        match self {
            ReadPlan::Scan(n) => n.execute_read(source).await,
            ReadPlan::Project(n) => n.execute_read(source).await,
            ReadPlan::Rename(n) => n.execute_read(source).await,
            ReadPlan::Filter(n) => n.execute_read(source).await,
            ReadPlan::Aggregate(n) => n.execute_read(source).await,
            ReadPlan::Join(n) => n.execute_read(source).await,
            ReadPlan::Sort(n) => n.execute_read(source).await,
            ReadPlan::Window(n) => n.execute_read(source).await,
            ReadPlan::Limit(n) => n.execute_read(source).await,
        }
    }
}

#[async_trait]
impl ReadExecutor for Scan {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let mut stream = source.scan(&self.table).await?;
        let mut out = Chunk::empty_with_schema(self.schema.clone());
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.schema() != &self.schema {
                return Err(TarsierError::SourceError(format!(
                    "scan of {} returned schema {}, resolved schema was {}",
                    self.table,
                    chunk.schema(),
                    self.schema
                )));
            }
            out = out.vstack(chunk)?;
        }
        debug!(table = %self.table, rows = out.num_rows(), "scanned table");
        Ok(out)
    }
}

#[async_trait]
impl ReadExecutor for Project {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;
        let mut rows = Vec::with_capacity(input.num_rows());
        for row in input.rows() {
            let values = self
                .exprs
                .iter()
                .map(|expr| expr.evaluate(row))
                .collect::<Result<Row>>()?;
            rows.push(values);
        }
        Ok(Chunk::new_unchecked(self.output.clone(), rows))
    }
}

#[async_trait]
impl ReadExecutor for Rename {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;
        Ok(Chunk::new_unchecked(self.output.clone(), input.into_rows()))
    }
}

#[async_trait]
impl ReadExecutor for Filter {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;
        let mut rows = Vec::new();
        for row in input.rows() {
            // A null predicate result drops the row, same as false.
            if self.predicate.evaluate(row)? == Value::Bool(true) {
                rows.push(row.clone());
            }
        }
        Ok(Chunk::new_unchecked(self.output.clone(), rows))
    }
}

#[async_trait]
impl ReadExecutor for Limit {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;
        let mut rows = input.into_rows();
        rows.truncate(self.limit);
        Ok(Chunk::new_unchecked(self.output.clone(), rows))
    }
}
