use crate::errors::Result;
use crate::exec::ReadExecutor;
use crate::expr::SortOrder;
use crate::plan::{Sort, SortKey};
use crate::repr::chunk::{Chunk, Row};
use crate::source::DataSource;
use async_trait::async_trait;
use std::cmp::Ordering;

/// Compare two rows under a list of sort keys, in declared precedence
/// order. Nulls order first ascending.
pub(crate) fn compare_rows(a: &Row, b: &Row, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let left = a.get(key.column);
        let right = b.get(key.column);
        let ord = match key.order {
            SortOrder::Asc => left.cmp(&right),
            SortOrder::Desc => right.cmp(&left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl ReadExecutor for Sort {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;
        let mut rows = input.into_rows();
        // sort_by is stable; equal-keyed rows keep their input order.
        rows.sort_by(|a, b| compare_rows(a, b, &self.keys));
        Ok(Chunk::new_unchecked(self.output.clone(), rows))
    }
}
