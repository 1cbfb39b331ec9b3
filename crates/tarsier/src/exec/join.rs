use crate::errors::{internal, Result};
use crate::exec::ReadExecutor;
use crate::plan::Join;
use crate::repr::chunk::Chunk;
use crate::repr::datatype::Value;
use crate::source::DataSource;
use async_trait::async_trait;
use hashbrown::HashMap;
use tracing::debug;

#[async_trait]
impl ReadExecutor for Join {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let left = self.left.execute_read(source).await?;
        let right = self.right.execute_read(source).await?;

        // Build on the right: key -> indexes of matching right rows, in
        // encountered order. Null keys never match anything, so they are
        // left out of the table entirely.
        let mut table: HashMap<&Value, Vec<usize>> = HashMap::new();
        for (idx, row) in right.rows().iter().enumerate() {
            let key = row.get(self.right_key).unwrap_or(&Value::Null);
            if key.is_null() {
                continue;
            }
            table.entry(key).or_default().push(idx);
        }
        debug!(
            build_rows = right.num_rows(),
            probe_rows = left.num_rows(),
            keys = table.len(),
            "built join table"
        );

        // Probe with left rows in order; output keeps left-row order, and
        // within one left row the right matches in build order.
        let mut rows = Vec::new();
        for left_row in left.rows() {
            let key = left_row.get(self.left_key).unwrap_or(&Value::Null);
            if key.is_null() {
                continue;
            }
            if let Some(matches) = table.get(key) {
                for &right_idx in matches {
                    let right_row = right
                        .get_row(right_idx)
                        .ok_or_else(|| internal!("join build index out of range"))?;
                    rows.push(left_row.concat(right_row));
                }
            }
        }

        Ok(Chunk::new_unchecked(self.output.clone(), rows))
    }
}
