use crate::errors::Result;
use crate::exec::sort::compare_rows;
use crate::exec::ReadExecutor;
use crate::plan::{Window, WindowFunc};
use crate::repr::chunk::Chunk;
use crate::repr::datatype::Value;
use crate::source::DataSource;
use async_trait::async_trait;
use hashbrown::HashMap;
use tracing::debug;

#[async_trait]
impl ReadExecutor for Window {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;
        let rows = input.rows();

        // Partition row indexes by the partition key. Same key semantics as
        // grouping: exact equality, nulls equal to each other.
        let mut partitions: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let key: Vec<Value> = self
                .partition_by
                .iter()
                .map(|&col| row.get(col).cloned().unwrap_or(Value::Null))
                .collect();
            partitions.entry(key).or_default().push(idx);
        }
        debug!(
            partitions = partitions.len(),
            rows = rows.len(),
            "partitioned window input"
        );

        // One computed value per input row, written back by row identity so
        // the input order survives.
        let mut computed: Vec<Value> = vec![Value::Null; rows.len()];
        for indexes in partitions.values() {
            let mut ordered = indexes.clone();
            // Stable: rows with equal order keys keep input order.
            ordered.sort_by(|&a, &b| compare_rows(&rows[a], &rows[b], &self.order_by));

            match &self.func {
                WindowFunc::Lag { column, offset } => {
                    for (pos, &row_idx) in ordered.iter().enumerate() {
                        computed[row_idx] = match pos.checked_sub(*offset) {
                            Some(prior) => rows[ordered[prior]]
                                .get(*column)
                                .cloned()
                                .unwrap_or(Value::Null),
                            None => Value::Null,
                        };
                    }
                }
                WindowFunc::RowNumber => {
                    for (pos, &row_idx) in ordered.iter().enumerate() {
                        computed[row_idx] = Value::Int64(pos as i64 + 1);
                    }
                }
            }
        }

        let out_rows = rows
            .iter()
            .zip(computed)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push(value);
                row
            })
            .collect();

        Ok(Chunk::new_unchecked(self.output.clone(), out_rows))
    }
}
