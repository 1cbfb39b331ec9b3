use crate::errors::{internal, Result};
use crate::exec::ReadExecutor;
use crate::expr::AggregateOperation;
use crate::plan::{Aggregate, BoundAggExpr};
use crate::repr::chunk::{Chunk, Row};
use crate::repr::datatype::Value;
use crate::source::DataSource;
use async_trait::async_trait;
use hashbrown::HashMap;
use tracing::debug;

/// Running state for one aggregate within one group.
#[derive(Debug, Clone)]
enum AccState {
    Count(i64),
    /// Sticky-null on overflow; `None` until a non-null value is seen.
    Sum(Option<Value>),
    Min(Option<Value>),
    Max(Option<Value>),
    Avg { sum: f64, count: i64 },
}

impl AccState {
    fn new(op: AggregateOperation) -> AccState {
        match op {
            AggregateOperation::Count => AccState::Count(0),
            AggregateOperation::Sum => AccState::Sum(None),
            AggregateOperation::Min => AccState::Min(None),
            AggregateOperation::Max => AccState::Max(None),
            AggregateOperation::Avg => AccState::Avg { sum: 0.0, count: 0 },
        }
    }

    /// Fold one value in. Aggregates other than count skip nulls.
    fn update(&mut self, value: Option<&Value>) -> Result<()> {
        match self {
            AccState::Count(n) => *n += 1,
            AccState::Sum(acc) => {
                let value = match value {
                    Some(v) if !v.is_null() => v,
                    _ => return Ok(()),
                };
                *acc = Some(match acc.take() {
                    None => value.clone(),
                    Some(Value::Null) => Value::Null,
                    Some(prev) => add_values(&prev, value)?,
                });
            }
            AccState::Min(acc) => {
                let value = match value {
                    Some(v) if !v.is_null() => v,
                    _ => return Ok(()),
                };
                match acc {
                    Some(prev) if &*prev <= value => (),
                    _ => *acc = Some(value.clone()),
                }
            }
            AccState::Max(acc) => {
                let value = match value {
                    Some(v) if !v.is_null() => v,
                    _ => return Ok(()),
                };
                match acc {
                    Some(prev) if &*prev >= value => (),
                    _ => *acc = Some(value.clone()),
                }
            }
            AccState::Avg { sum, count } => {
                let value = match value.and_then(|v| v.as_f64()) {
                    Some(v) => v,
                    None => return Ok(()),
                };
                *sum += value;
                *count += 1;
            }
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self {
            AccState::Count(n) => Value::Int64(n),
            AccState::Sum(acc) | AccState::Min(acc) | AccState::Max(acc) => {
                acc.unwrap_or(Value::Null)
            }
            AccState::Avg { sum, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Value::from(sum / count as f64)
                }
            }
        }
    }
}

fn add_values(left: &Value, right: &Value) -> Result<Value> {
    Ok(match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => a.checked_add(*b).into(),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Value::from(a + b),
            _ => return Err(internal!("sum over non-numeric values")),
        },
    })
}

#[async_trait]
impl ReadExecutor for Aggregate {
    async fn execute_read(&self, source: &dyn DataSource) -> Result<Chunk> {
        let input = self.input.execute_read(source).await?;

        // Group keys use exact value equality, nulls included: all-null
        // keys collapse into one group so counts stay total. This is a
        // deliberate divergence from three-valued SQL grouping.
        let mut group_idx: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut keys: Vec<Vec<Value>> = Vec::new();
        let mut states: Vec<Vec<AccState>> = Vec::new();

        let new_states =
            || -> Vec<AccState> { self.aggs.iter().map(|agg| AccState::new(agg.op)).collect() };

        // A global aggregate (no group columns) always produces one row,
        // even over empty input.
        if self.group_by.is_empty() {
            keys.push(Vec::new());
            states.push(new_states());
            group_idx.insert(Vec::new(), 0);
        }

        for row in input.rows() {
            let key: Vec<Value> = self
                .group_by
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or(Value::Null))
                .collect();
            let idx = *group_idx.entry(key.clone()).or_insert_with(|| {
                keys.push(key);
                states.push(new_states());
                keys.len() - 1
            });
            for (agg, state) in self.aggs.iter().zip(states[idx].iter_mut()) {
                state.update(agg_input(agg, row))?;
            }
        }

        debug!(groups = keys.len(), rows = input.num_rows(), "aggregated");

        let rows = keys
            .into_iter()
            .zip(states)
            .map(|(key, states)| {
                key.into_iter()
                    .chain(states.into_iter().map(AccState::finish))
                    .collect::<Row>()
            })
            .collect();

        Ok(Chunk::new_unchecked(self.output.clone(), rows))
    }
}

fn agg_input<'a>(agg: &BoundAggExpr, row: &'a Row) -> Option<&'a Value> {
    agg.column.and_then(|idx| row.get(idx))
}
