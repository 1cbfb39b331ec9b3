//! The fluent query-building surface.
//!
//! A [`Session`] wraps a data source and hands out [`DataFrame`] handles.
//! Every builder method validates names and types against the current
//! output schema and returns a new handle wrapping a new plan node; the
//! receiver is never mutated. Evaluation only happens on the terminal
//! calls (`count`, `collect`, `show`).

use crate::errors::{internal, Result, TarsierError};
use crate::exec::ReadExecutor;
use crate::expr::scalar::{BinaryOperation, ScalarExpr};
use crate::expr::{AggExpr, AggregateOperation, ColumnExpr, Expr};
use crate::plan::{
    Aggregate, BoundAggExpr, Filter, Join, Limit, Project, ReadPlan, Rename, Scan, Sort, SortKey,
    Window,
};
use crate::repr::chunk::Chunk;
use crate::repr::datatype::DataType;
use crate::repr::fmt::format_chunk;
use crate::repr::schema::{Field, Schema};
use crate::source::DataSource;
use std::sync::Arc;

/// Number of rows rendered by a bare `show()`.
pub const DEFAULT_SHOW_ROWS: usize = 10;

/// An explicit connection/capability object. Holds the data source every
/// frame built from it will scan through; there is no process-wide state.
#[derive(Debug, Clone)]
pub struct Session {
    source: Arc<dyn DataSource>,
}

impl Session {
    pub fn new(source: Arc<dyn DataSource>) -> Session {
        Session { source }
    }

    /// Get a frame for a named table.
    ///
    /// The schema is resolved eagerly so that an unknown table fails here,
    /// not at materialization.
    pub fn table(&self, name: &str) -> Result<DataFrame> {
        let schema = self.source.resolve(name)?;
        Ok(DataFrame {
            source: self.source.clone(),
            plan: Arc::new(ReadPlan::Scan(Scan {
                table: name.to_string(),
                schema,
            })),
        })
    }
}

/// A lazy frame: a plan plus the source to eventually evaluate it against.
///
/// Cheap to clone; the plan is shared, so a partially built frame can feed
/// several downstream frames.
#[derive(Debug, Clone)]
pub struct DataFrame {
    source: Arc<dyn DataSource>,
    plan: Arc<ReadPlan>,
}

impl DataFrame {
    /// The schema this frame will materialize, known without evaluating.
    pub fn schema(&self) -> &Schema {
        self.plan.output_schema()
    }

    pub fn plan(&self) -> &Arc<ReadPlan> {
        &self.plan
    }

    fn with_plan(&self, plan: ReadPlan) -> DataFrame {
        DataFrame {
            source: self.source.clone(),
            plan: Arc::new(plan),
        }
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<DataFrame> {
        if columns.is_empty() {
            return Err(TarsierError::InvalidArgument(
                "select requires at least one column".to_string(),
            ));
        }
        let schema = self.schema();
        let idxs = columns
            .iter()
            .map(|name| schema.resolve(name))
            .collect::<Result<Vec<_>>>()?;
        let output = schema.project(&idxs)?;
        let exprs = idxs.into_iter().map(ScalarExpr::Column).collect();
        Ok(self.with_plan(ReadPlan::Project(Project {
            exprs,
            output,
            input: self.plan.clone(),
        })))
    }

    /// Remove the named columns, keeping everything else in order.
    pub fn drop(&self, columns: &[&str]) -> Result<DataFrame> {
        let schema = self.schema();
        let mut dropped = vec![false; schema.num_columns()];
        for name in columns {
            dropped[schema.resolve(name)?] = true;
        }
        let keep: Vec<usize> = (0..schema.num_columns())
            .filter(|&idx| !dropped[idx])
            .collect();
        if keep.is_empty() {
            return Err(TarsierError::InvalidArgument(
                "cannot drop every column".to_string(),
            ));
        }
        let output = schema.project(&keep)?;
        let exprs = keep.into_iter().map(ScalarExpr::Column).collect();
        Ok(self.with_plan(ReadPlan::Project(Project {
            exprs,
            output,
            input: self.plan.clone(),
        })))
    }

    /// Rename one column. The data passes through untouched.
    pub fn rename(&self, old: &str, new: &str) -> Result<DataFrame> {
        let schema = self.schema();
        let idx = schema.resolve(old).map_err(|err| match err {
            TarsierError::UnresolvedColumn(name) => TarsierError::ColumnNotFound(name),
            other => other,
        })?;
        if old != new && schema.contains(new) {
            return Err(TarsierError::DuplicateColumn(new.to_string()));
        }

        let fields = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| {
                if i == idx {
                    Field::new(new, field.datatype)
                } else {
                    field.clone()
                }
            })
            .collect();
        Ok(self.with_plan(ReadPlan::Rename(Rename {
            output: Schema::new(fields)?,
            input: self.plan.clone(),
        })))
    }

    /// Keep rows where the predicate evaluates to true.
    pub fn filter(&self, predicate: Expr) -> Result<DataFrame> {
        let schema = self.schema();
        let (bound, datatype) = predicate.bind_checked(schema)?;
        if datatype != DataType::Bool {
            return Err(TarsierError::TypeMismatch(format!(
                "filter predicate must be boolean, got {}",
                datatype
            )));
        }
        Ok(self.with_plan(ReadPlan::Filter(Filter {
            predicate: bound,
            output: schema.clone(),
            input: self.plan.clone(),
        })))
    }

    /// Append one computed column.
    ///
    /// Scalar expressions become a projection; window expressions become a
    /// window node. Errors with `DuplicateColumn` if `name` exists.
    pub fn with_column(&self, name: &str, expr: impl Into<ColumnExpr>) -> Result<DataFrame> {
        match expr.into() {
            ColumnExpr::Scalar(expr) => {
                let schema = self.schema();
                let (bound, datatype) = expr.bind_checked(schema)?;

                let mut exprs: Vec<ScalarExpr> =
                    (0..schema.num_columns()).map(ScalarExpr::Column).collect();
                exprs.push(bound);
                let mut fields = schema.fields().to_vec();
                fields.push(Field::new(name, datatype));
                Ok(self.with_plan(ReadPlan::Project(Project {
                    exprs,
                    output: Schema::new(fields)?,
                    input: self.plan.clone(),
                })))
            }
            ColumnExpr::Window(expr) => {
                let window = Window::bind(self.plan.clone(), name, &expr)?;
                Ok(self.with_plan(ReadPlan::Window(window)))
            }
        }
    }

    /// Group by the named columns. The grouping is completed by `count` or
    /// `agg` on the returned handle.
    pub fn group_by(&self, columns: &[&str]) -> Result<GroupedDataFrame> {
        let schema = self.schema();
        let keys = columns
            .iter()
            .map(|name| schema.resolve(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(GroupedDataFrame {
            frame: self.clone(),
            keys,
        })
    }

    /// Inner equality join.
    ///
    /// The predicate must be an equality between one column of `self` and
    /// one column of `other`; anything else is rejected. The output schema
    /// is self's schema followed by other's, and may carry duplicate names
    /// until a later `select`/`drop`/`rename` resolves them.
    pub fn join(&self, other: &DataFrame, predicate: Expr) -> Result<DataFrame> {
        let (left_name, right_name) = match &predicate {
            Expr::Binary {
                op: BinaryOperation::Eq,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expr::Column(l), Expr::Column(r)) => (l.as_str(), r.as_str()),
                _ => {
                    return Err(TarsierError::UnsupportedJoinPredicate(
                        "join predicate operands must be plain columns".to_string(),
                    ))
                }
            },
            _ => {
                return Err(TarsierError::UnsupportedJoinPredicate(
                    "only column equality predicates are supported".to_string(),
                ))
            }
        };

        let left_schema = self.schema();
        let right_schema = other.schema();
        let (left_key, right_key) =
            resolve_join_keys(left_schema, right_schema, left_name, right_name)?;

        let left_type = left_schema
            .field(left_key)
            .ok_or_else(|| internal!("join key out of range"))?
            .datatype;
        let right_type = right_schema
            .field(right_key)
            .ok_or_else(|| internal!("join key out of range"))?
            .datatype;
        let comparable =
            left_type == right_type || (left_type.is_numeric() && right_type.is_numeric());
        if !comparable {
            return Err(TarsierError::TypeMismatch(format!(
                "cannot join {} with {}",
                left_type, right_type
            )));
        }

        Ok(self.with_plan(ReadPlan::Join(Join {
            left: self.plan.clone(),
            right: other.plan.clone(),
            left_key,
            right_key,
            output: left_schema.concat(right_schema),
        })))
    }

    /// Stable sort by the given keys, in declared precedence order. Keys
    /// are columns, optionally wrapped with `desc()`.
    pub fn sort(&self, keys: &[Expr]) -> Result<DataFrame> {
        if keys.is_empty() {
            return Err(TarsierError::InvalidArgument(
                "sort requires at least one key".to_string(),
            ));
        }
        let schema = self.schema();
        let keys = keys
            .iter()
            .map(|key| {
                let (key, order) = key.clone().into_sort_key();
                let column = key.bind(schema)?.try_get_column().ok_or_else(|| {
                    TarsierError::InvalidArgument("sort keys must be plain columns".to_string())
                })?;
                Ok(SortKey { column, order })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_plan(ReadPlan::Sort(Sort {
            keys,
            output: schema.clone(),
            input: self.plan.clone(),
        })))
    }

    /// Keep at most the first `n` rows.
    pub fn limit(&self, n: usize) -> DataFrame {
        self.with_plan(ReadPlan::Limit(Limit {
            limit: n,
            output: self.schema().clone(),
            input: self.plan.clone(),
        }))
    }

    /// Evaluate the plan and report its row count.
    pub async fn count(&self) -> Result<usize> {
        let chunk = self.plan.execute_read(self.source.as_ref()).await?;
        Ok(chunk.num_rows())
    }

    /// Materialize the plan into a chunk.
    ///
    /// Fails with `AmbiguousColumn` if the output schema still carries a
    /// duplicated name (possible after a join with no disambiguation).
    pub async fn collect(&self) -> Result<Chunk> {
        if let Some(name) = self.schema().first_duplicate() {
            return Err(TarsierError::AmbiguousColumn(name.to_string()));
        }
        self.plan.execute_read(self.source.as_ref()).await
    }

    /// Materialize and render, returning the rendered table.
    pub async fn format(&self, max_rows: usize, truncate: Option<usize>) -> Result<String> {
        if let Some(width) = truncate {
            if width < 4 {
                return Err(TarsierError::InvalidArgument(format!(
                    "truncation width must be at least 4, got {}",
                    width
                )));
            }
        }
        let chunk = self.collect().await?;
        Ok(format_chunk(&chunk, max_rows, truncate))
    }

    /// Render the first [`DEFAULT_SHOW_ROWS`] rows to stdout.
    pub async fn show(&self) -> Result<()> {
        self.show_limit(DEFAULT_SHOW_ROWS).await
    }

    /// Render up to `max_rows` rows to stdout, untruncated.
    pub async fn show_limit(&self, max_rows: usize) -> Result<()> {
        print!("{}", self.format(max_rows, None).await?);
        Ok(())
    }

    /// Render up to `max_rows` rows, truncating cells to `width` characters.
    pub async fn show_truncate(&self, max_rows: usize, width: usize) -> Result<()> {
        print!("{}", self.format(max_rows, Some(width)).await?);
        Ok(())
    }
}

/// Resolve the two join key names against the two sides.
///
/// A name resolvable on both sides is rejected as ambiguous, and the pair
/// may be given in either orientation.
fn resolve_join_keys(
    left_schema: &Schema,
    right_schema: &Schema,
    a: &str,
    b: &str,
) -> Result<(usize, usize)> {
    for name in [a, b] {
        if left_schema.contains(name) && right_schema.contains(name) {
            return Err(TarsierError::UnsupportedJoinPredicate(format!(
                "column {} exists on both sides of the join",
                name
            )));
        }
    }

    let side = |name: &str| -> Result<(bool, usize)> {
        if left_schema.contains(name) {
            Ok((true, left_schema.resolve(name)?))
        } else if right_schema.contains(name) {
            Ok((false, right_schema.resolve(name)?))
        } else {
            Err(TarsierError::UnresolvedColumn(name.to_string()))
        }
    };

    match (side(a)?, side(b)?) {
        ((true, left), (false, right)) => Ok((left, right)),
        ((false, right), (true, left)) => Ok((left, right)),
        _ => Err(TarsierError::UnsupportedJoinPredicate(format!(
            "{} and {} resolve to the same side of the join",
            a, b
        ))),
    }
}

/// A frame with pending grouping, waiting for aggregates.
#[derive(Debug, Clone)]
pub struct GroupedDataFrame {
    frame: DataFrame,
    keys: Vec<usize>,
}

impl GroupedDataFrame {
    /// Count rows per group; the output column is named `count`.
    pub fn count(&self) -> Result<DataFrame> {
        self.agg(vec![crate::expr::count()])
    }

    /// Apply aggregate expressions per group.
    ///
    /// The output schema is the group columns in declared order followed by
    /// one column per aggregate.
    pub fn agg(&self, aggs: Vec<AggExpr>) -> Result<DataFrame> {
        if aggs.is_empty() {
            return Err(TarsierError::InvalidArgument(
                "agg requires at least one aggregate expression".to_string(),
            ));
        }
        let schema = self.frame.schema();

        let mut fields = Vec::with_capacity(self.keys.len() + aggs.len());
        for &idx in &self.keys {
            let field = schema
                .field(idx)
                .ok_or_else(|| internal!("group key out of range"))?;
            fields.push(field.clone());
        }
        let mut bound = Vec::with_capacity(aggs.len());
        for agg in &aggs {
            let column = match &agg.column {
                Some(name) => Some(schema.resolve(name)?),
                None => None,
            };
            let datatype = aggregate_output_type(agg.op, column, schema)?;
            fields.push(Field::new(agg.output_name(), datatype));
            bound.push(BoundAggExpr {
                op: agg.op,
                column,
            });
        }

        Ok(self.frame.with_plan(ReadPlan::Aggregate(Aggregate {
            group_by: self.keys.clone(),
            aggs: bound,
            output: Schema::new(fields)?,
            input: self.frame.plan.clone(),
        })))
    }
}

fn aggregate_output_type(
    op: AggregateOperation,
    column: Option<usize>,
    schema: &Schema,
) -> Result<DataType> {
    let column_type = column.and_then(|idx| schema.field(idx)).map(|f| f.datatype);
    Ok(match op {
        AggregateOperation::Count => DataType::Int64,
        AggregateOperation::Sum | AggregateOperation::Avg => {
            let ty = column_type.ok_or_else(|| {
                TarsierError::InvalidArgument(format!("{} requires a column", op.name()))
            })?;
            if !ty.is_numeric() {
                return Err(TarsierError::TypeMismatch(format!(
                    "{} requires a numeric column, got {}",
                    op.name(),
                    ty
                )));
            }
            if op == AggregateOperation::Avg {
                DataType::Float64
            } else {
                ty
            }
        }
        AggregateOperation::Min | AggregateOperation::Max => column_type.ok_or_else(|| {
            TarsierError::InvalidArgument(format!("{} requires a column", op.name()))
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, lit, sum};
    use crate::repr::chunk::Row;
    use crate::repr::datatype::Value;
    use crate::source::MemorySource;

    fn session() -> Session {
        let flights = Chunk::try_new(
            Schema::new(vec![
                Field::new("carrier", DataType::Utf8),
                Field::new("distance", DataType::Int64),
            ])
            .unwrap(),
            vec![
                Row::from(vec![Value::from("AA"), Value::Int64(1000)]),
                Row::from(vec![Value::from("UA"), Value::Int64(2000)]),
            ],
        )
        .unwrap();
        let carriers = Chunk::try_new(
            Schema::new(vec![
                Field::new("code", DataType::Utf8),
                Field::new("carrier", DataType::Utf8),
            ])
            .unwrap(),
            vec![Row::from(vec![
                Value::from("AA"),
                Value::from("American"),
            ])],
        )
        .unwrap();
        let source = MemorySource::new()
            .with_table("flights", flights)
            .with_table("carriers", carriers);
        Session::new(Arc::new(source))
    }

    #[test]
    fn unknown_table() {
        assert!(matches!(
            session().table("nope"),
            Err(TarsierError::UnknownTable(_))
        ));
    }

    #[test]
    fn select_computes_schema() {
        let df = session().table("flights").unwrap();
        let selected = df.select(&["distance"]).unwrap();
        assert_eq!(selected.schema().num_columns(), 1);
        assert_eq!(selected.schema().field(0).unwrap().name, "distance");

        assert!(matches!(
            df.select(&["nope"]),
            Err(TarsierError::UnresolvedColumn(_))
        ));
    }

    #[test]
    fn rename_errors() {
        let df = session().table("flights").unwrap();
        assert!(matches!(
            df.rename("nope", "x"),
            Err(TarsierError::ColumnNotFound(_))
        ));
        assert!(matches!(
            df.rename("carrier", "distance"),
            Err(TarsierError::DuplicateColumn(_))
        ));
        let renamed = df.rename("carrier", "carr").unwrap();
        assert_eq!(renamed.schema().field(0).unwrap().name, "carr");
    }

    #[test]
    fn filter_requires_boolean() {
        let df = session().table("flights").unwrap();
        assert!(matches!(
            df.filter(col("distance") + lit(1)),
            Err(TarsierError::TypeMismatch(_))
        ));
        assert!(df.filter(col("distance").gt(lit(1500))).is_ok());
    }

    #[test]
    fn join_predicate_shape() {
        let session = session();
        let flights = session.table("flights").unwrap();
        let carriers = session.table("carriers").unwrap();

        // Non-equality predicate.
        assert!(matches!(
            flights.join(&carriers, col("carrier").gt(lit(1))),
            Err(TarsierError::UnsupportedJoinPredicate(_))
        ));
        // "carrier" exists on both sides.
        assert!(matches!(
            flights.join(&carriers, col("carrier").eq(col("code"))),
            Err(TarsierError::UnsupportedJoinPredicate(_))
        ));

        let flights = flights.rename("carrier", "carr").unwrap();
        let joined = flights.join(&carriers, col("carr").eq(col("code"))).unwrap();
        assert_eq!(joined.schema().num_columns(), 4);
    }

    #[test]
    fn join_keys_may_swap_orientation() {
        let session = session();
        let flights = session
            .table("flights")
            .unwrap()
            .rename("carrier", "carr")
            .unwrap();
        let carriers = session.table("carriers").unwrap();
        // Same predicate, reversed operand order.
        let joined = flights.join(&carriers, col("code").eq(col("carr"))).unwrap();
        assert_eq!(joined.schema().num_columns(), 4);
    }

    #[test]
    fn sort_key_validation() {
        let df = session().table("flights").unwrap();
        assert!(matches!(
            df.sort(&[]),
            Err(TarsierError::InvalidArgument(_))
        ));
        assert!(matches!(
            df.sort(&[col("distance") + lit(1)]),
            Err(TarsierError::InvalidArgument(_))
        ));
        assert!(df.sort(&[col("distance").desc()]).is_ok());
    }

    #[test]
    fn with_column_duplicate_name() {
        let df = session().table("flights").unwrap();
        assert!(matches!(
            df.with_column("distance", col("distance") + lit(1)),
            Err(TarsierError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn agg_validation() {
        let df = session().table("flights").unwrap();
        let grouped = df.group_by(&["carrier"]).unwrap();
        assert!(matches!(
            grouped.agg(vec![sum("carrier")]),
            Err(TarsierError::TypeMismatch(_))
        ));
        let counted = grouped.count().unwrap();
        assert_eq!(counted.schema().field(1).unwrap().name, "count");
        assert_eq!(
            counted.schema().field(1).unwrap().datatype,
            DataType::Int64
        );
    }

    #[test]
    fn builder_does_not_mutate_receiver() {
        let df = session().table("flights").unwrap();
        let before = df.schema().clone();
        let _filtered = df.filter(col("distance").gt(lit(1500))).unwrap();
        let _renamed = df.rename("carrier", "carr").unwrap();
        assert_eq!(df.schema(), &before);
    }
}
