//! Logical plan nodes.
//!
//! Nodes are immutable once built and own their inputs through `Arc`, so a
//! partially built plan can feed several downstream plans (e.g. both sides
//! of two different joins). Every node stores its output schema, computed
//! when the node is built; evaluation never changes a declared schema.

pub mod window;

use crate::expr::scalar::ScalarExpr;
use crate::expr::{AggregateOperation, SortOrder};
use crate::repr::schema::Schema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use window::{Window, WindowFunc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReadPlan {
    Scan(Scan),
    Project(Project),
    Rename(Rename),
    Filter(Filter),
    Aggregate(Aggregate),
    Join(Join),
    Sort(Sort),
    Window(Window),
    Limit(Limit),
}

impl ReadPlan {
    /// The schema this node produces, known without evaluating anything.
    pub fn output_schema(&self) -> &Schema {
        match self {
            ReadPlan::Scan(n) => &n.schema,
            ReadPlan::Project(n) => &n.output,
            ReadPlan::Rename(n) => &n.output,
            ReadPlan::Filter(n) => &n.output,
            ReadPlan::Aggregate(n) => &n.output,
            ReadPlan::Join(n) => &n.output,
            ReadPlan::Sort(n) => &n.output,
            ReadPlan::Window(n) => &n.output,
            ReadPlan::Limit(n) => &n.output,
        }
    }
}

/// Scan a named table from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub table: String,
    /// Schema as resolved from the source's catalog.
    pub schema: Schema,
}

/// Evaluate one expression per output column.
///
/// `select`, `drop` and scalar `with_column` all lower to this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub exprs: Vec<ScalarExpr>,
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}

/// Relabel columns without touching the data. The new names live in
/// `output`; row contents pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rename {
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Type-checked to produce a boolean.
    pub predicate: ScalarExpr,
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}

/// An aggregate call bound to a column index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundAggExpr {
    pub op: AggregateOperation,
    /// `None` for a bare `count()`.
    pub column: Option<usize>,
}

/// Group rows and accumulate aggregates per group.
///
/// Output schema is the group columns in declared order followed by one
/// column per aggregate. Output row order is unspecified; callers sort
/// explicitly when order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub group_by: Vec<usize>,
    pub aggs: Vec<BoundAggExpr>,
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}

/// Inner equality join. The output schema is the left schema concatenated
/// with the right schema; duplicate names survive until a later projection
/// or rename resolves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub left: Arc<ReadPlan>,
    pub right: Arc<ReadPlan>,
    pub left_key: usize,
    pub right_key: usize,
    pub output: Schema,
}

/// One sort key: a column and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: usize,
    pub order: SortOrder,
}

/// Stable multi-key sort. Keys apply in declared precedence order; rows
/// with equal keys keep their input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub keys: Vec<SortKey>,
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub limit: usize,
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}
