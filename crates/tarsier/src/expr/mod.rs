//! Column expressions as the caller writes them.
//!
//! Expressions built here reference columns by name. Binding against a plan
//! node's input schema resolves names to indexes and type-checks the tree,
//! producing a [`scalar::ScalarExpr`]. All resolution failures happen at
//! bind time, before any evaluation.

pub mod scalar;

use crate::errors::{Result, TarsierError};
use crate::repr::datatype::Value;
use crate::repr::schema::Schema;
use scalar::{BinaryOperation, ScalarExpr, UnaryOperation};
use serde::{Deserialize, Serialize};

/// Reference a column by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Sort direction for sort keys and window orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// An unbound scalar expression over named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Unary {
        op: UnaryOperation,
        input: Box<Expr>,
    },
    Binary {
        op: BinaryOperation,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Marks a descending sort key. Only valid where a sort key is expected.
    Desc(Box<Expr>),
}

impl Expr {
    fn unary(self, op: UnaryOperation) -> Expr {
        Expr::Unary {
            op,
            input: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOperation, other: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Eq, other)
    }

    pub fn neq(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Neq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Lt, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::LtEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Gt, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::GtEq, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Or, other)
    }

    pub fn not(self) -> Expr {
        self.unary(UnaryOperation::Not)
    }

    pub fn is_null(self) -> Expr {
        self.unary(UnaryOperation::IsNull)
    }

    pub fn is_not_null(self) -> Expr {
        self.unary(UnaryOperation::IsNotNull)
    }

    /// Round a numeric expression to `decimals` decimal places.
    pub fn round(self, decimals: u32) -> Expr {
        self.unary(UnaryOperation::Round { decimals })
    }

    /// Mark this expression as a descending sort key.
    pub fn desc(self) -> Expr {
        Expr::Desc(Box::new(self))
    }

    /// Split off the sort direction marker.
    pub(crate) fn into_sort_key(self) -> (Expr, SortOrder) {
        match self {
            Expr::Desc(inner) => (*inner, SortOrder::Desc),
            other => (other, SortOrder::Asc),
        }
    }

    /// Bind against an input schema, resolving column names to indexes.
    ///
    /// Fails with `UnresolvedColumn`/`AmbiguousColumn` on bad references and
    /// `InvalidArgument` on a stray `desc()` marker. Note this does not
    /// type-check; callers use [`Expr::bind_checked`] for that.
    pub fn bind(&self, schema: &Schema) -> Result<ScalarExpr> {
        Ok(match self {
            Expr::Column(name) => ScalarExpr::Column(schema.resolve(name)?),
            Expr::Literal(value) => ScalarExpr::Constant(value.clone()),
            Expr::Unary { op, input } => ScalarExpr::Unary {
                op: op.clone(),
                input: input.bind(schema)?.boxed(),
            },
            Expr::Binary { op, left, right } => ScalarExpr::Binary {
                op: *op,
                left: left.bind(schema)?.boxed(),
                right: right.bind(schema)?.boxed(),
            },
            Expr::Desc(_) => {
                return Err(TarsierError::InvalidArgument(
                    "descending marker is only valid in sort keys".to_string(),
                ))
            }
        })
    }

    /// Bind and type-check, returning the bound expression and its output
    /// type.
    pub fn bind_checked(
        &self,
        schema: &Schema,
    ) -> Result<(ScalarExpr, crate::repr::datatype::DataType)> {
        let bound = self.bind(schema)?;
        let output = bound.output_type(schema)?;
        Ok((bound, output))
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Add, other)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Sub, other)
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Mul, other)
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;
    fn div(self, other: Expr) -> Expr {
        self.binary(BinaryOperation::Div, other)
    }
}

/// Aggregating functions usable in `agg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateOperation {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateOperation {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOperation::Count => "count",
            AggregateOperation::Sum => "sum",
            AggregateOperation::Min => "min",
            AggregateOperation::Max => "max",
            AggregateOperation::Avg => "avg",
        }
    }
}

/// An aggregate call over a named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggExpr {
    pub op: AggregateOperation,
    pub column: Option<String>,
    alias: Option<String>,
}

impl AggExpr {
    /// Rename the aggregate's output column.
    pub fn alias(mut self, name: impl Into<String>) -> AggExpr {
        self.alias = Some(name.into());
        self
    }

    /// The output column name: the alias if set, `count` for a bare count,
    /// `op(column)` otherwise.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.column {
            Some(column) => format!("{}({})", self.op.name(), column),
            None => self.op.name().to_string(),
        }
    }
}

/// Count rows per group.
pub fn count() -> AggExpr {
    AggExpr {
        op: AggregateOperation::Count,
        column: None,
        alias: None,
    }
}

fn agg(op: AggregateOperation, column: impl Into<String>) -> AggExpr {
    AggExpr {
        op,
        column: Some(column.into()),
        alias: None,
    }
}

pub fn sum(column: impl Into<String>) -> AggExpr {
    agg(AggregateOperation::Sum, column)
}

pub fn min(column: impl Into<String>) -> AggExpr {
    agg(AggregateOperation::Min, column)
}

pub fn max(column: impl Into<String>) -> AggExpr {
    agg(AggregateOperation::Max, column)
}

pub fn avg(column: impl Into<String>) -> AggExpr {
    agg(AggregateOperation::Avg, column)
}

/// An unbound window function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindowFunction {
    /// Value from `offset` rows earlier in the partition ordering.
    Lag { column: String, offset: usize },
    /// 1-based position within the partition ordering.
    RowNumber,
}

impl WindowFunction {
    /// Attach a window specification, producing an expression usable in
    /// `with_column`.
    pub fn over(self, spec: WindowSpec) -> WindowExpr {
        WindowExpr { func: self, spec }
    }
}

pub fn lag(column: impl Into<String>, offset: usize) -> WindowFunction {
    WindowFunction::Lag {
        column: column.into(),
        offset,
    }
}

pub fn row_number() -> WindowFunction {
    WindowFunction::RowNumber
}

/// Partitioning and ordering for a window function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partition_by: Vec<String>,
    pub order_by: Vec<Expr>,
}

impl WindowSpec {
    pub fn partition_by<I, S>(columns: I) -> WindowSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WindowSpec {
            partition_by: columns.into_iter().map(Into::into).collect(),
            order_by: Vec::new(),
        }
    }

    /// Order rows within each partition. Keys may carry a `desc()` marker.
    pub fn order_by<I>(mut self, keys: I) -> WindowSpec
    where
        I: IntoIterator<Item = Expr>,
    {
        self.order_by = keys.into_iter().collect();
        self
    }
}

/// A window function with its specification attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowExpr {
    pub func: WindowFunction,
    pub spec: WindowSpec,
}

/// Either kind of expression accepted by `with_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnExpr {
    Scalar(Expr),
    Window(WindowExpr),
}

impl From<Expr> for ColumnExpr {
    fn from(expr: Expr) -> Self {
        ColumnExpr::Scalar(expr)
    }
}

impl From<WindowExpr> for ColumnExpr {
    fn from(expr: WindowExpr) -> Self {
        ColumnExpr::Window(expr)
    }
}
