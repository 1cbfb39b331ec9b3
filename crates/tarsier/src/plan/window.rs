//! Window node planning.
//!
//! Resolves a caller-supplied window expression (partition names, order
//! keys, function call) against the input schema into index-based
//! evaluation instructions. Window functions are a closed set of variants;
//! adding one means adding a variant here and its evaluation rule in
//! `exec::window`.

use crate::errors::Result;
use crate::expr::{WindowExpr, WindowFunction};
use crate::plan::{ReadPlan, SortKey};
use crate::repr::datatype::DataType;
use crate::repr::schema::{Field, Schema};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A window function bound to column indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindowFunc {
    /// Value of `column` from `offset` rows earlier within the partition
    /// ordering; null when no such row exists.
    Lag { column: usize, offset: usize },
    /// 1-based rank within the partition ordering, ties broken by input
    /// row order.
    RowNumber,
}

/// Compute one window function over partitioned, ordered input and append
/// the result as a new column. Input row order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub partition_by: Vec<usize>,
    pub order_by: Vec<SortKey>,
    pub func: WindowFunc,
    pub output: Schema,
    pub input: Arc<ReadPlan>,
}

impl Window {
    /// Bind a window expression against the input plan, producing the plan
    /// node. `name` becomes the appended output column.
    pub fn bind(input: Arc<ReadPlan>, name: &str, expr: &WindowExpr) -> Result<Window> {
        let input_schema = input.output_schema();

        let partition_by = expr
            .spec
            .partition_by
            .iter()
            .map(|col| input_schema.resolve(col))
            .collect::<Result<Vec<_>>>()?;

        let order_by = expr
            .spec
            .order_by
            .iter()
            .map(|key| {
                let (key, order) = key.clone().into_sort_key();
                let column = key.bind(input_schema)?.try_get_column().ok_or_else(|| {
                    crate::errors::TarsierError::InvalidArgument(
                        "window ordering keys must be plain columns".to_string(),
                    )
                })?;
                Ok(SortKey { column, order })
            })
            .collect::<Result<Vec<_>>>()?;

        let (func, datatype) = match &expr.func {
            WindowFunction::Lag { column, offset } => {
                let column = input_schema.resolve(column)?;
                let datatype = input_schema
                    .field(column)
                    .ok_or_else(|| crate::errors::internal!("lag column out of range"))?
                    .datatype;
                (
                    WindowFunc::Lag {
                        column,
                        offset: *offset,
                    },
                    datatype,
                )
            }
            WindowFunction::RowNumber => (WindowFunc::RowNumber, DataType::Int64),
        };

        let mut fields = input_schema.fields().to_vec();
        fields.push(Field::new(name, datatype));
        let output = Schema::new(fields)?;

        Ok(Window {
            partition_by,
            order_by,
            func,
            output,
            input,
        })
    }
}
