use crate::errors::{internal, Result, TarsierError};
use crate::repr::chunk::Row;
use crate::repr::datatype::{DataType, Value};
use crate::repr::schema::Schema;
use serde::{Deserialize, Serialize};

/// A bound expression tree evaluated row-wise against a chunk.
///
/// Column references have already been resolved to indexes in the input
/// schema; binding happens in `expr::Expr::bind`. All expressions produce a
/// single output value per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarExpr {
    /// Reference a column in the input.
    Column(usize),
    /// A constant value.
    Constant(Value),
    /// An operation acting on a single input.
    Unary {
        op: UnaryOperation,
        input: Box<ScalarExpr>,
    },
    /// An operation acting on two inputs.
    Binary {
        op: BinaryOperation,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
}

impl ScalarExpr {
    pub fn boxed(self) -> Box<ScalarExpr> {
        Box::new(self)
    }

    /// Try to get the column index if this is a plain column reference.
    pub fn try_get_column(&self) -> Option<usize> {
        match self {
            ScalarExpr::Column(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Given an input schema, determine the output type.
    ///
    /// This doubles as the build-time type check: every operator validates
    /// its operand types here and fails with `TypeMismatch` before any row
    /// is evaluated.
    pub fn output_type(&self, schema: &Schema) -> Result<DataType> {
        Ok(match self {
            ScalarExpr::Column(idx) => schema
                .field(*idx)
                .map(|f| f.datatype)
                .ok_or_else(|| internal!("missing column in input schema: {}", idx))?,
            ScalarExpr::Constant(v) => v
                .datatype()
                .ok_or_else(|| internal!("constant null has no type"))?,
            ScalarExpr::Unary { op, input } => op.output_type(input, schema)?,
            ScalarExpr::Binary { op, left, right } => op.output_type(left, right, schema)?,
        })
    }

    /// Evaluate self against a single row.
    pub fn evaluate(&self, row: &Row) -> Result<Value> {
        Ok(match self {
            ScalarExpr::Column(idx) => row
                .get(*idx)
                .cloned()
                .ok_or_else(|| internal!("missing column in row: {}", idx))?,
            ScalarExpr::Constant(v) => v.clone(),
            ScalarExpr::Unary { op, input } => op.evaluate(input, row)?,
            ScalarExpr::Binary { op, left, right } => op.evaluate(left, right, row)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnaryOperation {
    Not,
    IsNull,
    IsNotNull,
    /// Round a numeric input to some number of decimal places.
    Round {
        decimals: u32,
    },
}

impl UnaryOperation {
    pub fn output_type(&self, input: &ScalarExpr, schema: &Schema) -> Result<DataType> {
        let input_type = input.output_type(schema)?;
        Ok(match self {
            UnaryOperation::Not => {
                if input_type != DataType::Bool {
                    return Err(TarsierError::TypeMismatch(format!(
                        "NOT requires a boolean input, got {}",
                        input_type
                    )));
                }
                DataType::Bool
            }
            UnaryOperation::IsNull | UnaryOperation::IsNotNull => DataType::Bool,
            UnaryOperation::Round { .. } => {
                if !input_type.is_numeric() {
                    return Err(TarsierError::TypeMismatch(format!(
                        "round requires a numeric input, got {}",
                        input_type
                    )));
                }
                DataType::Float64
            }
        })
    }

    pub fn evaluate(&self, input: &ScalarExpr, row: &Row) -> Result<Value> {
        let value = input.evaluate(row)?;
        Ok(match self {
            UnaryOperation::Not => match value {
                Value::Null => Value::Null,
                Value::Bool(b) => Value::Bool(!b),
                other => return Err(internal!("NOT applied to non-boolean: {:?}", other)),
            },
            UnaryOperation::IsNull => Value::Bool(value.is_null()),
            UnaryOperation::IsNotNull => Value::Bool(!value.is_null()),
            UnaryOperation::Round { decimals } => match value.as_f64() {
                Some(v) => {
                    let factor = 10f64.powi(*decimals as i32);
                    Value::from((v * factor).round() / factor)
                }
                None => Value::Null,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BinaryOperation {
    Eq,
    Neq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperation {
    pub fn output_type(
        &self,
        left: &ScalarExpr,
        right: &ScalarExpr,
        schema: &Schema,
    ) -> Result<DataType> {
        let left = left.output_type(schema)?;
        let right = right.output_type(schema)?;

        Ok(match self {
            BinaryOperation::Eq | BinaryOperation::Neq => {
                let numeric = left.is_numeric() && right.is_numeric();
                if !numeric && left != right {
                    return Err(TarsierError::TypeMismatch(format!(
                        "cannot compare {} with {}",
                        left, right
                    )));
                }
                DataType::Bool
            }
            BinaryOperation::Lt
            | BinaryOperation::LtEq
            | BinaryOperation::Gt
            | BinaryOperation::GtEq => {
                if !left.is_numeric() || !right.is_numeric() {
                    return Err(TarsierError::TypeMismatch(format!(
                        "ordering comparison requires numeric operands, got {} and {}",
                        left, right
                    )));
                }
                DataType::Bool
            }
            BinaryOperation::And | BinaryOperation::Or => {
                if left != DataType::Bool || right != DataType::Bool {
                    return Err(TarsierError::TypeMismatch(format!(
                        "boolean combinator requires boolean operands, got {} and {}",
                        left, right
                    )));
                }
                DataType::Bool
            }
            BinaryOperation::Add | BinaryOperation::Sub | BinaryOperation::Mul => {
                if !left.is_numeric() || !right.is_numeric() {
                    return Err(TarsierError::TypeMismatch(format!(
                        "arithmetic requires numeric operands, got {} and {}",
                        left, right
                    )));
                }
                if left == DataType::Float64 || right == DataType::Float64 {
                    DataType::Float64
                } else {
                    DataType::Int64
                }
            }
            // Integer division promotes to float.
            BinaryOperation::Div => {
                if !left.is_numeric() || !right.is_numeric() {
                    return Err(TarsierError::TypeMismatch(format!(
                        "arithmetic requires numeric operands, got {} and {}",
                        left, right
                    )));
                }
                DataType::Float64
            }
        })
    }

    pub fn evaluate(&self, left: &ScalarExpr, right: &ScalarExpr, row: &Row) -> Result<Value> {
        let left = left.evaluate(row)?;
        let right = right.evaluate(row)?;

        // Boolean combinators get Kleene semantics, everything else
        // propagates nulls.
        match self {
            BinaryOperation::And => return Ok(kleene_and(&left, &right)),
            BinaryOperation::Or => return Ok(kleene_or(&left, &right)),
            _ => (),
        }
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }

        Ok(match self {
            BinaryOperation::Eq => Value::Bool(value_eq(&left, &right)?),
            BinaryOperation::Neq => Value::Bool(!value_eq(&left, &right)?),
            BinaryOperation::Lt => compare_numeric(&left, &right, |ord| ord.is_lt())?,
            BinaryOperation::LtEq => compare_numeric(&left, &right, |ord| ord.is_le())?,
            BinaryOperation::Gt => compare_numeric(&left, &right, |ord| ord.is_gt())?,
            BinaryOperation::GtEq => compare_numeric(&left, &right, |ord| ord.is_ge())?,
            BinaryOperation::And | BinaryOperation::Or => unreachable!("handled above"),
            BinaryOperation::Add => arith(&left, &right, i64::checked_add, |a, b| a + b)?,
            BinaryOperation::Sub => arith(&left, &right, i64::checked_sub, |a, b| a - b)?,
            BinaryOperation::Mul => arith(&left, &right, i64::checked_mul, |a, b| a * b)?,
            BinaryOperation::Div => divide(&left, &right)?,
        })
    }
}

fn kleene_and(left: &Value, right: &Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(false), _) | (_, Some(false)) => Value::Bool(false),
        (Some(true), Some(true)) => Value::Bool(true),
        _ => Value::Null,
    }
}

fn kleene_or(left: &Value, right: &Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(true), _) | (_, Some(true)) => Value::Bool(true),
        (Some(false), Some(false)) => Value::Bool(false),
        _ => Value::Null,
    }
}

fn value_eq(left: &Value, right: &Value) -> Result<bool> {
    Ok(match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => a == b,
        (Value::Utf8(a), Value::Utf8(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => {
                return Err(internal!(
                    "equality on incompatible values: {:?}, {:?}",
                    left,
                    right
                ))
            }
        },
    })
}

fn compare_numeric(
    left: &Value,
    right: &Value,
    check: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value> {
    let ord = match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => f64::total_cmp(&a, &b),
            _ => {
                return Err(internal!(
                    "comparison on non-numeric values: {:?}, {:?}",
                    left,
                    right
                ))
            }
        },
    };
    Ok(Value::Bool(check(ord)))
}

fn arith(
    left: &Value,
    right: &Value,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    Ok(match (left, right) {
        // Integer overflow yields null rather than aborting evaluation.
        (Value::Int64(a), Value::Int64(b)) => int_op(*a, *b).into(),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Value::from(float_op(a, b)),
            _ => {
                return Err(internal!(
                    "arithmetic on non-numeric values: {:?}, {:?}",
                    left,
                    right
                ))
            }
        },
    })
}

/// Division always promotes to float; dividing by zero yields null.
fn divide(left: &Value, right: &Value) -> Result<Value> {
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Ok(Value::Null),
        (Some(a), Some(b)) => Ok(Value::from(a / b)),
        _ => Err(internal!(
            "division on non-numeric values: {:?}, {:?}",
            left,
            right
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::schema::Field;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("i", DataType::Int64),
            Field::new("f", DataType::Float64),
            Field::new("s", DataType::Utf8),
            Field::new("b", DataType::Bool),
        ])
        .unwrap()
    }

    fn row() -> Row {
        Row::from(vec![
            Value::Int64(10),
            Value::from(2.5),
            Value::from("ten"),
            Value::Bool(true),
        ])
    }

    fn binary(op: BinaryOperation, left: ScalarExpr, right: ScalarExpr) -> ScalarExpr {
        ScalarExpr::Binary {
            op,
            left: left.boxed(),
            right: right.boxed(),
        }
    }

    #[test]
    fn int_arithmetic_stays_int() {
        let expr = binary(
            BinaryOperation::Add,
            ScalarExpr::Column(0),
            ScalarExpr::Constant(Value::Int64(5)),
        );
        assert_eq!(expr.output_type(&schema()).unwrap(), DataType::Int64);
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::Int64(15));
    }

    #[test]
    fn division_promotes_to_float() {
        let expr = binary(
            BinaryOperation::Div,
            ScalarExpr::Column(0),
            ScalarExpr::Constant(Value::Int64(4)),
        );
        assert_eq!(expr.output_type(&schema()).unwrap(), DataType::Float64);
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::from(2.5));
    }

    #[test]
    fn division_by_zero_is_null() {
        let expr = binary(
            BinaryOperation::Div,
            ScalarExpr::Column(0),
            ScalarExpr::Constant(Value::Int64(0)),
        );
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::Null);
    }

    #[test]
    fn mixed_arithmetic_promotes() {
        let expr = binary(
            BinaryOperation::Mul,
            ScalarExpr::Column(0),
            ScalarExpr::Column(1),
        );
        assert_eq!(expr.output_type(&schema()).unwrap(), DataType::Float64);
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::from(25.0));
    }

    #[test]
    fn null_propagates_through_comparison() {
        let expr = binary(
            BinaryOperation::Gt,
            ScalarExpr::Constant(Value::Null),
            ScalarExpr::Column(0),
        );
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::Null);
    }

    #[test]
    fn string_ordering_rejected_at_bind_time() {
        let expr = binary(
            BinaryOperation::Gt,
            ScalarExpr::Column(2),
            ScalarExpr::Constant(Value::from("a")),
        );
        assert!(matches!(
            expr.output_type(&schema()),
            Err(TarsierError::TypeMismatch(_))
        ));
    }

    #[test]
    fn string_equality_allowed() {
        let expr = binary(
            BinaryOperation::Eq,
            ScalarExpr::Column(2),
            ScalarExpr::Constant(Value::from("ten")),
        );
        assert_eq!(expr.output_type(&schema()).unwrap(), DataType::Bool);
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn kleene_and_with_null() {
        let false_and_null = binary(
            BinaryOperation::And,
            ScalarExpr::Constant(Value::Bool(false)),
            ScalarExpr::Constant(Value::Null),
        );
        assert_eq!(false_and_null.evaluate(&row()).unwrap(), Value::Bool(false));

        let true_and_null = binary(
            BinaryOperation::And,
            ScalarExpr::Constant(Value::Bool(true)),
            ScalarExpr::Constant(Value::Null),
        );
        assert_eq!(true_and_null.evaluate(&row()).unwrap(), Value::Null);
    }

    #[test]
    fn round_to_decimals() {
        let expr = ScalarExpr::Unary {
            op: UnaryOperation::Round { decimals: 1 },
            input: ScalarExpr::Constant(Value::from(0.6666)).boxed(),
        };
        assert_eq!(expr.output_type(&schema()).unwrap(), DataType::Float64);
        assert_eq!(expr.evaluate(&row()).unwrap(), Value::from(0.7));
    }
}
