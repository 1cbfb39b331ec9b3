use crate::errors::{internal, Result, TarsierError};
use crate::repr::datatype::Value;
use crate::repr::schema::Schema;
use serde::{Deserialize, Serialize};

/// A single row of values, positionally aligned to some schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.0.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value)
    }

    /// Concatenate two rows, left then right.
    pub fn concat(&self, other: &Row) -> Row {
        Row(self.0.iter().chain(other.0.iter()).cloned().collect())
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Row(iter.into_iter().collect())
    }
}

/// A materialized relation: a schema plus an ordered list of rows.
///
/// Row order is only meaningful downstream of a sort; everywhere else it is
/// whatever order evaluation happened to produce, stable within one
/// materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    schema: Schema,
    rows: Vec<Row>,
}

impl Chunk {
    /// Create a chunk, checking that every row matches the schema in arity
    /// and type.
    pub fn try_new(schema: Schema, rows: Vec<Row>) -> Result<Chunk> {
        for row in &rows {
            check_row(&schema, row)?;
        }
        Ok(Chunk { schema, rows })
    }

    /// Create a chunk without validating rows against the schema. Intended
    /// for evaluation internals that construct rows from an already checked
    /// plan.
    pub fn new_unchecked(schema: Schema, rows: Vec<Row>) -> Chunk {
        Chunk { schema, rows }
    }

    pub fn empty_with_schema(schema: Schema) -> Chunk {
        Chunk {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get_row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.num_columns()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        check_row(&self.schema, &row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Vertically stack another chunk onto this one. Schemas must match.
    pub fn vstack(mut self, other: Chunk) -> Result<Chunk> {
        if self.schema != other.schema {
            return Err(TarsierError::TypeMismatch(format!(
                "cannot stack chunks with schemas {} and {}",
                self.schema, other.schema
            )));
        }
        self.rows.extend(other.rows);
        Ok(self)
    }

    /// Stack all chunks in the iterator. Returns a chunk with the given
    /// schema when the iterator is empty.
    pub fn from_chunks(schema: Schema, chunks: impl IntoIterator<Item = Chunk>) -> Result<Chunk> {
        let mut out = Chunk::empty_with_schema(schema);
        for chunk in chunks {
            out = out.vstack(chunk)?;
        }
        Ok(out)
    }
}

fn check_row(schema: &Schema, row: &Row) -> Result<()> {
    if row.arity() != schema.num_columns() {
        return Err(internal!(
            "row arity {} does not match schema arity {}",
            row.arity(),
            schema.num_columns()
        ));
    }
    for (value, field) in row.iter().zip(schema.fields()) {
        if !value.is_of_type(field.datatype) {
            return Err(TarsierError::TypeMismatch(format!(
                "value {:?} does not fit column {}",
                value, field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::datatype::DataType;
    use crate::repr::schema::Field;

    fn test_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
        ])
        .unwrap()
    }

    #[test]
    fn try_new_validates_rows() {
        let ok = Chunk::try_new(
            test_schema(),
            vec![
                Row::from(vec![Value::Int64(1), Value::from("one")]),
                Row::from(vec![Value::Int64(2), Value::Null]),
            ],
        );
        assert!(ok.is_ok());

        let bad = Chunk::try_new(
            test_schema(),
            vec![Row::from(vec![Value::from("one"), Value::Int64(1)])],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn vstack_requires_same_schema() {
        let a = Chunk::try_new(
            test_schema(),
            vec![Row::from(vec![Value::Int64(1), Value::from("one")])],
        )
        .unwrap();
        let b = Chunk::try_new(
            test_schema(),
            vec![Row::from(vec![Value::Int64(2), Value::from("two")])],
        )
        .unwrap();

        let stacked = a.vstack(b).unwrap();
        assert_eq!(stacked.num_rows(), 2);

        let other = Chunk::empty_with_schema(
            Schema::new(vec![Field::new("x", DataType::Bool)]).unwrap(),
        );
        assert!(stacked.vstack(other).is_err());
    }
}
