use crate::errors::{Result, TarsierError};
use crate::repr::datatype::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Field {
        Field {
            name: name.into(),
            datatype,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.datatype)
    }
}

/// An ordered list of fields describing a relation.
///
/// Schemas produced by every plan node except `Join` have unique column
/// names. A join output may carry duplicates until a later projection or
/// rename disambiguates them; resolving a duplicated name errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create a schema, erroring on duplicate column names.
    pub fn new(fields: Vec<Field>) -> Result<Schema> {
        let schema = Schema { fields };
        if let Some(name) = schema.first_duplicate() {
            return Err(TarsierError::DuplicateColumn(name.to_string()));
        }
        Ok(schema)
    }

    /// Create a schema without checking name uniqueness. Used for the raw
    /// output of a join.
    pub fn new_unchecked(fields: Vec<Field>) -> Schema {
        Schema { fields }
    }

    pub fn empty() -> Schema {
        Schema { fields: Vec::new() }
    }

    /// Resolve a column name to its index.
    ///
    /// Errors with `UnresolvedColumn` if the name is absent, and with
    /// `AmbiguousColumn` if more than one column carries it.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        let mut found = None;
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name == name {
                if found.is_some() {
                    return Err(TarsierError::AmbiguousColumn(name.to_string()));
                }
                found = Some(idx);
            }
        }
        found.ok_or_else(|| TarsierError::UnresolvedColumn(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn num_columns(&self) -> usize {
        self.fields.len()
    }

    /// Project a subset of fields by index.
    pub fn project(&self, idxs: &[usize]) -> Result<Schema> {
        let mut out = Vec::with_capacity(idxs.len());
        for &idx in idxs {
            out.push(
                self.fields
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| crate::errors::internal!("schema index out of bounds: {}", idx))?,
            );
        }
        Ok(Schema { fields: out })
    }

    /// Concatenate two schemas, left then right, keeping duplicates.
    pub fn concat(&self, other: &Schema) -> Schema {
        let fields = self
            .fields
            .iter()
            .chain(other.fields.iter())
            .cloned()
            .collect();
        Schema { fields }
    }

    /// First column name appearing more than once, if any.
    pub fn first_duplicate(&self) -> Option<&str> {
        for (idx, field) in self.fields.iter().enumerate() {
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Some(&field.name);
            }
        }
        None
    }
}

impl From<Vec<Field>> for Schema {
    fn from(fields: Vec<Field>) -> Self {
        Schema { fields }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> Schema {
        Schema::new_unchecked(
            names
                .iter()
                .map(|n| Field::new(*n, DataType::Int64))
                .collect(),
        )
    }

    #[test]
    fn resolve_by_name() {
        let s = schema(&["a", "b", "c"]);
        assert_eq!(s.resolve("b").unwrap(), 1);
        assert!(matches!(
            s.resolve("missing"),
            Err(TarsierError::UnresolvedColumn(_))
        ));
    }

    #[test]
    fn resolve_duplicate_is_ambiguous() {
        let s = schema(&["a", "b", "a"]);
        assert!(matches!(
            s.resolve("a"),
            Err(TarsierError::AmbiguousColumn(_))
        ));
        assert_eq!(s.resolve("b").unwrap(), 1);
    }

    #[test]
    fn new_rejects_duplicates() {
        let fields = vec![
            Field::new("a", DataType::Int64),
            Field::new("a", DataType::Utf8),
        ];
        assert!(matches!(
            Schema::new(fields),
            Err(TarsierError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn concat_keeps_duplicates() {
        let s = schema(&["a", "b"]).concat(&schema(&["b", "c"]));
        assert_eq!(s.num_columns(), 4);
        assert_eq!(s.first_duplicate(), Some("b"));
    }
}
