//! Data representations: scalar values, schemas, and materialized chunks.

pub mod chunk;
pub mod datatype;
pub mod fmt;
pub mod ordfloat;
pub mod schema;
