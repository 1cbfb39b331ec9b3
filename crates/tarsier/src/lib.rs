//! Lazy tabular query building and evaluation.
//!
//! Frames are built fluently from a [`df::Session`]; every builder call
//! resolves names and checks types against the known schema, so a plan
//! that builds without error has a fixed output schema before any data is
//! read. Nothing is evaluated until one of the terminal calls (`count`,
//! `collect`, `show`) walks the plan against the session's [`source`].

pub mod df;
pub mod errors;
pub mod exec;
pub mod expr;
pub mod plan;
pub mod repr;
pub mod source;

pub use df::{DataFrame, GroupedDataFrame, Session};
pub use errors::{Result, TarsierError};
pub use expr::{
    avg, col, count, lag, lit, max, min, row_number, sum, AggExpr, Expr, WindowSpec,
};
pub use repr::chunk::{Chunk, Row};
pub use repr::datatype::{DataType, Value};
pub use repr::schema::{Field, Schema};
pub use source::{DataSource, MemorySource};
