//! End-to-end query tests through the public session API.

use std::collections::HashSet;
use std::sync::Arc;
use tarsier::{
    col, lag, lit, Chunk, DataType, Field, MemorySource, Row, Schema, Session, TarsierError,
    Value, WindowSpec,
};

/// `t(id:int, grp:string, val:int)` with three rows, plus a `names` lookup
/// table keyed by `grp`.
fn session() -> Session {
    let t = Chunk::try_new(
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("grp", DataType::Utf8),
            Field::new("val", DataType::Int64),
        ])
        .unwrap(),
        vec![
            Row::from(vec![Value::Int64(1), Value::from("a"), Value::Int64(10)]),
            Row::from(vec![Value::Int64(2), Value::from("a"), Value::Int64(20)]),
            Row::from(vec![Value::Int64(3), Value::from("b"), Value::Int64(5)]),
        ],
    )
    .unwrap();
    let names = Chunk::try_new(
        Schema::new(vec![
            Field::new("key", DataType::Utf8),
            Field::new("label", DataType::Utf8),
        ])
        .unwrap(),
        vec![
            Row::from(vec![Value::from("a"), Value::from("alpha")]),
            Row::from(vec![Value::from("b"), Value::from("beta")]),
        ],
    )
    .unwrap();
    let source = MemorySource::new()
        .with_table("t", t)
        .with_table("names", names);
    Session::new(Arc::new(source))
}

fn cell(chunk: &Chunk, row: usize, column: usize) -> Value {
    chunk.get_row(row).unwrap().get(column).unwrap().clone()
}

#[tokio::test]
async fn group_count_per_group() {
    let df = session()
        .table("t")
        .unwrap()
        .group_by(&["grp"])
        .unwrap()
        .count()
        .unwrap();

    let out = df.collect().await.unwrap();
    let got: HashSet<(Value, Value)> = out
        .rows()
        .iter()
        .map(|row| (row.get(0).unwrap().clone(), row.get(1).unwrap().clone()))
        .collect();
    let expected: HashSet<(Value, Value)> = [
        (Value::from("a"), Value::Int64(2)),
        (Value::from("b"), Value::Int64(1)),
    ]
    .into();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn filter_keeps_matching_rows() {
    let df = session()
        .table("t")
        .unwrap()
        .filter(col("val").gt(lit(8)))
        .unwrap();

    let out = df.collect().await.unwrap();
    assert_eq!(out.num_rows(), 2);
    assert_eq!(cell(&out, 0, 0), Value::Int64(1));
    assert_eq!(cell(&out, 1, 0), Value::Int64(2));
}

#[tokio::test]
async fn rename_then_select() {
    let df = session()
        .table("t")
        .unwrap()
        .rename("val", "v")
        .unwrap()
        .select(&["v"])
        .unwrap();

    assert_eq!(
        df.schema().fields(),
        &[Field::new("v", DataType::Int64)]
    );
    let out = df.collect().await.unwrap();
    assert_eq!(
        out.rows()
            .iter()
            .map(|row| row.get(0).unwrap().clone())
            .collect::<Vec<_>>(),
        vec![Value::Int64(10), Value::Int64(20), Value::Int64(5)]
    );
}

#[tokio::test]
async fn lag_per_partition() {
    let spec = WindowSpec::partition_by(["grp"]).order_by([col("id")]);
    let df = session()
        .table("t")
        .unwrap()
        .with_column("prev", lag("val", 1).over(spec))
        .unwrap();

    let out = df.collect().await.unwrap();
    assert_eq!(cell(&out, 0, 3), Value::Null);
    assert_eq!(cell(&out, 1, 3), Value::Int64(10));
    assert_eq!(cell(&out, 2, 3), Value::Null);
}

#[tokio::test]
async fn count_matches_collect() {
    let session = session();
    let plans = vec![
        session.table("t").unwrap(),
        session
            .table("t")
            .unwrap()
            .filter(col("val").gt(lit(8)))
            .unwrap(),
        session
            .table("t")
            .unwrap()
            .group_by(&["grp"])
            .unwrap()
            .count()
            .unwrap(),
        session.table("t").unwrap().limit(2),
    ];
    for df in plans {
        assert_eq!(df.count().await.unwrap(), df.collect().await.unwrap().num_rows());
    }
}

#[tokio::test]
async fn declared_schema_matches_materialized() {
    let df = session()
        .table("t")
        .unwrap()
        .rename("val", "v")
        .unwrap()
        .filter(col("v").gt(lit(0)))
        .unwrap()
        .sort(&[col("v").desc()])
        .unwrap();

    let declared = df.schema().clone();
    let out = df.collect().await.unwrap();
    assert_eq!(out.schema(), &declared);
}

#[tokio::test]
async fn join_commutative_in_content() {
    let session = session();
    let t = session.table("t").unwrap();
    let names = session.table("names").unwrap();
    let pred = col("grp").eq(col("key"));

    let ab = t.join(&names, pred.clone()).unwrap().collect().await.unwrap();
    let ba = names.join(&t, pred).unwrap().collect().await.unwrap();
    assert_eq!(ab.num_rows(), ba.num_rows());

    // Same rows up to column reordering: t's columns sit at 0..3 on one
    // side and 2..5 on the other.
    let ab_rows: HashSet<Vec<Value>> = ab
        .rows()
        .iter()
        .map(|row| row.values().to_vec())
        .collect();
    let ba_rows: HashSet<Vec<Value>> = ba
        .rows()
        .iter()
        .map(|row| {
            let v = row.values();
            vec![
                v[2].clone(),
                v[3].clone(),
                v[4].clone(),
                v[0].clone(),
                v[1].clone(),
            ]
        })
        .collect();
    assert_eq!(ab_rows, ba_rows);
}

#[tokio::test]
async fn join_without_matches_is_empty() {
    let session = session();
    let t = session
        .table("t")
        .unwrap()
        .filter(col("grp").eq(lit("zzz")))
        .unwrap();
    let names = session.table("names").unwrap();

    let out = t
        .join(&names, col("grp").eq(col("key")))
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(out.num_rows(), 0);
    assert_eq!(out.schema().num_columns(), 5);
}

#[tokio::test]
async fn sort_is_stable() {
    let df = session()
        .table("t")
        .unwrap()
        .sort(&[col("grp")])
        .unwrap();

    let out = df.collect().await.unwrap();
    // Both "a" rows keep their input order under the duplicated key.
    assert_eq!(cell(&out, 0, 0), Value::Int64(1));
    assert_eq!(cell(&out, 1, 0), Value::Int64(2));
    assert_eq!(cell(&out, 2, 0), Value::Int64(3));
}

#[tokio::test]
async fn limit_truncates() {
    let out = session()
        .table("t")
        .unwrap()
        .limit(2)
        .collect()
        .await
        .unwrap();
    assert_eq!(out.num_rows(), 2);

    // A limit larger than the input is a no-op.
    let out = session()
        .table("t")
        .unwrap()
        .limit(100)
        .collect()
        .await
        .unwrap();
    assert_eq!(out.num_rows(), 3);
}

#[tokio::test]
async fn shared_plan_feeds_two_frames() {
    let session = session();
    let base = session
        .table("t")
        .unwrap()
        .filter(col("val").gt(lit(8)))
        .unwrap();

    let counted = base.group_by(&["grp"]).unwrap().count().unwrap();
    let limited = base.limit(1);
    assert_eq!(counted.count().await.unwrap(), 1);
    assert_eq!(limited.count().await.unwrap(), 1);
    // The shared base is unchanged.
    assert_eq!(base.count().await.unwrap(), 2);
}

#[tokio::test]
async fn ambiguous_output_rejected_at_collect() {
    let session = session();
    // Rename so the join produces two columns both called "val".
    let names = session
        .table("names")
        .unwrap()
        .rename("label", "val")
        .unwrap();
    // The join key is unambiguous, so the join itself builds.
    let joined = session
        .table("t")
        .unwrap()
        .join(&names, col("grp").eq(col("key")))
        .unwrap();

    assert!(matches!(
        joined.collect().await,
        Err(TarsierError::AmbiguousColumn(_))
    ));
    // Disambiguating fixes it.
    let out = joined
        .select(&["id", "key"])
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(out.num_rows(), 3);
}

#[tokio::test]
async fn computed_column_arithmetic() {
    let df = session()
        .table("t")
        .unwrap()
        .with_column("ratio", ((lit(1.0) * col("val")) / lit(4.0)).round(1))
        .unwrap();

    assert_eq!(
        df.schema().field(3).unwrap().datatype,
        DataType::Float64
    );
    let out = df.collect().await.unwrap();
    assert_eq!(cell(&out, 0, 3), Value::from(2.5));
    // 5 / 4 rounds half away from zero.
    assert_eq!(cell(&out, 2, 3), Value::from(1.3));
}

#[tokio::test]
async fn show_rendering() {
    let df = session().table("t").unwrap();

    let rendered = df.format(2, None).await.unwrap();
    assert!(rendered.contains("id"));
    assert!(rendered.contains("(1 more rows)"));

    assert!(matches!(
        df.format(10, Some(3)).await,
        Err(TarsierError::InvalidArgument(_))
    ));
}
