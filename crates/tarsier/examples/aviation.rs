//! Aviation analytics over in-memory tables: carrier popularity, plane
//! models on long-haul routes, month-over-month flight changes, and route
//! rankings per origin airport.

use std::sync::Arc;
use tarsier::{
    col, lag, lit, row_number, Chunk, DataType, Field, MemorySource, Result, Row, Schema,
    Session, Value, WindowSpec,
};

fn table(fields: Vec<(&str, DataType)>, rows: Vec<Vec<Value>>) -> Result<Chunk> {
    let schema = Schema::new(
        fields
            .into_iter()
            .map(|(name, ty)| Field::new(name, ty))
            .collect(),
    )?;
    Chunk::try_new(schema, rows.into_iter().map(Row::from).collect())
}

fn flights() -> Result<Chunk> {
    let row = |carrier: &str, tail: &str, orig: &str, dest: &str, dist: i64, month: i64| {
        vec![
            Value::from(carrier),
            Value::from(tail),
            Value::from(orig),
            Value::from(dest),
            Value::Int64(dist),
            Value::Int64(month),
        ]
    };
    table(
        vec![
            ("unique_carrier", DataType::Utf8),
            ("tail_number", DataType::Utf8),
            ("origination", DataType::Utf8),
            ("destination", DataType::Utf8),
            ("distance", DataType::Int64),
            ("month", DataType::Int64),
        ],
        vec![
            row("AA", "N101", "JFK", "LAX", 2475, 1),
            row("AA", "N102", "JFK", "LAX", 2475, 1),
            row("AA", "N101", "JFK", "SFO", 2586, 1),
            row("AA", "N103", "JFK", "LAX", 2475, 2),
            row("UA", "N201", "ORD", "SFO", 1846, 1),
            row("UA", "N202", "ORD", "SFO", 1846, 2),
            row("UA", "N201", "ORD", "DEN", 888, 2),
            row("UA", "N203", "ORD", "DEN", 888, 2),
            row("DL", "N301", "ATL", "JFK", 760, 1),
            row("DL", "N301", "ATL", "LAX", 1946, 2),
            row("DL", "N302", "ATL", "JFK", 760, 2),
            row("WN", "N401", "DAL", "HOU", 239, 1),
        ],
    )
}

fn airports() -> Result<Chunk> {
    let row = |code: &str, country: &str| vec![Value::from(code), Value::from(country)];
    table(
        vec![("code", DataType::Utf8), ("country", DataType::Utf8)],
        vec![
            row("JFK", "USA"),
            row("LAX", "USA"),
            row("SFO", "USA"),
            row("ORD", "USA"),
            row("YYZ", "Canada"),
            row("YVR", "Canada"),
            row("LHR", "UK"),
        ],
    )
}

fn carriers() -> Result<Chunk> {
    let row = |code: &str, name: &str| vec![Value::from(code), Value::from(name)];
    table(
        vec![("code", DataType::Utf8), ("name", DataType::Utf8)],
        vec![
            row("AA", "American Airlines"),
            row("UA", "United Airlines"),
            row("DL", "Delta Air Lines"),
            row("WN", "Southwest Airlines"),
        ],
    )
}

fn planes() -> Result<Chunk> {
    let row = |tail: &str, model: Option<&str>| vec![Value::from(tail), Value::from(model)];
    table(
        vec![("tail_number", DataType::Utf8), ("model", DataType::Utf8)],
        vec![
            row("N101", Some("737-800")),
            row("N102", Some("A321")),
            row("N103", Some("737-800")),
            row("N201", Some("777-200")),
            row("N202", None),
            row("N203", Some("A320")),
            row("N301", Some("A321")),
            row("N302", Some("767-300")),
            row("N401", Some("737-700")),
        ],
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let source = MemorySource::new()
        .with_table("raw_flight", flights()?)
        .with_table("raw_airport", airports()?)
        .with_table("raw_carrier", carriers()?)
        .with_table("raw_plane", planes()?);
    let session = Session::new(Arc::new(source));

    let all_flights = session.table("raw_flight")?;
    println!("{} flights total\n", all_flights.count().await?);

    // Airports per country, most first.
    let most_airports = session
        .table("raw_airport")?
        .group_by(&["country"])?
        .count()?
        .sort(&[col("count").desc()])?;
    most_airports.show().await?;

    // Flights per carrier, most first.
    let most_flights = session
        .table("raw_flight")?
        .group_by(&["unique_carrier"])?
        .count()?
        .rename("unique_carrier", "carr")?
        .sort(&[col("count").desc()])?;
    most_flights.show_limit(5).await?;

    // Attach the carrier names to the counts.
    let all_carriers = session.table("raw_carrier")?;
    let top_carrier_names = most_flights
        .join(&all_carriers, col("carr").eq(col("code")))?
        .drop(&["code"])?
        .sort(&[col("count").desc()])?;
    top_carrier_names.show_truncate(5, 30).await?;

    // Which plane models fly the long-haul routes?
    let trimmed_flights = session
        .table("raw_flight")?
        .rename("tail_number", "tnbr")?
        .select(&["tnbr", "distance"])?
        .filter(col("distance").gt(lit(1500)))?;
    let trimmed_planes = session
        .table("raw_plane")?
        .select(&["tail_number", "model"])?
        .filter(col("model").is_not_null())?;
    let long_haul_models = trimmed_flights
        .join(&trimmed_planes, col("tnbr").eq(col("tail_number")))?
        .drop(&["tail_number"])?
        .group_by(&["model"])?
        .count()?
        .sort(&[col("count").desc()])?;
    long_haul_models.show().await?;

    // Flight counts per origin airport and month.
    let agg_flights = session
        .table("raw_flight")?
        .select(&["origination", "month"])?
        .rename("origination", "orig")?
        .group_by(&["orig", "month"])?
        .count()?
        .rename("count", "num_fs")?;

    // Month-over-month change per origin.
    let by_month = WindowSpec::partition_by(["orig"]).order_by([col("month")]);
    let change_flights =
        agg_flights.with_column("num_fs_b4", lag("num_fs", 1).over(by_month))?;
    let with_change = change_flights.with_column(
        "perc_chg",
        ((lit(1.0) * (col("num_fs") - col("num_fs_b4"))) / (lit(1.0) * col("num_fs_b4")))
            .round(1),
    )?;
    with_change.show().await?;

    // Rank routes within each origin by flight count.
    let popular_routes = session
        .table("raw_flight")?
        .rename("origination", "orig")?
        .rename("destination", "dest")?
        .group_by(&["orig", "dest"])?
        .count()?
        .rename("count", "num_fs")?;
    let by_count = WindowSpec::partition_by(["orig"]).order_by([col("num_fs").desc()]);
    let ranked_routes = popular_routes.with_column("rank", row_number().over(by_count))?;
    let top_routes = ranked_routes
        .filter(col("rank").lt_eq(lit(3)))?
        .sort(&[col("orig"), col("rank")])?;
    top_routes.show_limit(17).await?;

    Ok(())
}
