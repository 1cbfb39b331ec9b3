//! Fixed-width rendering of chunks for `show`.

use crate::repr::chunk::Chunk;

/// Render up to `max_rows` rows of the chunk as a fixed-width table.
///
/// When `truncate` is set, cell contents longer than the width are cut and
/// suffixed with `...`. Headers are never truncated.
pub fn format_chunk(chunk: &Chunk, max_rows: usize, truncate: Option<usize>) -> String {
    let shown = chunk.rows().iter().take(max_rows);

    let mut cells: Vec<Vec<String>> = Vec::new();
    let header: Vec<String> = chunk
        .schema()
        .fields()
        .iter()
        .map(|f| f.name.clone())
        .collect();

    for row in shown {
        let rendered = row
            .iter()
            .map(|v| truncate_cell(v.to_string(), truncate))
            .collect();
        cells.push(rendered);
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            out.push('+');
        }
        out.push_str(&"-".repeat(width + 2));
    }
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row, &widths);
    }

    let remaining = chunk.num_rows().saturating_sub(max_rows);
    if remaining > 0 {
        out.push_str(&format!("({} more rows)\n", remaining));
    }
    out
}

fn truncate_cell(cell: String, truncate: Option<usize>) -> String {
    match truncate {
        Some(width) if cell.chars().count() > width => {
            let cut: String = cell.chars().take(width.saturating_sub(3)).collect();
            format!("{}...", cut)
        }
        _ => cell,
    }
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            out.push('|');
        }
        out.push(' ');
        out.push_str(cell);
        let pad = widths[idx].saturating_sub(cell.chars().count());
        out.push_str(&" ".repeat(pad + 1));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::chunk::Row;
    use crate::repr::datatype::{DataType, Value};
    use crate::repr::schema::{Field, Schema};

    fn chunk() -> Chunk {
        Chunk::try_new(
            Schema::new(vec![
                Field::new("name", DataType::Utf8),
                Field::new("count", DataType::Int64),
            ])
            .unwrap(),
            vec![
                Row::from(vec![Value::from("american airlines"), Value::Int64(10)]),
                Row::from(vec![Value::from("ba"), Value::Int64(2)]),
                Row::from(vec![Value::Null, Value::Int64(1)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn renders_all_rows() {
        let out = format_chunk(&chunk(), 10, None);
        assert!(out.contains("american airlines"));
        assert!(out.contains("NULL"));
        assert!(!out.contains("more rows"));
    }

    #[test]
    fn bounds_row_count() {
        let out = format_chunk(&chunk(), 1, None);
        assert!(out.contains("american airlines"));
        assert!(!out.contains(" ba "));
        assert!(out.contains("(2 more rows)"));
    }

    #[test]
    fn truncates_cells() {
        let out = format_chunk(&chunk(), 10, Some(10));
        assert!(out.contains("america..."));
        assert!(!out.contains("american airlines"));
        // Short cells are left alone.
        assert!(out.contains("ba"));
    }
}
