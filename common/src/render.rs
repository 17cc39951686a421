use crate::db::ResultSet;
use serde_json::Value;

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn border(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat(fill).take(width + 2));
        line.push('+');
    }
    line
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width - cell.chars().count();
        line.push(' ');
        line.push_str(cell);
        line.extend(std::iter::repeat(' ').take(pad + 1));
        line.push('|');
    }
    line
}

/// grid-style table with a header row, as printed by the shell
pub fn render_table(results: &ResultSet) -> String {
    let columns = results.columns();
    if columns.is_empty() {
        return String::new();
    }

    let body: Vec<Vec<String>> = results
        .rows()
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(c))).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![
        border(&widths, '-'),
        row_line(columns, &widths),
        border(&widths, '='),
    ];
    for cells in &body {
        lines.push(row_line(cells, &widths));
        lines.push(border(&widths, '-'));
    }
    if body.is_empty() {
        lines.pop();
        lines.push(border(&widths, '-'));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{shape, NativeRows, NativeValue};

    #[test]
    fn test_render_grid() {
        let results = shape(NativeRows::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![NativeValue::Int(1), NativeValue::Text("Ana".into())],
                vec![NativeValue::Int(10), NativeValue::Null],
            ],
        ));

        let expected = "\
+----+------+
| id | name |
+====+======+
| 1  | Ana  |
+----+------+
| 10 | NULL |
+----+------+";
        assert_eq!(render_table(&results), expected);
    }

    #[test]
    fn test_render_header_only() {
        let results = shape(NativeRows::empty(vec!["COUNT(*)".into()]));
        assert_eq!(
            render_table(&results),
            "+----------+\n| COUNT(*) |\n+----------+"
        );
    }

    #[test]
    fn test_render_without_columns() {
        assert_eq!(render_table(&ResultSet::default()), "");
    }
}
