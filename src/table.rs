use std::fmt::Write as _;

/// Renders left-aligned columns separated by two spaces, with a dashed rule
/// under the header. Control whitespace inside cells is flattened.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let flatten = |value: &str| value.replace(['\n', '\r', '\t'], " ");
    let header_cells = headers.iter().map(|h| flatten(h.as_str())).collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(headers.len())
                .map(|cell| flatten(cell.as_str()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = header_cells
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in &body {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let mut output = String::new();
    for line in std::iter::once(&header_cells)
        .chain(std::iter::once(&rule))
        .chain(body.iter())
    {
        let _ = writeln!(output, "{}", format_line(line, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let headers = vec!["input".to_string(), "output".to_string()];
        let rows = vec![
            vec!["45:08.3".to_string(), "1900-01-01 00:45:08.300".to_string()],
            vec!["".to_string(), "1900-01-01 00:00:00".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "input    output");
        assert_eq!(lines[1], "-------  -----------------------");
        assert_eq!(lines[2], "45:08.3  1900-01-01 00:45:08.300");
        assert_eq!(lines[3], "         1900-01-01 00:00:00");
    }
}
