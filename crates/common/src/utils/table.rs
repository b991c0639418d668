/// Renders rows as a plain text grid table.
///
/// Columns in which every cell is a number are right-aligned, all others are
/// left-aligned. The header row is separated from the body by a `=` rule.
///
/// ```
/// use txplain_common::utils::table::render_grid;
///
/// let table = render_grid(&["Asset", "Balance Change"], &[vec!["WETH".to_string(), "-0.5".to_string()]]);
/// assert_eq!(
///     table,
///     "+-------+----------------+\n\
///      | Asset | Balance Change |\n\
///      +=======+================+\n\
///      | WETH  |           -0.5 |\n\
///      +-------+----------------+"
/// );
/// ```
pub fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let columns = headers.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));

    let header = |i: usize| headers.get(i).copied().unwrap_or("");

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .map(|row| cell(row, i).chars().count())
                .chain(std::iter::once(header(i).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let numeric: Vec<bool> = (0..columns)
        .map(|i| !rows.is_empty() && rows.iter().all(|row| cell(row, i).parse::<f64>().is_ok()))
        .collect();

    let rule = |fill: char| -> String {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&fill.to_string().repeat(width + 2));
            line.push('+');
        }
        line
    };

    let line = |values: Vec<&str>| -> String {
        let mut line = String::from("|");
        for (i, value) in values.iter().enumerate() {
            let padding = " ".repeat(widths[i] - value.chars().count());
            match numeric[i] {
                true => line.push_str(&format!(" {padding}{value} |")),
                false => line.push_str(&format!(" {value}{padding} |")),
            }
        }
        line
    };

    let mut output = vec![rule('-'), line((0..columns).map(header).collect()), rule('=')];
    for row in rows {
        output.push(line((0..columns).map(|i| cell(row, i)).collect()));
        output.push(rule('-'));
    }
    if rows.is_empty() {
        output.pop();
        output.push(rule('-'));
    }

    output.join("\n")
}

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}
