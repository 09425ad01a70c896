use std::{borrow::Cow, fmt::Write};

const COLUMN_GAP: &str = "  ";
const RULE: char = '-';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    /// Used for amounts so that the decimal points line up.
    Right,
}

struct Column<'a> {
    title: &'a str,
    align: Align,
}

/// Plain-text table: a title line, a rule, then one line per row.
#[derive(Default)]
pub struct TextTable<'a> {
    columns: Vec<Column<'a>>,
    rows: Vec<Vec<Cow<'a, str>>>,
}

impl<'a> TextTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, title: &'a str, align: Align) -> Self {
        self.columns.push(Column { title, align });
        self
    }

    pub fn row(mut self, cells: impl IntoIterator<Item = Cow<'a, str>>) -> Self {
        self.rows.push(cells.into_iter().collect());
        self
    }

    pub fn rows<R>(self, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = Cow<'a, str>>,
    {
        rows.into_iter().fold(self, |table, row| table.row(row))
    }

    /// Cells beyond the column count are dropped, missing ones render empty.
    /// Trailing spaces are trimmed from every line.
    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| display_width(cell))
                    .fold(display_width(column.title), usize::max)
            })
            .collect();

        let mut out = String::with_capacity(64 * (self.rows.len() + 2));
        let titles: Vec<&str> = self.columns.iter().map(|column| column.title).collect();
        self.render_line(&mut out, &titles, &widths);

        let rules: Vec<String> = widths
            .iter()
            .map(|width| std::iter::repeat_n(RULE, *width).collect())
            .collect();
        let _ = writeln!(out, "{}", rules.join(COLUMN_GAP));

        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(|cell| cell.as_ref()).collect();
            self.render_line(&mut out, &cells, &widths);
        }
        out
    }

    fn render_line(&self, out: &mut String, cells: &[&str], widths: &[usize]) {
        let mut line = String::new();
        for (idx, (column, width)) in self.columns.iter().zip(widths).enumerate() {
            if idx > 0 {
                line.push_str(COLUMN_GAP);
            }
            let cell = cells.get(idx).copied().unwrap_or_default();
            let padding = width.saturating_sub(display_width(cell));
            match column.align {
                Align::Left => {
                    line.push_str(cell);
                    line.extend(std::iter::repeat_n(' ', padding));
                }
                Align::Right => {
                    line.extend(std::iter::repeat_n(' ', padding));
                    line.push_str(cell);
                }
            }
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
}

/// Terminal columns taken by `text`; non-ASCII characters count double.
fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}
