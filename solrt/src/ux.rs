use std::fmt;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{NOTHING, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::style::{style, Stylize};

#[must_use]
pub fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Borderless two column key value table
#[must_use]
pub fn new_properties_table() -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table
}

#[must_use]
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

#[must_use]
pub fn value_cell<T: fmt::Display>(value: T) -> Cell {
    Cell::new(value).add_attribute(Attribute::Bold)
}

#[must_use]
pub fn count_cell(count: usize) -> Cell {
    Cell::new(count)
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Single column table or `None` if there are no items
pub fn one_column_table<'a, I>(head: &str, items: I) -> Option<Table>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut table = new_table();
    table.set_header(vec![header_cell(head)]);
    for item in items {
        table.add_row(vec![item]);
    }
    if table.row_iter().next().is_none() {
        None
    } else {
        Some(table)
    }
}

pub fn write_solution_path(f: &mut fmt::Formatter<'_>, path: &str) -> fmt::Result {
    let path = style(path)
        .with(crossterm::style::Color::Rgb {
            r: 0xAA,
            g: 0xAA,
            b: 0xAA,
        })
        .bold();
    writeln!(f, " {path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![], true)]
    #[case(vec!["Debug"], false)]
    #[case(vec!["Debug", "Release"], false)]
    #[trace]
    fn one_column_table_tests(#[case] items: Vec<&str>, #[case] empty: bool) {
        // Arrange
        let count = items.len();

        // Act
        let table = one_column_table("Configuration", items);

        // Assert
        assert_eq!(empty, table.is_none());
        if let Some(t) = table {
            assert_eq!(count, t.row_iter().count());
            assert!(t.to_string().contains("Configuration"));
        }
    }
}
