//! Output formatting: table, JSON, plain.
//!
//! Table uses `tabled`, JSON uses serde, plain emits bare values one per line.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Plain => data.iter().map(plain_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single item. Table format shows a two-column key/value view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    fields: impl Fn(&T) -> Vec<(&'static str, String)>,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = fields(data)
                .into_iter()
                .map(|(field, value)| FieldRow { field, value })
                .collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Plain => plain_fn(data),
    })
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    #[test]
    fn plain_is_one_value_per_line() {
        let items = [Item { name: "a" }, Item { name: "b" }];
        let out = render_list(
            OutputFormat::Plain,
            &items,
            |i| ItemRow { name: i.name },
            |i| i.name.to_string(),
        )
        .expect("render");
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn json_uses_serde_field_names() {
        let out = render_single(
            OutputFormat::Json,
            &Item { name: "a" },
            |_| Vec::new(),
            |i| i.name.to_string(),
        )
        .expect("render");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["name"], "a");
    }

    #[test]
    fn table_lists_fields() {
        let out = render_single(
            OutputFormat::Table,
            &Item { name: "a" },
            |i| vec![("Name", i.name.to_string())],
            |i| i.name.to_string(),
        )
        .expect("render");
        assert!(out.contains("Field"));
        assert!(out.contains("Name"));
    }
}
