//! Output formatting for command results

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

/// Serialize `data` and print it in the requested format
pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(data).context("serializing output")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&value)?);
        }
        OutputFormat::Table => {
            print_as_table(&value)?;
        }
    }
    Ok(())
}

fn print_as_table(value: &Value) -> Result<()> {
    match value {
        Value::Array(items) if !items.is_empty() => {
            // Column per key, scalar cells only; nested values render as
            // compact JSON.
            let mut columns: Vec<String> = Vec::new();
            for item in items {
                if let Value::Object(map) = item {
                    for key in map.keys() {
                        if !columns.contains(key) {
                            columns.push(key.clone());
                        }
                    }
                }
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(columns.clone());
            for item in items {
                let row: Vec<String> = columns
                    .iter()
                    .map(|key| cell_text(item.get(key).unwrap_or(&Value::Null)))
                    .collect();
                table.add_row(row);
            }
            println!("{table}");
        }
        Value::Object(map) if !map.is_empty() => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(vec!["field", "value"]);
            for (key, val) in map {
                table.add_row(vec![key.clone(), cell_text(val)]);
            }
            println!("{table}");
        }
        other => {
            println!("{}", cell_text(other));
        }
    }
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => serde_json::to_string(nested).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text_scalars() {
        assert_eq!(cell_text(&json!("abc")), "abc");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn test_cell_text_nested_values_render_as_json() {
        assert_eq!(cell_text(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(cell_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_print_output_accepts_all_formats() {
        let data = json!([{"name": "peer1", "state": "Connected"}]);
        for format in [OutputFormat::Json, OutputFormat::Yaml, OutputFormat::Table] {
            print_output(data.clone(), format).unwrap();
        }
    }
}
