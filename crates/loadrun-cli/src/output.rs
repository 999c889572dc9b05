// Output formatting for CLI

use anyhow::Result;
use loadrun_core::{format_table_blocks, TableBlock};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            OutputFormat::Yaml => {
                print!("{}", serde_yaml::to_string(value)?);
            }
            OutputFormat::Text => {
                // Text format is handled by each command
            }
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print a table with upper-case headings and two spaces between columns
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    for line in table_lines(headers, rows) {
        println!("{}", line);
    }
}

fn table_lines(headers: &[&str], rows: Vec<Vec<String>>) -> Vec<String> {
    let mut cells = Vec::with_capacity(rows.len() + 1);
    cells.push(headers.iter().map(|h| h.to_uppercase()).collect());
    cells.extend(rows);

    format_table_blocks(&[TableBlock::new(cells).padding(2)])
}
