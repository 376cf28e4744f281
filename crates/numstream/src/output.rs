use std::io::Write;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::exit::{CliError, CliResult, FAILURE};

#[derive(Clone, Debug, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ValueCount {
    pub value: i64,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct CountReport {
    pub seed: i64,
    pub limit: u64,
    pub items: u64,
    pub distinct: usize,
    pub elapsed_ms: u128,
    pub throughput: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top: Vec<ValueCount>,
}

pub fn render_count(report: &CountReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!("throughput {}", report.throughput);
            for entry in &report.top {
                out.push_str(&format!("\n{} {}", entry.value, entry.count));
            }
            out
        }
        OutputFormat::Json => {
            serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEED", "LIMIT", "ITEMS", "DISTINCT", "ELAPSED MS", "THROUGHPUT"])
                .add_row(vec![
                    report.seed.to_string(),
                    report.limit.to_string(),
                    report.items.to_string(),
                    report.distinct.to_string(),
                    report.elapsed_ms.to_string(),
                    format!("{:.2}", report.throughput),
                ]);
            if report.top.is_empty() {
                return table.to_string();
            }

            let mut top = Table::new();
            top.load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["VALUE", "COUNT"]);
            for entry in &report.top {
                top.add_row(vec![entry.value.to_string(), entry.count.to_string()]);
            }
            format!("{table}\n{top}")
        }
    }
}

pub fn print_line(text: &str) -> CliResult<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{text}")
        .and_then(|()| out.flush())
        .map_err(|err| CliError::new(FAILURE, format!("stdout write failed: {err}")))
}
