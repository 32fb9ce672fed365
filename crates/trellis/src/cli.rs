use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trellis_core::ComponentRecord;
use trellis_core::kernel::constants::CONFIG_FILE_NAME;

/// Trellis: discover, order and load components
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    pub ping: bool,

    /// Settings file (.toml, .yaml or .json)
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Additional component directory; may be repeated
    #[arg(long = "dir", global = true, value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover and load all components, then report their status
    List {
        /// Print JSON snapshots instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a component identifier to the disabled list
    Disable {
        /// Identifier of the component (`name.vendor`)
        identifier: String,
    },
    /// Remove a component identifier from the disabled list
    Enable {
        /// Identifier of the component (`name.vendor`)
        identifier: String,
    },
}

const HEADERS: [&str; 4] = ["NAME", "VERSION", "IDENTIFIER", "STATUS"];

/// Renders records as an aligned table.
pub fn render_table(records: &[ComponentRecord]) -> String {
    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|record| {
            [
                record.name().to_string(),
                record.version_string(),
                record.identifier().to_string(),
                record.status().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: [&str; 4]| {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
            }
        }
        line
    };

    let mut out = format_row(HEADERS);
    for row in &rows {
        out.push('\n');
        out.push_str(&format_row([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()]));
    }
    out
}
