//! Output formatting for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;

/// Print data as pretty JSON on stdout
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}
