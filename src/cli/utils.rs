use serde::Serialize;

use crate::cli::OutputFormat;

/// Print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T, output_format: OutputFormat) -> anyhow::Result<()> {
    let rendered = match output_format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Compact => serde_json::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}
