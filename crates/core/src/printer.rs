use std::{fmt::Display, io::Write};

use anyhow::{Context, bail};
use clap::Args;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

#[derive(Debug, Args)]
pub struct PrinterArgs {
    /// The output format to use. Valid options are "plain", "table", "json", and "binary".
    #[arg(long, short = 'o', default_value_t = Format::default(), global = true)]
    pub output: Format,

    /// Pretty print JSON output. Ignored for every other format.
    #[arg(long, global = true)]
    pub pretty: bool,
}

impl PrinterArgs {
    /// Serialize `data` in the selected structured format, honoring `--pretty` for JSON.
    pub fn print_structured<S: Serialize, W: Write>(
        &self,
        data: S,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        if self.pretty && self.output == Format::Json {
            serde_json::to_writer_pretty(&mut *writer, &data).context("JSON serialization failed")?;
            writeln!(writer)?;
            return Ok(());
        }
        self.output.print_structured(data, writer)
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One item per line.
    #[default]
    Plain,
    /// Rows rendered as a text table.
    Table,
    Json,
    /// CBOR.
    Binary,
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Format::Plain),
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            "binary" | "cbor" => Ok(Format::Binary),
            _ => Err(anyhow::anyhow!("Unknown format: {}", s)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Format::Plain => "plain",
            Format::Table => "table",
            Format::Json => "json",
            Format::Binary => "binary",
        };
        write!(f, "{}", s)
    }
}

impl Format {
    /// Whether this format serializes data rather than rendering text.
    pub fn is_structured(&self) -> bool {
        matches!(self, Format::Json | Format::Binary)
    }

    /// Print the given data in the specified format to the given writer. If the format is not a
    /// structured type, this method will return an error.
    pub fn print_structured<S: Serialize, W: Write>(
        &self,
        data: S,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        match self {
            Format::Json => {
                serde_json::to_writer(&mut *writer, &data).context("JSON serialization failed")?;
                writeln!(writer)?;
                Ok(())
            }
            Format::Binary => {
                ciborium::into_writer(&data, writer).context("CBOR serialization failed")
            }
            Format::Plain | Format::Table => {
                bail!("{self} format cannot serialize structured data")
            }
        }
    }

    /// Print each item on its own line. Only valid for [`Format::Plain`].
    pub fn print_plain<T, D, W>(&self, data: T, writer: &mut W) -> anyhow::Result<()>
    where
        T: IntoIterator<Item = D>,
        D: Display,
        W: Write,
    {
        if *self != Format::Plain {
            bail!("{self} format not supported for plain text output");
        }
        for item in data {
            writeln!(writer, "{item}")?;
        }
        Ok(())
    }

    /// Render rows as a table. Only valid for [`Format::Table`].
    pub fn print_table<T, R, W>(&self, rows: T, writer: &mut W) -> anyhow::Result<()>
    where
        T: IntoIterator<Item = R>,
        R: Tabled,
        W: Write,
    {
        if *self != Format::Table {
            bail!("{self} format not supported for table output");
        }
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        writeln!(writer, "{table}")?;
        Ok(())
    }
}
