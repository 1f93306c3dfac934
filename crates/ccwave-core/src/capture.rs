//! Readers for SPI transfer exports produced by logic-analyzer software.
//!
//! Two layouts are understood:
//!
//! * CSV with a header row naming at least `type`, `start_time`, `mosi`,
//!   `miso` and either `duration` or `end_time`. Byte cells hold `0x`-prefixed
//!   hex; an empty cell means the channel was not decoded.
//! * JSON lines, one object per transfer:
//!   `{"type":"result","start_time":0.1,"end_time":0.100002,"mosi":"3F","miso":"0F"}`.

use std::io::BufRead;

use ccwave_decode::{SpiTransfer, TimeSpan, TransferKind};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureFormat {
    Csv,
    JsonLines,
}

impl std::str::FromStr for CaptureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "jsonl" | "ndjson" | "json" => Self::JsonLines,
            other => return Err(format!("unknown capture format '{other}'")),
        })
    }
}

impl CaptureFormat {
    /// Guesses the format from a file extension, defaulting to CSV.
    pub fn from_extension(ext: Option<&str>) -> Self {
        ext.and_then(|e| e.parse().ok()).unwrap_or(Self::Csv)
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("missing '{0}' column in CSV header")]
    MissingColumn(&'static str),
    #[error("line {line}: expected {expected} columns, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: bad {column} value '{value}'")]
    Field {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: bad hex in {column}: {source}")]
    Hex {
        line: usize,
        column: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy)]
enum Extent {
    Duration(usize),
    EndTime(usize),
}

/// Column positions taken from the CSV header.
#[derive(Debug, Clone, Copy)]
struct CsvColumns {
    kind: usize,
    start: usize,
    extent: Extent,
    mosi: usize,
    miso: usize,
}

impl CsvColumns {
    fn from_header(header: &str) -> Result<Self, CaptureError> {
        let names: Vec<String> = split_csv(header)
            .iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        let find = |name: &'static str| names.iter().position(|n| n == name);
        let require = |name: &'static str| find(name).ok_or(CaptureError::MissingColumn(name));

        let extent = match (find("duration"), find("end_time")) {
            (Some(i), _) => Extent::Duration(i),
            (None, Some(i)) => Extent::EndTime(i),
            (None, None) => return Err(CaptureError::MissingColumn("duration")),
        };
        Ok(Self {
            kind: require("type")?,
            start: require("start_time")?,
            extent,
            mosi: require("mosi")?,
            miso: require("miso")?,
        })
    }

    fn width(&self) -> usize {
        let extent = match self.extent {
            Extent::Duration(i) | Extent::EndTime(i) => i,
        };
        [self.kind, self.start, extent, self.mosi, self.miso]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }

    fn parse_row(&self, line: usize, row: &str) -> Result<SpiTransfer, CaptureError> {
        let cells = split_csv(row);
        if cells.len() < self.width() {
            return Err(CaptureError::ShortRow {
                line,
                expected: self.width(),
                found: cells.len(),
            });
        }

        let start_s = parse_time(line, "start_time", &cells[self.start])?;
        let end_s = match self.extent {
            Extent::Duration(i) => start_s + parse_time(line, "duration", &cells[i])?,
            Extent::EndTime(i) => parse_time(line, "end_time", &cells[i])?,
        };
        Ok(SpiTransfer {
            kind: parse_kind(line, &cells[self.kind])?,
            mosi: parse_bytes(line, "mosi", &cells[self.mosi])?,
            miso: parse_bytes(line, "miso", &cells[self.miso])?,
            span: TimeSpan::new(start_s, end_s),
        })
    }
}

#[derive(Debug, Deserialize)]
struct JsonTransfer {
    #[serde(rename = "type", default = "result_kind")]
    kind: TransferKind,
    start_time: f64,
    end_time: f64,
    #[serde(default)]
    mosi: Option<String>,
    #[serde(default)]
    miso: Option<String>,
}

fn result_kind() -> TransferKind {
    TransferKind::Result
}

impl JsonTransfer {
    fn into_transfer(self, line: usize) -> Result<SpiTransfer, CaptureError> {
        let mosi = match self.mosi {
            Some(hex) => parse_bytes(line, "mosi", &hex)?,
            None => None,
        };
        let miso = match self.miso {
            Some(hex) => parse_bytes(line, "miso", &hex)?,
            None => None,
        };
        Ok(SpiTransfer {
            kind: self.kind,
            mosi,
            miso,
            span: TimeSpan::new(self.start_time, self.end_time),
        })
    }
}

/// Streams transfers out of a capture export in file order.
pub struct CaptureReader<R> {
    lines: std::io::Lines<R>,
    format: CaptureFormat,
    columns: Option<CsvColumns>,
    line: usize,
}

impl<R: BufRead> CaptureReader<R> {
    pub fn new(reader: R, format: CaptureFormat) -> Self {
        Self {
            lines: reader.lines(),
            format,
            columns: None,
            line: 0,
        }
    }

    fn parse_line(&mut self, text: &str) -> Result<Option<SpiTransfer>, CaptureError> {
        match self.format {
            CaptureFormat::JsonLines => {
                let raw: JsonTransfer = serde_json::from_str(text).map_err(|source| {
                    CaptureError::Json {
                        line: self.line,
                        source,
                    }
                })?;
                raw.into_transfer(self.line).map(Some)
            }
            CaptureFormat::Csv => match self.columns {
                Some(columns) => columns.parse_row(self.line, text).map(Some),
                None => {
                    self.columns = Some(CsvColumns::from_header(text)?);
                    Ok(None)
                }
            },
        }
    }
}

impl<R: BufRead> Iterator for CaptureReader<R> {
    type Item = Result<SpiTransfer, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match self.parse_line(text) {
                Ok(Some(transfer)) => return Some(Ok(transfer)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Splits one CSV row. Quoted cells may contain commas; quotes are stripped.
fn split_csv(row: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    for c in row.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell).trim().to_string()),
            c => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn parse_kind(line: usize, cell: &str) -> Result<TransferKind, CaptureError> {
    Ok(match cell.to_ascii_lowercase().as_str() {
        "result" => TransferKind::Result,
        "enable" => TransferKind::Enable,
        "disable" => TransferKind::Disable,
        "error" => TransferKind::Error,
        _ => {
            return Err(CaptureError::Field {
                line,
                column: "type",
                value: cell.to_string(),
            })
        }
    })
}

fn parse_time(line: usize, column: &'static str, cell: &str) -> Result<f64, CaptureError> {
    cell.parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| CaptureError::Field {
            line,
            column,
            value: cell.to_string(),
        })
}

/// `0x3F`, `3F`, `0x3F0A` or `0x3 F` all decode; empty means no data.
fn parse_bytes(line: usize, column: &'static str, cell: &str) -> Result<Option<Vec<u8>>, CaptureError> {
    let digits: String = cell
        .split_whitespace()
        .map(|part| {
            part.strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part)
        })
        .map(|part| {
            if part.len() % 2 == 1 {
                format!("0{part}")
            } else {
                part.to_string()
            }
        })
        .collect();
    if digits.is_empty() {
        return Ok(None);
    }
    hex::decode(&digits)
        .map(Some)
        .map_err(|source| CaptureError::Hex {
            line,
            column,
            source,
        })
}
