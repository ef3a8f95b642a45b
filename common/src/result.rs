use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use tracing::debug;

use crate::error::ReportError;

pub const CORPUS: &str = "corpus";
pub const SCHEME: &str = "scheme";
pub const COMPRESSION_RATIO: &str = "compression ratio";
pub const COMPRESSION_SPEED: &str = "compression speed (MB/s)";
pub const COMPRESSION_SPEED_STD: &str = "compression speed standard deviation (MB/s)";
pub const DECOMPRESSION_SPEED: &str = "decompression speed (MB/s)";
pub const DECOMPRESSION_SPEED_STD: &str = "decompression speed standard deviation (MB/s)";

pub const COLUMNS: [&str; 7] = [
    CORPUS,
    SCHEME,
    COMPRESSION_RATIO,
    COMPRESSION_SPEED,
    COMPRESSION_SPEED_STD,
    DECOMPRESSION_SPEED,
    DECOMPRESSION_SPEED_STD,
];

/// Where a row came from, for error messages raised when a field is parsed
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowOrigin {
    pub path: Arc<PathBuf>,
    pub line: u64,
}

/// A throughput sample in MB/s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub mean: f64,
    pub stddev: f64,
}

/// One benchmark observation. Numeric columns stay text until a chart asks
/// for them; an empty decompression speed marks a scheme that was only
/// benchmarked for compression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultRow {
    pub corpus: String,
    pub scheme: String,
    #[serde(rename = "compression ratio")]
    compression_ratio: String,
    #[serde(rename = "compression speed (MB/s)")]
    compression_speed: String,
    #[serde(rename = "compression speed standard deviation (MB/s)")]
    compression_speed_std: String,
    #[serde(rename = "decompression speed (MB/s)")]
    decompression_speed: String,
    #[serde(rename = "decompression speed standard deviation (MB/s)")]
    decompression_speed_std: String,
    #[serde(skip)]
    origin: RowOrigin,
}

impl ResultRow {
    pub fn origin(&self) -> &RowOrigin {
        &self.origin
    }

    pub fn compression_ratio(&self) -> Result<f64, ReportError> {
        let ratio = self.required(COMPRESSION_RATIO, &self.compression_ratio)?;
        if ratio <= 0.0 {
            return Err(self.error(format!("{COMPRESSION_RATIO} must be positive, got {ratio}")));
        }
        Ok(ratio)
    }

    /// `1 - compressed size / uncompressed size`
    pub fn space_savings(&self) -> Result<f64, ReportError> {
        Ok(1.0 - 1.0 / self.compression_ratio()?)
    }

    pub fn compression_speed(&self) -> Result<Throughput, ReportError> {
        Ok(Throughput {
            mean: self.required(COMPRESSION_SPEED, &self.compression_speed)?,
            stddev: self.required(COMPRESSION_SPEED_STD, &self.compression_speed_std)?,
        })
    }

    pub fn decompression_speed(&self) -> Result<Option<Throughput>, ReportError> {
        match self.optional(DECOMPRESSION_SPEED, &self.decompression_speed)? {
            Some(mean) => Ok(Some(Throughput {
                mean,
                stddev: self.required(DECOMPRESSION_SPEED_STD, &self.decompression_speed_std)?,
            })),
            None => Ok(None),
        }
    }

    /// Parses every numeric column once so a malformed row is caught before
    /// anything is drawn
    pub fn validate(&self) -> Result<(), ReportError> {
        self.compression_ratio()?;
        self.compression_speed()?;
        self.decompression_speed()?;
        Ok(())
    }

    fn optional(&self, column: &str, value: &str) -> Result<Option<f64>, ReportError> {
        if value.is_empty() {
            return Ok(None);
        }
        let parsed = value
            .parse::<f64>()
            .map_err(|_| self.error(format!("{column}: {value:?} is not a number")))?;
        if !parsed.is_finite() || parsed < 0.0 {
            return Err(self.error(format!("{column}: {value:?} is out of range")));
        }
        Ok(Some(parsed))
    }

    fn required(&self, column: &str, value: &str) -> Result<f64, ReportError> {
        self.optional(column, value)?
            .ok_or_else(|| self.error(format!("{column} is empty")))
    }

    fn error(&self, message: String) -> ReportError {
        ReportError::data_format(
            self.origin.path.as_path(),
            format!("line {}: {message}", self.origin.line),
        )
    }
}

/// Loads all result rows from a header-bearing CSV file
pub fn load(path: impl AsRef<Path>) -> Result<Vec<ResultRow>, ReportError> {
    let path = path.as_ref();
    let source = Arc::new(path.to_path_buf());
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ReportError::data_format(path, format!("Open results: {e}")))?;

    let headers = reader
        .headers()
        .map_err(|e| ReportError::data_format(path, format!("Read header: {e}")))?
        .clone();
    if let Some(missing) = COLUMNS.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(ReportError::data_format(
            path,
            format!("Missing column {missing:?}"),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReportError::data_format(path, e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let mut row: ResultRow = record
            .deserialize(Some(&headers))
            .map_err(|e| ReportError::data_format(path, format!("line {line}: {e}")))?;
        row.origin = RowOrigin {
            path: source.clone(),
            line,
        };
        rows.push(row);
    }
    debug!("Loaded {} result rows from {path:?}", rows.len());
    Ok(rows)
}

#[cfg(test)]
pub(crate) fn sample_row(corpus: &str, scheme: &str, ratio: f64) -> ResultRow {
    ResultRow {
        corpus: corpus.to_owned(),
        scheme: scheme.to_owned(),
        compression_ratio: ratio.to_string(),
        compression_speed: "100".to_owned(),
        compression_speed_std: "1.5".to_owned(),
        decompression_speed: "400".to_owned(),
        decompression_speed_std: "4".to_owned(),
        origin: RowOrigin::default(),
    }
}
