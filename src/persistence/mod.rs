use crate::error::PersistenceError;
use crate::models::{Observation, Trend};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CSV_HEADER: &str = "timestamp,price,movement";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV log of price observations
///
/// Rows are `timestamp,price,movement`. The file is only ever opened for
/// append after creation, so rows stay in write order.
#[derive(Debug, Clone)]
pub struct TrendLogger {
    path: PathBuf,
}

impl TrendLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log with its header row if it does not exist yet
    ///
    /// Returns `true` when the file was created. An existing file is left
    /// untouched, so calling this repeatedly never duplicates the header.
    pub fn initialize(&self) -> Result<bool, PersistenceError> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(self.io_error(e)),
        };

        writeln!(file, "{}", CSV_HEADER).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;

        tracing::info!("Created {}", self.path.display());
        Ok(true)
    }

    /// Append one observation, classified against `last_price`
    ///
    /// A log removed or rotated since startup is recreated with its header.
    /// The row is synced to disk before returning. On error nothing should
    /// be advanced by the caller.
    pub fn append(
        &self,
        price: Decimal,
        last_price: Option<Decimal>,
    ) -> Result<Observation, PersistenceError> {
        self.initialize()?;

        let observation = Observation {
            timestamp: Local::now(),
            price,
            trend: Trend::classify(price, last_price),
        };

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let row = format!(
            "{},{},{}\n",
            observation.timestamp.format(TIMESTAMP_FORMAT),
            observation.price,
            observation.trend
        );
        file.write_all(row.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.sync_data().map_err(|e| self.io_error(e))?;

        tracing::debug!(
            price = %observation.price,
            movement = %observation.trend,
            "Appended price row"
        );

        Ok(observation)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Read every observation back from a price log
///
/// The header row is skipped; blank lines are ignored.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>, PersistenceError> {
    let file = File::open(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut observations = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if index == 0 || line.trim().is_empty() {
            continue;
        }

        let malformed = |details: String| PersistenceError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            details,
        };

        let fields: Vec<&str> = line.split(',').collect();
        let [timestamp, price, movement] = fields[..] else {
            return Err(malformed(format!("expected 3 fields, got {}", fields.len())));
        };

        let naive = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| malformed(e.to_string()))?;
        let timestamp: DateTime<Local> = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| malformed(format!("nonexistent local time {}", naive)))?;

        observations.push(Observation {
            timestamp,
            price: Decimal::from_str(price).map_err(|e| malformed(e.to_string()))?,
            trend: movement.parse().map_err(malformed)?,
        });
    }

    Ok(observations)
}
