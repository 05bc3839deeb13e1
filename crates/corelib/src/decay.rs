//! Age-based segment cost decay.
//!
//! A segment is queried heavily while it is young and less and less as it
//! ages, until it falls outside the query window entirely. The residual cost
//! of serving a segment from now until the end of its useful life is modelled
//! as a sum of four power-law terms:
//!
//! ```text
//! lifetime = lifetime_days * 86400 / time_scale
//! age      = (reference_time - (start + end) / 2) / time_scale
//!
//! cost = total_docs * Σ C[i] * (lifetime^β[i] - age^β[i])     (age <= lifetime)
//! cost = 0                                                   (age >  lifetime)
//! ```
//!
//! Negative or non-finite results are clamped to zero. All times are Unix
//! epoch seconds.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Seconds in one day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of power-law terms in the decay curve.
pub const DECAY_TERMS: usize = 4;

/// Constants defining one decay curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayParameters {
    /// How long a segment stays queryable, in days.
    pub lifetime_days: f64,
    /// Divisor converting seconds into the curve's time unit.
    pub time_scale: f64,
    /// Term coefficients `C[0..4]`.
    pub coefficients: [f64; DECAY_TERMS],
    /// Term exponents `β[0..4]`.
    pub exponents: [f64; DECAY_TERMS],
}

impl DecayParameters {
    pub fn new(
        lifetime_days: f64,
        time_scale: f64,
        coefficients: [f64; DECAY_TERMS],
        exponents: [f64; DECAY_TERMS],
    ) -> Self {
        Self {
            lifetime_days,
            time_scale,
            coefficients,
            exponents,
        }
    }

    /// Check that the parameters describe a usable curve.
    pub fn validate(&self, table: &str) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidDecayParameters {
            table: table.to_string(),
            reason: reason.to_string(),
        };
        if !self.lifetime_days.is_finite() || self.lifetime_days < 0.0 {
            return Err(invalid("lifetime_days must be finite and non-negative"));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(invalid("time_scale must be finite and positive"));
        }
        if self
            .coefficients
            .iter()
            .chain(self.exponents.iter())
            .any(|v| !v.is_finite())
        {
            return Err(invalid("coefficients and exponents must be finite"));
        }
        Ok(())
    }

    /// Segment lifetime expressed in scaled time units.
    #[inline]
    pub fn lifetime_scaled(&self) -> f64 {
        (self.lifetime_days * SECONDS_PER_DAY) / self.time_scale
    }
}

/// The part of a segment's metadata the decay curve needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentWindow {
    pub total_docs: u64,
    /// Earliest event time in the segment (epoch seconds).
    pub start_time: i64,
    /// Latest event time in the segment (epoch seconds).
    pub end_time: i64,
}

impl SegmentWindow {
    pub fn new(total_docs: u64, start_time: i64, end_time: i64) -> Self {
        Self {
            total_docs,
            start_time,
            end_time,
        }
    }

    /// Midpoint of the segment's time range.
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.start_time as f64 + self.end_time as f64) / 2.0
    }
}

/// Residual serving cost of a segment as seen at `reference_time`.
///
/// A segment whose midpoint lies after `reference_time` is treated as age 0.
pub fn decay_cost(params: &DecayParameters, segment: &SegmentWindow, reference_time: i64) -> f64 {
    let lifetime = params.lifetime_scaled();
    let age = ((reference_time as f64 - segment.midpoint()) / params.time_scale).max(0.0);

    if age > lifetime {
        return 0.0;
    }

    let per_doc: f64 = params
        .coefficients
        .iter()
        .zip(params.exponents.iter())
        .map(|(c, beta)| c * (lifetime.powf(*beta) - age.powf(*beta)))
        .sum();

    let cost = per_doc * segment.total_docs as f64;
    if !cost.is_finite() || cost < 0.0 {
        return 0.0;
    }
    cost
}

/// Per-table decay curves, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DecayModelTable {
    models: HashMap<String, DecayParameters>,
}

impl DecayModelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a model file from disk. See [`DecayModelTable::from_reader`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(file))
    }

    /// Parse a model file.
    ///
    /// The first line is a header. Every following line is
    /// `table,lifetimeDays,timeScale,C0,B0,C1,B1,C2,B2,C3,B3`. Lines that do
    /// not parse, or that parse into invalid parameters, are skipped with a
    /// warning so one bad row never blocks the rest of the model.
    pub fn from_reader(reader: impl Read) -> Self {
        let mut table = Self::new();
        let mut rows = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        for record in rows.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    warn!(error = %e, "stopping decay model read");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable decay model record");
                    continue;
                }
            };
            let line = record.position().map(|p| p.line());
            match parse_model_record(&record) {
                Ok((name, params)) => {
                    debug!(table = %name, ?params, "loaded decay model");
                    table.models.insert(name, params);
                }
                Err(e) => warn!(?line, error = %e, "skipping decay model row"),
            }
        }
        table
    }

    pub fn insert(&mut self, table: impl Into<String>, params: DecayParameters) -> Result<()> {
        let table = table.into();
        params.validate(&table)?;
        self.models.insert(table, params);
        Ok(())
    }

    pub fn get(&self, table: &str) -> Option<&DecayParameters> {
        self.models.get(table)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn parse_model_record(record: &StringRecord) -> Result<(String, DecayParameters)> {
    let expected = 3 + 2 * DECAY_TERMS;
    if record.len() < expected {
        return Err(Error::Config(format!(
            "expected {} fields, found {}",
            expected,
            record.len()
        )));
    }
    let name = record.get(0).unwrap_or_default();
    if name.is_empty() {
        return Err(Error::InvalidTable("table name must not be empty".to_string()));
    }

    let number = |i: usize| -> Result<f64> {
        let field = record.get(i).unwrap_or_default();
        field
            .parse::<f64>()
            .map_err(|e| Error::Config(format!("field {} ({:?}): {}", i, field, e)))
    };

    let mut coefficients = [0.0; DECAY_TERMS];
    let mut exponents = [0.0; DECAY_TERMS];
    for term in 0..DECAY_TERMS {
        coefficients[term] = number(3 + 2 * term)?;
        exponents[term] = number(4 + 2 * term)?;
    }
    let params = DecayParameters::new(number(1)?, number(2)?, coefficients, exponents);
    params.validate(name)?;
    Ok((name.to_string(), params))
}
