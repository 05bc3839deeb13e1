//! Table identifiers.
//!
//! Segments belong to a table. Physical table names carry a type suffix
//! (`events_OFFLINE`, `events_REALTIME`); training data and decay models are
//! keyed by whatever name the caller uses, so the identifier itself stays
//! opaque and the suffix helpers are a convenience on top.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of table a segment belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Offline,
    Realtime,
}

impl TableType {
    /// Suffix appended to a raw table name.
    pub fn suffix(&self) -> &'static str {
        match self {
            TableType::Offline => "_OFFLINE",
            TableType::Realtime => "_REALTIME",
        }
    }
}

impl FromStr for TableType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "offline" => Ok(TableType::Offline),
            "realtime" => Ok(TableType::Realtime),
            other => Err(Error::InvalidTable(format!("unknown table type: {}", other))),
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableType::Offline => f.write_str("OFFLINE"),
            TableType::Realtime => f.write_str("REALTIME"),
        }
    }
}

/// Opaque table identifier used as the key into trained cost data.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Construct a table identifier, rejecting empty or blank names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidTable("table name must not be empty".to_string()));
        }
        Ok(Self(name))
    }

    /// Build the physical name for `raw` with the type suffix applied.
    ///
    /// A raw name that already carries the matching suffix is kept as is.
    pub fn with_type(raw: &str, table_type: TableType) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidTable("table name must not be empty".to_string()));
        }
        if raw.ends_with(table_type.suffix()) {
            return Ok(Self(raw.to_string()));
        }
        Ok(Self(format!("{}{}", raw, table_type.suffix())))
    }

    /// The type encoded in the name's suffix, if any.
    pub fn table_type(&self) -> Option<TableType> {
        if self.0.ends_with(TableType::Offline.suffix()) {
            Some(TableType::Offline)
        } else if self.0.ends_with(TableType::Realtime.suffix()) {
            Some(TableType::Realtime)
        } else {
            None
        }
    }

    /// The name with any type suffix removed.
    pub fn raw_name(&self) -> &str {
        match self.table_type() {
            Some(t) => &self.0[..self.0.len() - t.suffix().len()],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
