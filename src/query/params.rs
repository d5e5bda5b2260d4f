//! Request parameter extraction
//!
//! Turns the raw query-string values into validated selections. Checks run in
//! the order `race_id`, `session`, `drivers`, `lap_number` and stop at the
//! first failure.

use serde::Deserialize;

use super::error::{QueryError, QueryResult};

/// Raw query-string parameters shared by every endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub race_id: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    /// Comma-separated driver codes
    #[serde(default)]
    pub drivers: Option<String>,
    #[serde(default)]
    pub lap_number: Option<String>,
}

/// A race session: the scope of every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionScope {
    pub race_id: String,
    pub session: String,
}

/// A session plus the drivers to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSelection {
    pub scope: SessionScope,
    pub drivers: Vec<String>,
}

/// A driver selection narrowed to one lap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapSelection {
    pub selection: DriverSelection,
    pub lap_number: i64,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set race id
    pub fn race_id(mut self, race_id: impl Into<String>) -> Self {
        self.race_id = Some(race_id.into());
        self
    }

    /// Builder method: set session
    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Builder method: set the raw comma-separated driver list
    pub fn drivers(mut self, drivers: impl Into<String>) -> Self {
        self.drivers = Some(drivers.into());
        self
    }

    /// Builder method: set the raw lap number
    pub fn lap_number(mut self, lap_number: impl Into<String>) -> Self {
        self.lap_number = Some(lap_number.into());
        self
    }

    /// Validate `race_id` and `session`
    pub fn session_scope(&self) -> QueryResult<SessionScope> {
        Ok(SessionScope {
            race_id: required_text("race_id", self.race_id.as_deref())?,
            session: required_text("session", self.session.as_deref())?,
        })
    }

    /// Validate `race_id`, `session` and `drivers`
    pub fn driver_selection(&self) -> QueryResult<DriverSelection> {
        let scope = self.session_scope()?;
        let drivers =
            parse_drivers(self.drivers.as_deref()).ok_or(QueryError::MissingParam("drivers"))?;
        Ok(DriverSelection { scope, drivers })
    }

    /// Validate everything a telemetry query needs
    pub fn lap_selection(&self) -> QueryResult<LapSelection> {
        let selection = self.driver_selection()?;
        let lap_number = parse_lap_number(self.lap_number.as_deref())?;
        Ok(LapSelection {
            selection,
            lap_number,
        })
    }
}

/// Trim a required text parameter, rejecting absent or blank values
pub fn required_text(name: &'static str, raw: Option<&str>) -> QueryResult<String> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(QueryError::MissingParam(name)),
    }
}

/// Split a comma-separated driver list, trimming each code.
///
/// Empty segments are kept as empty strings. Returns `None` when the parameter
/// is absent or its raw value is empty.
pub fn parse_drivers(raw: Option<&str>) -> Option<Vec<String>> {
    match raw {
        None | Some("") => None,
        Some(list) => Some(list.split(',').map(|code| code.trim().to_string()).collect()),
    }
}

/// Parse `lap_number`, telling a missing value apart from a malformed one
pub fn parse_lap_number(raw: Option<&str>) -> QueryResult<i64> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(QueryError::MissingParam("lap_number"));
    }

    value.parse::<i64>().map_err(|_| QueryError::InvalidParam {
        name: "lap_number",
        reason: format!("must be an integer, got '{}'", value),
    })
}
