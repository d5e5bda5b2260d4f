//! Query service
//!
//! Validates request parameters, builds the statement for each endpoint, runs
//! it against the injected [`TelemetryStore`] and shapes the flat rows into the
//! response documents.
//!
//! Grouped results only carry drivers that produced at least one row: a driver
//! asked for but absent from the data is left out of the map entirely rather
//! than mapped to an empty list.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::{DriverSummary, LapRecord, Race, TelemetrySample, TelemetryStore};

use super::error::{QueryError, QueryResult};
use super::params::RequestParams;
use super::sql;

/// Laps keyed by driver code, each list ordered by lap number
pub type LapsByDriver = BTreeMap<String, Vec<LapRecord>>;

/// Telemetry keyed by driver code, each list ordered by timestamp
pub type TelemetryByDriver = BTreeMap<String, Vec<TelemetrySample>>;

/// One summary per driver code
pub type SummaryByDriver = BTreeMap<String, DriverSummary>;

/// Read-only query operations over the telemetry dataset
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn TelemetryStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// All races, newest first
    pub async fn races(&self) -> QueryResult<Vec<Race>> {
        let races = self.store.races(sql::races_statement()).await?;
        debug!(count = races.len(), "Listed races");
        Ok(races)
    }

    /// Driver codes with telemetry in a race session
    pub async fn drivers(&self, params: &RequestParams) -> QueryResult<Vec<String>> {
        let scope = params.session_scope().map_err(rejected)?;

        let drivers = self.store.drivers(sql::drivers_statement(&scope)).await?;
        debug!(
            race_id = %scope.race_id,
            session = %scope.session,
            count = drivers.len(),
            "Listed drivers"
        );

        Ok(drivers.into_iter().map(|d| d.code).collect())
    }

    /// Laps with tire compounds, grouped by driver
    pub async fn laps(&self, params: &RequestParams) -> QueryResult<LapsByDriver> {
        let selection = params.driver_selection().map_err(rejected)?;

        let rows = self.store.laps(sql::laps_statement(&selection)).await?;
        debug!(
            race_id = %selection.scope.race_id,
            session = %selection.scope.session,
            drivers = ?selection.drivers,
            rows = rows.len(),
            "Fetched laps"
        );

        Ok(group_by_driver(rows, |lap| &lap.driver))
    }

    /// Telemetry for one lap, grouped by driver
    pub async fn telemetry(&self, params: &RequestParams) -> QueryResult<TelemetryByDriver> {
        let lap = params.lap_selection().map_err(rejected)?;

        let rows = self.store.telemetry(sql::telemetry_statement(&lap)).await?;
        debug!(
            race_id = %lap.selection.scope.race_id,
            session = %lap.selection.scope.session,
            drivers = ?lap.selection.drivers,
            lap_number = lap.lap_number,
            rows = rows.len(),
            "Fetched telemetry"
        );

        Ok(group_by_driver(rows, |sample| &sample.driver))
    }

    /// Lap statistics over completed laps, one summary per driver
    pub async fn summary(&self, params: &RequestParams) -> QueryResult<SummaryByDriver> {
        let selection = params.driver_selection().map_err(rejected)?;

        let rows = self
            .store
            .summaries(sql::summary_statement(&selection))
            .await?;
        debug!(
            race_id = %selection.scope.race_id,
            session = %selection.scope.session,
            drivers = ?selection.drivers,
            rows = rows.len(),
            "Computed summaries"
        );

        Ok(rows
            .into_iter()
            .map(|summary| (summary.driver.clone(), summary))
            .collect())
    }

    /// Check the store answers
    pub async fn ping(&self) -> QueryResult<()> {
        self.store.ping().await?;
        Ok(())
    }
}

/// Accumulate rows into per-driver lists, preserving row order.
///
/// A key is created the first time its driver is seen, so every entry holds at
/// least one row.
fn group_by_driver<T, F>(rows: Vec<T>, driver: F) -> BTreeMap<String, Vec<T>>
where
    F: Fn(&T) -> &String,
{
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        grouped.entry(driver(&row).clone()).or_default().push(row);
    }
    grouped
}

fn rejected(err: QueryError) -> QueryError {
    warn!(error = %err, "Rejected request");
    err
}
