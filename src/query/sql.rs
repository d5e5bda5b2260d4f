//! SQL composition
//!
//! Pure functions from validated selections to [`Statement`]s. Driver codes
//! only ever travel as bound values; the query text carries one `?` per code.
//!
//! Parameter order always follows the query text:
//!
//! ```text
//! laps / summary:  race_id, driver_1 .. driver_n, session
//! telemetry:       race_id, driver_1 .. driver_n, session, lap_number
//! drivers:         race_id, session
//! ```

use crate::store::{SqlValue, Statement};

use super::params::{DriverSelection, LapSelection, SessionScope};

/// Build `(?, ?, ..)` with one placeholder per value, plus the bound values
/// in input order.
pub fn in_clause(values: &[String]) -> (String, Vec<SqlValue>) {
    let placeholders = vec!["?"; values.len()].join(", ");
    let params = values.iter().cloned().map(SqlValue::Text).collect();
    (format!("({})", placeholders), params)
}

/// All races, newest first
pub fn races_statement() -> Statement {
    Statement::new("SELECT race_id, name, circuit, date FROM races ORDER BY date DESC")
}

/// Distinct drivers with telemetry in a session
pub fn drivers_statement(scope: &SessionScope) -> Statement {
    Statement {
        sql: "SELECT DISTINCT driver FROM telemetry WHERE race_id = ? AND session = ?"
            .to_string(),
        params: vec![
            SqlValue::from(scope.race_id.as_str()),
            SqlValue::from(scope.session.as_str()),
        ],
    }
}

/// Laps for the selected drivers, joined with their tire compound
pub fn laps_statement(selection: &DriverSelection) -> Statement {
    let (drivers_in, driver_params) = in_clause(&selection.drivers);

    let sql = format!(
        "SELECT l.race_id, l.driver, l.session, l.lap_number, l.lap_time_seconds, \
         COALESCE(t.compound, '') AS compound \
         FROM lap_times l \
         LEFT JOIN tires t \
         ON l.race_id = t.race_id AND l.driver = t.driver \
         AND l.session = t.session AND l.lap_number = t.lap_number \
         WHERE l.race_id = ? AND l.driver IN {} AND l.session = ? \
         ORDER BY l.driver, l.lap_number",
        drivers_in
    );

    Statement {
        sql,
        params: scoped_params(&selection.scope, driver_params),
    }
}

/// Telemetry samples for one lap of the selected drivers
pub fn telemetry_statement(lap: &LapSelection) -> Statement {
    let (drivers_in, driver_params) = in_clause(&lap.selection.drivers);

    let sql = format!(
        "SELECT race_id, driver, session, lap_number, timestamp_seconds, speed, rpm, gear, throttle \
         FROM telemetry \
         WHERE race_id = ? AND driver IN {} AND session = ? AND lap_number = ? \
         ORDER BY driver, timestamp_seconds",
        drivers_in
    );

    let mut params = scoped_params(&lap.selection.scope, driver_params);
    params.push(SqlValue::Integer(lap.lap_number));

    Statement { sql, params }
}

/// Per-driver lap statistics over completed laps only
pub fn summary_statement(selection: &DriverSelection) -> Statement {
    let (drivers_in, driver_params) = in_clause(&selection.drivers);

    let sql = format!(
        "SELECT race_id, driver, session, \
         AVG(lap_time_seconds) AS average_lap_time, \
         MIN(lap_time_seconds) AS fastest_lap_time, \
         COUNT(*) AS laps_completed \
         FROM lap_times \
         WHERE race_id = ? AND driver IN {} AND session = ? AND lap_time_seconds > 0 \
         GROUP BY race_id, driver, session \
         ORDER BY driver",
        drivers_in
    );

    Statement {
        sql,
        params: scoped_params(&selection.scope, driver_params),
    }
}

/// `race_id`, then the driver values, then `session`
fn scoped_params(scope: &SessionScope, driver_params: Vec<SqlValue>) -> Vec<SqlValue> {
    let mut params = Vec::with_capacity(driver_params.len() + 3);
    params.push(SqlValue::from(scope.race_id.as_str()));
    params.extend(driver_params);
    params.push(SqlValue::from(scope.session.as_str()));
    params
}
