//! Pitwall CLI
//!
//! Command-line interface for Pitwall operations:
//! - Query races, drivers, laps, telemetry and summaries from a running API
//! - Check server status
//! - Provision an empty database file
//! - Generate a default config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use pitwall::config::generate_default_config;
use pitwall::store::schema::create_tables;
use pitwall::{LapsByDriver, Race, SummaryByDriver, TelemetryByDriver};

#[derive(Parser)]
#[command(name = "pitwall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query racing telemetry from a Pitwall API server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all races, newest first
    Races,

    /// List drivers with telemetry in a session
    Drivers {
        /// Race identifier
        #[arg(short, long)]
        race_id: String,
        /// Session (e.g. R, Q)
        #[arg(short, long)]
        session: String,
    },

    /// Show lap times and tire compounds
    Laps {
        #[arg(short, long)]
        race_id: String,
        #[arg(short, long)]
        session: String,
        /// Comma-separated driver codes
        #[arg(short, long)]
        drivers: String,
    },

    /// Show telemetry samples for one lap
    Telemetry {
        #[arg(short, long)]
        race_id: String,
        #[arg(short, long)]
        session: String,
        #[arg(short, long)]
        drivers: String,
        /// Lap number
        #[arg(short, long)]
        lap: String,
    },

    /// Show per-driver lap statistics
    Summary {
        #[arg(short, long)]
        race_id: String,
        #[arg(short, long)]
        session: String,
        #[arg(short, long)]
        drivers: String,
    },

    /// Show server status
    Status,

    /// Create an empty database file with the dataset tables
    InitDb {
        /// Database file to create
        path: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let json = cli.format == "json";

    match cli.command {
        Commands::Races => {
            let races: Vec<Race> = fetch(&client, &cli.api_url, "races", &[]).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&races)?);
            } else if races.is_empty() {
                println!("No races loaded.");
            } else {
                println!("{:<20} {:<30} {:<25} {}", "ID", "Name", "Circuit", "Date");
                println!("{}", "-".repeat(90));
                for race in races {
                    println!(
                        "{:<20} {:<30} {:<25} {}",
                        race.race_id, race.name, race.circuit, race.date
                    );
                }
            }
        }

        Commands::Drivers { race_id, session } => {
            let drivers: Vec<String> = fetch(
                &client,
                &cli.api_url,
                "drivers",
                &[("race_id", &race_id), ("session", &session)],
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&drivers)?);
            } else if drivers.is_empty() {
                println!("No drivers in {} session {}", race_id, session);
            } else {
                println!("{}", drivers.join(", "));
            }
        }

        Commands::Laps {
            race_id,
            session,
            drivers,
        } => {
            let laps: LapsByDriver = fetch(
                &client,
                &cli.api_url,
                "laps",
                &[
                    ("race_id", &race_id),
                    ("session", &session),
                    ("drivers", &drivers),
                ],
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&laps)?);
            } else if laps.is_empty() {
                println!("No laps found");
            } else {
                println!("{:<8} {:>5} {:>12} {}", "Driver", "Lap", "Time", "Compound");
                println!("{}", "-".repeat(40));
                for (driver, laps) in &laps {
                    for lap in laps {
                        let compound = if lap.compound.is_empty() {
                            "-"
                        } else {
                            lap.compound.as_str()
                        };
                        println!(
                            "{:<8} {:>5} {:>12} {}",
                            driver,
                            lap.lap_number,
                            format_lap_time(lap.lap_time_seconds),
                            compound
                        );
                    }
                }
            }
        }

        Commands::Telemetry {
            race_id,
            session,
            drivers,
            lap,
        } => {
            let telemetry: TelemetryByDriver = fetch(
                &client,
                &cli.api_url,
                "telemetry",
                &[
                    ("race_id", &race_id),
                    ("session", &session),
                    ("drivers", &drivers),
                    ("lap_number", &lap),
                ],
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&telemetry)?);
            } else if telemetry.is_empty() {
                println!("No telemetry for lap {}", lap);
            } else {
                println!(
                    "{:<8} {:>9} {:>8} {:>8} {:>5} {:>9}",
                    "Driver", "Time (s)", "Speed", "RPM", "Gear", "Throttle"
                );
                println!("{}", "-".repeat(52));
                for (driver, samples) in &telemetry {
                    for s in samples {
                        println!(
                            "{:<8} {:>9.3} {:>8.1} {:>8.0} {:>5} {:>9.1}",
                            driver, s.timestamp_seconds, s.speed, s.rpm, s.gear, s.throttle
                        );
                    }
                }
            }
        }

        Commands::Summary {
            race_id,
            session,
            drivers,
        } => {
            let summary: SummaryByDriver = fetch(
                &client,
                &cli.api_url,
                "summary",
                &[
                    ("race_id", &race_id),
                    ("session", &session),
                    ("drivers", &drivers),
                ],
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.is_empty() {
                println!("No completed laps found");
            } else {
                println!(
                    "{:<8} {:>12} {:>12} {:>6}",
                    "Driver", "Average", "Fastest", "Laps"
                );
                println!("{}", "-".repeat(42));
                for (driver, s) in &summary {
                    println!(
                        "{:<8} {:>12} {:>12} {:>6}",
                        driver,
                        format_lap_time(s.average_lap_time),
                        format_lap_time(s.fastest_lap_time),
                        s.laps_completed
                    );
                }
            }
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.api_url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Pitwall v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!(
                        "Database:   {}",
                        health["database"].as_str().unwrap_or("unknown")
                    );

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Pitwall API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the Pitwall API server is running:");
                    eprintln!("  cargo run --bin pitwall");
                    std::process::exit(1);
                }
            }
        }

        Commands::InitDb { path } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }

            let conn = rusqlite::Connection::open(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            create_tables(&conn)?;

            println!("Created empty database at {}", path.display());
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// GET `/api/<endpoint>` and decode the JSON body.
///
/// Non-2xx responses fail with the server's `error` message.
async fn fetch<T: DeserializeOwned>(
    client: &reqwest::Client,
    api_url: &str,
    endpoint: &str,
    query: &[(&str, &String)],
) -> anyhow::Result<T> {
    let response = client
        .get(format!("{}/api/{}", api_url.trim_end_matches('/'), endpoint))
        .query(query)
        .send()
        .await
        .with_context(|| format!("Cannot connect to Pitwall API at {}", api_url))?;

    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("no error message");
        bail!("Request failed ({}): {}", status, message);
    }

    Ok(response.json().await?)
}

/// `m:ss.mmm`, or seconds alone under a minute. Incomplete laps show dashes.
fn format_lap_time(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "--:---.---".to_string();
    }

    // Round once so a carry lands in the minutes, never as "60.000"
    let millis = (seconds * 1000.0).round() as u64;
    let minutes = millis / 60_000;
    let secs = (millis % 60_000) / 1000;
    let frac = millis % 1000;

    if minutes > 0 {
        format!("{}:{:02}.{:03}", minutes, secs, frac)
    } else {
        format!("{}.{:03}s", secs, frac)
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lap_time() {
        assert_eq!(format_lap_time(107.25), "1:47.250");
        assert_eq!(format_lap_time(61.005), "1:01.005");
        assert_eq!(format_lap_time(45.5), "45.500s");
        assert_eq!(format_lap_time(0.0), "--:---.---");
        assert_eq!(format_lap_time(-1.0), "--:---.---");
    }

    #[test]
    fn test_format_lap_time_rounding_carries() {
        assert_eq!(format_lap_time(119.9996), "2:00.000");
        assert_eq!(format_lap_time(59.9996), "1:00.000");
        assert_eq!(format_lap_time(59.9994), "59.999s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7260), "2h 1m");
    }

    #[test]
    fn test_cli_parses_telemetry() {
        let cli = Cli::try_parse_from([
            "pitwall", "telemetry", "-r", "2024_spa", "-s", "R", "-d", "VER,HAM", "-l", "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Telemetry { drivers, lap, .. } => {
                assert_eq!(drivers, "VER,HAM");
                assert_eq!(lap, "5");
            }
            _ => panic!("expected telemetry command"),
        }
        assert_eq!(cli.api_url, "http://localhost:8080");
    }
}
