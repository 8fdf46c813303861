//! Campmeter CLI
//!
//! Command-line interface over the dashboard core:
//! - List sites and readings
//! - Show overconsumption alerts
//! - Record readings and set thresholds
//! - Export CSV files

use anyhow::{bail, Context};
use campmeter::config::{generate_default_config, Config};
use campmeter::dashboard::{
    Dashboard, ReadingForm, Selection, ThresholdForm, ThresholdOutcome, READINGS_FILENAME,
    THRESHOLDS_FILENAME,
};
use campmeter::model::{Reading, Site};
use campmeter::store::NocoClient;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "campmeter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Utility-meter readings and thresholds for camping sites")]
#[command(long_about = "Campmeter tracks water, electricity and gas meter readings per camping site.\nSet thresholds, spot overconsumption and export everything to CSV.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportKind {
    Thresholds,
    Readings,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List camping sites
    Sites,

    /// List meter readings
    Readings {
        /// Site id
        #[arg(short, long)]
        site: Option<i64>,
        /// Calendar year of the reading date
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Show overconsumption alerts for a site
    Alerts {
        /// Site id
        #[arg(short, long)]
        site: i64,
        /// Calendar year of the reading date
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Record a meter reading
    Record {
        /// Site id
        #[arg(short, long)]
        site: String,
        /// Reading date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        #[arg(long)]
        water: String,
        #[arg(long)]
        electricity: String,
        #[arg(long)]
        gas: String,
    },

    /// Create or update a site's thresholds
    Threshold {
        /// Site id
        #[arg(short, long)]
        site: String,
        #[arg(long)]
        water: String,
        #[arg(long)]
        electricity: String,
        #[arg(long)]
        gas: String,
    },

    /// Export thresholds or readings as CSV
    Export {
        kind: ExportKind,
        /// Site id (readings only)
        #[arg(short, long)]
        site: Option<i64>,
        /// Year (readings only)
        #[arg(short, long)]
        year: Option<i32>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
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

    if let Commands::Config { output } = &cli.command {
        let config = generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &config)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", config),
        }
        return Ok(());
    }

    let config = Config::resolve_logged(cli.config.as_deref())?;
    config.logging.init();
    config.validate()?;

    let store = NocoClient::new(config.store.client_config())
        .context("failed to build remote store client")?;
    let dashboard = Dashboard::new(Arc::new(store));

    match cli.command {
        Commands::Sites => {
            load(&dashboard).await?;
            let sites = dashboard.sites().await;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sites)?),
                OutputFormat::Csv => {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    writer.write_record(["id", "nom"])?;
                    for site in &sites {
                        writer.write_record([site.id.to_string(), site.name.clone()])?;
                    }
                    writer.flush()?;
                }
                OutputFormat::Table => {
                    if sites.is_empty() {
                        println!("No sites found.");
                    } else {
                        println!("{:<8} {}", "ID", "Name");
                        println!("{}", "-".repeat(40));
                        for site in &sites {
                            println!("{:<8} {}", site.id, site.name);
                        }
                    }
                }
            }
        }

        Commands::Readings { site, year } => {
            load(&dashboard).await?;
            let readings = dashboard.readings(Selection::new(site, year)).await;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&readings)?),
                OutputFormat::Csv => print!("{}", campmeter::dashboard::export::readings_csv(&readings)?),
                OutputFormat::Table => print_readings(&readings, &dashboard.sites().await),
            }
        }

        Commands::Alerts { site, year } => {
            load(&dashboard).await?;
            let view = dashboard.view(Selection::new(Some(site), year)).await;

            if view.selected_site().is_none() {
                bail!("unknown site {}", site);
            }

            let lines: Vec<_> = view.alerts.iter().filter(|l| !l.is_empty()).collect();
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&lines)?),
                _ => {
                    if !view.has_threshold {
                        println!("No thresholds set for this site; every reading counts.");
                    }
                    if lines.is_empty() {
                        println!("No overconsumption.");
                    }
                    for line in lines {
                        println!("#{:<6} {}", line.reading_id, line.text());
                    }
                }
            }
        }

        Commands::Record {
            site,
            date,
            water,
            electricity,
            gas,
        } => {
            let form = ReadingForm {
                site,
                date,
                water,
                electricity,
                gas,
            };
            let reading = dashboard.submit_reading(&form).await?;
            println!(
                "Recorded reading for site {} on {}",
                reading.site_id, reading.reading_date
            );
        }

        Commands::Threshold {
            site,
            water,
            electricity,
            gas,
        } => {
            let form = ThresholdForm {
                site,
                water,
                electricity,
                gas,
            };
            match dashboard.submit_threshold(&form).await? {
                ThresholdOutcome::Created => println!("Thresholds created"),
                ThresholdOutcome::Updated { id } => println!("Thresholds updated (record {})", id),
            }
        }

        Commands::Export {
            kind,
            site,
            year,
            output,
        } => {
            load(&dashboard).await?;
            let (data, default_name) = match kind {
                ExportKind::Thresholds => (dashboard.export_thresholds().await?, THRESHOLDS_FILENAME),
                ExportKind::Readings => (
                    dashboard.export_readings(Selection::new(site, year)).await?,
                    READINGS_FILENAME,
                ),
            };

            match output {
                Some(path) => {
                    let path = if path.is_dir() { path.join(default_name) } else { path };
                    std::fs::write(&path, &data)?;
                    println!("Exported to {:?}", path);
                }
                None => print!("{}", data),
            }
        }

        // Written before the config was loaded
        Commands::Config { .. } => {}
    }

    dashboard.close();
    Ok(())
}

/// Load everything; any failed table aborts the command
async fn load(dashboard: &Dashboard) -> anyhow::Result<()> {
    let report = dashboard.load().await;
    if !report.is_complete() {
        for notice in dashboard.notices().await {
            eprintln!("{}", notice.message);
        }
        bail!("could not load data from the remote store");
    }
    Ok(())
}

fn print_readings(readings: &[Reading], sites: &[Site]) {
    if readings.is_empty() {
        println!("No readings for this selection");
        return;
    }

    println!(
        "{:<8} {:<20} {:<12} {:>10} {:>12} {:>10}",
        "ID", "Site", "Date", "Water", "Electricity", "Gas"
    );
    println!("{}", "-".repeat(77));

    for reading in readings {
        let site = sites
            .iter()
            .find(|s| s.id == reading.site_id)
            .map(|s| s.name.as_str())
            .unwrap_or("-");
        println!(
            "{:<8} {:<20} {:<12} {:>10.2} {:>12.2} {:>10.2}",
            reading.id,
            site,
            reading.reading_date.to_string(),
            reading.water,
            reading.electricity,
            reading.gas
        );
    }
}
