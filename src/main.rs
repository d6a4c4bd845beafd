#![cfg(not(tarpaulin_include))]

use clap::{Args, Parser, Subcommand, ValueEnum};
use dashboard::config::DashboardConfig;
use dashboard::dataset::Dataset;
use dashboard::evaluator::{PeriodAlignment, RegionForecastTable};
use dashboard::{activity, downloader, loader, saving};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "dashboard", version, about = "Community activity dashboard reports")]
struct Cli {
    /// JSON config file; DASHBOARD_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset to read (.json, .csv or .gz snapshot)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Forecast CSV replacing the dataset's forecast
    #[arg(long, global = true)]
    forecast: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Clusters per stage at the latest period
    Summary {
        #[arg(long)]
        region: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Actual versus forecast verdicts
    Forecast(ForecastArgs),
    /// National and regional activity tables
    Activity {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a report to a file (.csv, or .xlsx for forecasts with the web feature)
    Export {
        #[arg(long, value_enum)]
        report: Report,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        window: ForecastArgs,
    },
    /// Save the loaded dataset as a compressed snapshot
    Snapshot {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ForecastArgs {
    #[arg(long)]
    region: Option<String>,
    /// First forecast period index
    #[arg(long)]
    from: Option<usize>,
    /// Forecast period index to stop before
    #[arg(long)]
    to: Option<usize>,
    /// index | key
    #[arg(long)]
    alignment: Option<PeriodAlignment>,
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Report {
    Forecast,
    Regional,
    Summary,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if cli.forecast.is_some() {
        config.forecast_path = cli.forecast;
    }

    let dataset = loader::load_configured(&config)?;

    match cli.command {
        Commands::Summary { region, json } => print_summary(&dataset, region.as_deref(), json)?,
        Commands::Forecast(args) => {
            let tables = forecast_tables(&dataset, &config, &args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                for table in &tables {
                    print_forecast(table);
                }
            }
        }
        Commands::Activity { json } => print_activity(&dataset, json)?,
        Commands::Export {
            report,
            out,
            window,
        } => {
            let is_xlsx = out
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
            match report {
                Report::Forecast => {
                    let tables = forecast_tables(&dataset, &config, &window)?;
                    if is_xlsx {
                        write_xlsx(&tables, &out)?;
                    } else {
                        std::fs::write(&out, downloader::forecast_to_csv(&tables))?;
                    }
                }
                Report::Regional => std::fs::write(
                    &out,
                    downloader::regional_to_csv(&dataset.regional_activity),
                )?,
                Report::Summary => {
                    std::fs::write(&out, downloader::summaries_to_csv(&dataset.summaries()))?
                }
            }
            println!("Wrote {}", out.display());
        }
        Commands::Snapshot { out } => {
            saving::save_snapshot(&dataset, &out)?;
            println!("Saved snapshot to {}", out.display());
        }
    }

    Ok(())
}

fn forecast_tables(
    dataset: &Dataset,
    config: &DashboardConfig,
    args: &ForecastArgs,
) -> Result<Vec<RegionForecastTable>, Box<dyn std::error::Error>> {
    let alignment = args.alignment.unwrap_or(config.alignment);
    let from = args.from.unwrap_or(config.forecast_window.from);
    let to = args
        .to
        .or(config.forecast_window.to)
        .unwrap_or(usize::MAX);

    match &args.region {
        Some(id) => {
            let region = dataset
                .region(id)
                .ok_or_else(|| format!("Unknown region: {}", id))?;
            Ok(vec![dataset.forecast_table(region, from..to, alignment)])
        }
        None => Ok(dataset.forecast_tables(from..to, alignment)),
    }
}

#[cfg(feature = "web")]
fn write_xlsx(
    tables: &[RegionForecastTable],
    out: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(out, downloader::forecast_to_xlsx(tables)?)?;
    Ok(())
}

#[cfg(not(feature = "web"))]
fn write_xlsx(
    _tables: &[RegionForecastTable],
    _out: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("XLSX export requires the 'web' feature".into())
}

fn print_summary(
    dataset: &Dataset,
    region: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = dataset.summaries();
    if let Some(id) = region {
        entries.retain(|e| e.region_id == id || e.region.eq_ignore_ascii_case(id));
        if entries.is_empty() {
            return Err(format!("Unknown region: {}", id).into());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<50} {:>5} {:>5} {:>5} {:>6} {:>6}",
        "Region", "IPG+", "IPG", "PG", "Other", "Total"
    );
    for e in &entries {
        let s = &e.summary;
        println!(
            "{:<50} {:>5} {:>5} {:>5} {:>6} {:>6}",
            e.region,
            s.ipg_plus,
            s.ipg,
            s.pg,
            s.unclassified(),
            s.total
        );
    }

    if region.is_none() {
        println!();
        for (title, value) in dataset.funnel().cards() {
            println!("{:<70} {:>5}", title, value);
        }
    }
    Ok(())
}

fn print_forecast(table: &RegionForecastTable) {
    println!("== {} ==", table.region);
    print!("{:<24}", "Cluster");
    for period in &table.periods {
        print!(" {:>18}", period);
    }
    println!();

    for row in &table.rows {
        print!("{:<24}", row.cluster);
        for cell in &row.cells {
            let text = match (cell.actual, cell.forecast, cell.verdict) {
                (Some(a), Some(f), Some(v)) => format!("{}/{} {}", a, f, v),
                (a, f, _) => format!(
                    "{}/{}",
                    a.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                    f.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
                ),
            };
            print!(" {:>18}", text);
        }
        println!();
    }

    let tally = table.tally();
    match tally.hit_rate() {
        Some(rate) => println!(
            "Met {} / Missed {} / no verdict {} ({:.0}% met)\n",
            tally.met,
            tally.missed,
            tally.gaps,
            rate * 100.0
        ),
        None => println!("No verdicts ({} empty cells)\n", tally.gaps),
    }
}

fn print_activity(dataset: &Dataset, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let regional = dataset.regional_table();
    let distribution = activity::participant_distribution(&dataset.regional_activity);

    if json {
        let value = serde_json::json!({
            "national": dataset.national,
            "regional": regional,
            "distribution": distribution,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{:<22} {:>8} {:>13} {:>8}",
        "Activity", "Number", "Participants", "Friends"
    );
    for (name, c) in dataset.national.rows() {
        println!(
            "{:<22} {:>8} {:>13} {:>8}",
            name, c.count, c.participants, c.friends
        );
    }
    println!();

    println!(
        "{:<50} {:>20} {:>20} {:>20}",
        "Region", "Children's Classes", "Junior Youth Groups", "Study Circles"
    );
    for row in &regional {
        println!(
            "{:<50} {:>20} {:>20} {:>20}",
            row.region,
            format_count(&row.childrens_classes),
            format_count(&row.junior_youth_groups),
            format_count(&row.study_circles)
        );
    }

    if let Some(slices) = distribution {
        println!();
        for slice in slices {
            println!(
                "{}: {} ({:.1}%)",
                slice.name,
                slice.participants,
                slice.share * 100.0
            );
        }
    }
    Ok(())
}

fn format_count(c: &activity::ActivityCount) -> String {
    format!("{}/{}/{}", c.count, c.participants, c.friends)
}
