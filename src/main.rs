use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use lcr_rates::analyzer::{RateAnalyzer, RunOptions};
use lcr_rates::config::get_config;
use lcr_rates::ingest::expand_inputs;
use lcr_rates::models::AggregationPolicy;
use lcr_rates::vendor::VendorFilter;

#[derive(Parser)]
#[command(name = "lcr-rates")]
#[command(about = "Aggregate carrier LCR rate sheets into per-prefix averages and tier costs")]
#[command(version = "1.0.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate rate sheets: per-prefix averages, cheapest-window averages, and LCR tier costs
    Aggregate {
        /// CSV files, directories, or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
        /// LCR tier (e.g. 4 for LCR4)
        #[arg(long)]
        lcr_n: Option<usize>,
        /// Number of cheapest vendors to average
        #[arg(long)]
        cheapest_n: Option<usize>,
        /// Exclude the single cheapest vendor before windowing
        #[arg(long)]
        exclude_first_cheapest: bool,
        /// Window from the most expensive end instead of the cheapest
        #[arg(long)]
        most_expensive: bool,
        /// Only include these vendors (normalized source labels)
        #[arg(long, value_name = "NAME", conflicts_with = "exclude_vendor")]
        include_vendor: Vec<String>,
        /// Exclude these vendors (normalized source labels)
        #[arg(long, value_name = "NAME")]
        exclude_vendor: Vec<String>,
        /// Rate threshold for the anomaly check
        #[arg(long)]
        rate_threshold: Option<f64>,
        /// Decimal places for displayed rates
        #[arg(long)]
        decimal_places: Option<usize>,
        /// Decimal places for exported rates
        #[arg(long)]
        final_decimal_places: Option<usize>,
        /// Write the main result set to this CSV file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Write the anomalous rows to this CSV file
        #[arg(long, value_name = "FILE")]
        anomalies_output: Option<PathBuf>,
        /// Show at most N result rows in the terminal
        #[arg(long)]
        limit: Option<usize>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Pre-flight summary only: per-file prefix counts and above-threshold rows
    Summary {
        /// CSV files, directories, or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
        /// Rate threshold for the anomaly check
        #[arg(long)]
        rate_threshold: Option<f64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    lcr_rates::logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            paths,
            lcr_n,
            cheapest_n,
            exclude_first_cheapest,
            most_expensive,
            include_vendor,
            exclude_vendor,
            rate_threshold,
            decimal_places,
            final_decimal_places,
            output,
            anomalies_output,
            limit,
            json,
        } => {
            let defaults = &get_config().aggregation;
            let policy = AggregationPolicy {
                lcr_n: lcr_n.unwrap_or(defaults.lcr_n),
                cheapest_n: cheapest_n.unwrap_or(defaults.cheapest_n),
                exclude_first_cheapest: exclude_first_cheapest || defaults.exclude_first_cheapest,
                most_expensive: most_expensive || defaults.most_expensive,
                decimal_places: decimal_places.unwrap_or(defaults.decimal_places),
                final_decimal_places: final_decimal_places
                    .unwrap_or(defaults.final_decimal_places),
                rate_threshold: rate_threshold.unwrap_or(defaults.rate_threshold),
            };

            let run = || -> Result<()> {
                let filter = VendorFilter::from_lists(&include_vendor, &exclude_vendor)?;
                let files = expand_inputs(&paths)?;
                let options = RunOptions {
                    policy,
                    filter,
                    json_output: json,
                    limit,
                    output,
                    anomalies_output,
                };
                RateAnalyzer::new().run_aggregate(&files, &options)
            };

            match run() {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
        Commands::Summary {
            paths,
            rate_threshold,
            json,
        } => {
            let threshold =
                rate_threshold.unwrap_or(get_config().aggregation.rate_threshold);

            let run = || -> Result<()> {
                let files = expand_inputs(&paths)?;
                RateAnalyzer::new().run_summary(&files, threshold, json)
            };

            match run() {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::json!({ "error": format!("{e:#}") })
        );
    } else {
        eprintln!("Error: {e:#}");
    }
    process::exit(1);
}
