use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod charts;
mod dataset;
mod models;
mod names;
mod report;
mod stats;

#[derive(Parser)]
#[command(name = "loi-shift")]
#[command(about = "Score and rank shift analysis for TDSB Learning Opportunities Index records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the built-in sample dataset to a CSV file
    Seed {
        #[arg(long, default_value = "loi_sample.csv")]
        out: PathBuf,
    },
    /// Validate a dataset and report row and missing-value counts
    Check {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Descriptive score statistics by school type and year
    Summary {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Score and rank changes, year-over-year stability and outliers
    Shift {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 0.2)]
        threshold: f64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// School-name vocabulary and the academy-name score comparison
    Names {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 15)]
        top: usize,
    },
    /// Write the enriched CSV snapshot with derived columns appended
    Snapshot {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "loi_enriched.csv")]
        out: PathBuf,
    },
    /// Render the markdown report and chart images
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value = "charts")]
        charts_dir: PathBuf,
        #[arg(long, default_value_t = 0.2)]
        threshold: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Seed { out } => {
            let written = dataset::write_seed(&out)?;
            println!("Wrote {written} sample records to {}.", out.display());
        }
        Commands::Check { csv } => {
            let records = dataset::load_records(&csv)?;
            let elementary = records
                .iter()
                .filter(|r| r.school_type == models::SchoolType::Elementary)
                .count();
            println!(
                "{} records ({} elementary, {} secondary).",
                records.len(),
                elementary,
                records.len() - elementary
            );
            println!(
                "Missing scores: {} for 2014, {} for 2017.",
                records.iter().filter(|r| r.score_2014.is_none()).count(),
                records.iter().filter(|r| r.score_2017.is_none()).count()
            );
            println!(
                "Missing ranks: {} for 2014, {} for 2017.",
                records.iter().filter(|r| r.rank_2014.is_none()).count(),
                records.iter().filter(|r| r.rank_2017.is_none()).count()
            );
            println!("All invariants hold.");
        }
        Commands::Summary { csv, json } => {
            let records = dataset::load_records(&csv)?;
            let summaries = dataset::summarize_scores(&records);

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No scores present in the dataset.");
            } else {
                for summary in summaries.iter() {
                    println!(
                        "{} {}: mean {:.3}, sd {:.3}, range {:.3} to {:.3} across {} schools ({} missing)",
                        summary.school_type,
                        summary.year,
                        summary.scores.mean,
                        summary.scores.sd,
                        summary.scores.min,
                        summary.scores.max,
                        summary.scores.n,
                        summary.missing
                    );
                }
            }
        }
        Commands::Shift {
            csv,
            threshold,
            limit,
        } => {
            let records = dataset::load_records(&csv)?;

            let changes = dataset::score_changes(&records);
            match stats::describe(&changes) {
                Some(described) => println!(
                    "Score change over {} schools: mean {:+.3}, sd {:.3}, range {:+.3} to {:+.3}.",
                    described.n, described.mean, described.sd, described.min, described.max
                ),
                None => println!("No schools carry a score for both years."),
            }

            let pairs = dataset::score_pairs(&records);
            if let Some(correlation) = stats::correlate(&pairs) {
                match correlation.ci {
                    Some((low, high)) => println!(
                        "Year-over-year Pearson r = {:.3} (n = {}, 95% CI {:.3} to {:.3}).",
                        correlation.r, correlation.n, low, high
                    ),
                    None => println!(
                        "Year-over-year Pearson r = {:.3} (n = {}).",
                        correlation.r, correlation.n
                    ),
                }
            }
            if let Some(fit) = stats::linear_fit(&pairs) {
                println!(
                    "Fitted line: score_2017 = {:.3} x score_2014 {:+.3} (r² = {:.3}).",
                    fit.slope, fit.intercept, fit.r_squared
                );
            }

            println!("Largest movers:");
            for record in dataset::largest_shifts(&records, limit) {
                println!(
                    "- {} ({}) moved {:+.2}, rank {:+}",
                    record.name,
                    record.school_type,
                    record.score_change.unwrap_or(0.0),
                    record.rank_change.unwrap_or(0)
                );
            }

            let outliers = dataset::score_change_outliers(&records, threshold);
            if outliers.is_empty() {
                println!("No school gained more than {threshold:+.2}.");
            } else {
                println!("Schools gaining more than {threshold:+.2}:");
                for record in outliers.iter() {
                    println!(
                        "- {} ({:+.2})",
                        record.name,
                        record.score_change.unwrap_or(0.0)
                    );
                }
            }
        }
        Commands::Names { csv, top } => {
            let records = dataset::load_records(&csv)?;

            println!("Most common name words:");
            for entry in names::word_frequencies(&records).iter().take(top) {
                println!("- {}: {}", entry.word, entry.count);
            }

            let word_counts: Vec<f64> =
                records.iter().map(|r| r.name_word_count as f64).collect();
            if let Some(described) = stats::describe(&word_counts) {
                println!(
                    "Name length: mean {:.1} words (range {:.0} to {:.0}).",
                    described.mean, described.min, described.max
                );
            }

            let (academy, rest) = names::academy_partition(&records);
            println!(
                "{} academy-named schools, {} others.",
                academy.len(),
                rest.len()
            );
            match names::academy_score_test(&records) {
                Some(test) => println!(
                    "2017 score, academy-named (mean {:.3}, n = {}) vs rest (mean {:.3}, n = {}): \
                     t = {:.2}, df = {:.1}, p = {:.3}.",
                    test.mean_a, test.n_a, test.mean_b, test.n_b, test.t, test.df, test.p_value
                ),
                None => println!("Too few scored schools to compare the name groups."),
            }
        }
        Commands::Snapshot { csv, out } => {
            let records = dataset::load_records(&csv)?;
            let written = dataset::write_snapshot(&records, &out)?;
            println!("Wrote {written} enriched records to {}.", out.display());
        }
        Commands::Report {
            csv,
            out,
            charts_dir,
            threshold,
        } => {
            let records = dataset::load_records(&csv)?;

            std::fs::create_dir_all(&charts_dir)
                .with_context(|| format!("failed to create {}", charts_dir.display()))?;

            let pairs = dataset::score_pairs(&records);
            let fit = stats::linear_fit(&pairs);
            let scatter = charts_dir.join("score_scatter.png");
            charts::score_scatter(&pairs, fit.as_ref(), &scatter)
                .context("failed to render the score scatter")?;

            let changes = dataset::score_changes(&records);
            let histogram = charts_dir.join("change_histogram.png");
            charts::change_histogram(&changes, &histogram)
                .context("failed to render the change histogram")?;

            let report = report::build_report(&records, threshold, &[scatter, histogram]);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
