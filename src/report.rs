use std::fmt::Write;
use std::path::PathBuf;

use chrono::Utc;

use crate::dataset;
use crate::models::{SchoolRecord, SchoolType};
use crate::names;
use crate::stats;

pub fn build_report(records: &[SchoolRecord], threshold: f64, charts: &[PathBuf]) -> String {
    let mut output = String::new();

    let elementary = records
        .iter()
        .filter(|r| r.school_type == SchoolType::Elementary)
        .count();
    let secondary = records.len() - elementary;

    let _ = writeln!(output, "# LOI Score Shift Report");
    let _ = writeln!(
        output,
        "Generated {} from {} school records ({} elementary, {} secondary)",
        Utc::now().date_naive(),
        records.len(),
        elementary,
        secondary
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Distribution");

    let summaries = dataset::summarize_scores(records);
    if summaries.is_empty() {
        let _ = writeln!(output, "No scores present in the dataset.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {} {}: mean {:.3}, sd {:.3}, range {:.3} to {:.3} across {} schools ({} missing)",
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

    let _ = writeln!(output);
    let _ = writeln!(output, "## Year-over-Year Stability");

    let pairs = dataset::score_pairs(records);
    match stats::correlate(&pairs) {
        Some(correlation) => {
            match correlation.ci {
                Some((low, high)) => {
                    let _ = writeln!(
                        output,
                        "Pearson r = {:.3} across {} schools with both scores (95% CI {:.3} to {:.3}).",
                        correlation.r, correlation.n, low, high
                    );
                }
                None => {
                    let _ = writeln!(
                        output,
                        "Pearson r = {:.3} across {} schools with both scores.",
                        correlation.r, correlation.n
                    );
                }
            }
            if let Some(fit) = stats::linear_fit(&pairs) {
                let _ = writeln!(
                    output,
                    "Fitted line: score_2017 = {:.3} x score_2014 {:+.3} (r² = {:.3}).",
                    fit.slope, fit.intercept, fit.r_squared
                );
            }
        }
        None => {
            let _ = writeln!(output, "Not enough complete score pairs to correlate.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Largest Shifts");

    let changes = dataset::score_changes(records);
    match stats::describe(&changes) {
        Some(described) => {
            let _ = writeln!(
                output,
                "Mean score change {:+.3} (sd {:.3}) over {} schools.",
                described.mean, described.sd, described.n
            );
            for record in dataset::largest_shifts(records, 5) {
                let _ = writeln!(
                    output,
                    "- {} ({}) moved {:+.2}",
                    record.name,
                    record.school_type,
                    record.score_change.unwrap_or(0.0)
                );
            }
        }
        None => {
            let _ = writeln!(output, "No schools carry a score for both years.");
        }
    }

    let outliers = dataset::score_change_outliers(records, threshold);
    let _ = writeln!(output);
    if outliers.is_empty() {
        let _ = writeln!(output, "No school gained more than {threshold:+.2}.");
    } else {
        let _ = writeln!(output, "Schools gaining more than {threshold:+.2}:");
        for record in outliers.iter() {
            let _ = writeln!(
                output,
                "- {} ({:+.2})",
                record.name,
                record.score_change.unwrap_or(0.0)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## School Names");

    let frequencies = names::word_frequencies(records);
    if frequencies.is_empty() {
        let _ = writeln!(output, "No names to analyse.");
    } else {
        let common: Vec<String> = frequencies
            .iter()
            .take(10)
            .map(|entry| format!("{} ({})", entry.word, entry.count))
            .collect();
        let _ = writeln!(output, "Most common name words: {}.", common.join(", "));
    }

    let (academy, _) = names::academy_partition(records);
    let _ = writeln!(
        output,
        "{} of {} schools carry an academy-style name.",
        academy.len(),
        records.len()
    );

    match names::academy_score_test(records) {
        Some(test) => {
            let _ = writeln!(
                output,
                "2017 score, academy-named (mean {:.3}, n={}) vs rest (mean {:.3}, n={}): \
                 t = {:.2}, df = {:.1}, p = {:.3}.",
                test.mean_a, test.n_a, test.mean_b, test.n_b, test.t, test.df, test.p_value
            );
        }
        None => {
            let _ = writeln!(output, "Too few scored schools to compare the name groups.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Charts");

    if charts.is_empty() {
        let _ = writeln!(output, "No charts rendered.");
    } else {
        for chart in charts.iter() {
            let _ = writeln!(output, "- {}", chart.display());
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_covers_every_section() {
        let records = dataset::seed_records();
        let report = build_report(&records, 0.2, &[]);

        assert!(report.starts_with("# LOI Score Shift Report"));
        assert!(report.contains("## Score Distribution"));
        assert!(report.contains("## Year-over-Year Stability"));
        assert!(report.contains("## Largest Shifts"));
        assert!(report.contains("## School Names"));
        assert!(report.contains("East York Collegiate Institute (+0.21)"));
        assert!(report.contains("No charts rendered."));
    }

    #[test]
    fn report_handles_an_empty_dataset() {
        let report = build_report(&[], 0.2, &[]);
        assert!(report.contains("No scores present in the dataset."));
        assert!(report.contains("Not enough complete score pairs to correlate."));
        assert!(report.contains("No schools carry a score for both years."));
    }
}
