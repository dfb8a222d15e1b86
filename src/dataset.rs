use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::models::{GroupSummary, SchoolRecord, SchoolType};
use crate::names;
use crate::stats;

/// Row shape of the source CSV. Empty score/rank cells deserialize to None
/// and flow through the statistics as missing values.
#[derive(Debug, Serialize, Deserialize)]
struct RawRow {
    id: u32,
    name: String,
    #[serde(rename = "type")]
    school_type: SchoolType,
    score_2014: Option<f64>,
    rank_2014: Option<u32>,
    score_2017: Option<f64>,
    rank_2017: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    id: u32,
    name: &'a str,
    #[serde(rename = "type")]
    school_type: SchoolType,
    score_2014: Option<f64>,
    rank_2014: Option<u32>,
    score_2017: Option<f64>,
    rank_2017: Option<u32>,
    score_change: Option<f64>,
    rank_change: Option<i64>,
    name_word_count: usize,
    academy_named: bool,
}

/// Load, enrich and validate a dataset. Derived columns are computed here
/// once; records are never mutated afterwards.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<SchoolRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<RawRow>().enumerate() {
        // header occupies line 1
        let row = result.with_context(|| format!("malformed row on line {}", index + 2))?;
        records.push(enrich(row));
    }

    validate(&records)?;

    let incomplete = records
        .iter()
        .filter(|r| r.score_2014.is_none() || r.score_2017.is_none())
        .count();
    if incomplete > 0 {
        warn!("{incomplete} records are missing a score for at least one year");
    }
    debug!("loaded {} records from {}", records.len(), path.display());

    Ok(records)
}

fn enrich(row: RawRow) -> SchoolRecord {
    let score_change = match (row.score_2014, row.score_2017) {
        (Some(a), Some(b)) => Some(b - a),
        _ => None,
    };
    let rank_change = match (row.rank_2014, row.rank_2017) {
        (Some(a), Some(b)) => Some(i64::from(b) - i64::from(a)),
        _ => None,
    };
    let name_word_count = names::word_count(&row.name);
    let academy_named = names::is_academy_named(&row.name);

    SchoolRecord {
        id: row.id,
        name: row.name,
        school_type: row.school_type,
        score_2014: row.score_2014,
        rank_2014: row.rank_2014,
        score_2017: row.score_2017,
        rank_2017: row.rank_2017,
        score_change,
        rank_change,
        name_word_count,
        academy_named,
    }
}

/// Scores must sit in [0, 1] and ranks must be positive and unique within a
/// (school type, year) partition. Violations indicate upstream data errors
/// and fail the load.
fn validate(records: &[SchoolRecord]) -> anyhow::Result<()> {
    for record in records {
        for (year, score) in [(2014, record.score_2014), (2017, record.score_2017)] {
            if let Some(value) = score {
                if !(0.0..=1.0).contains(&value) {
                    bail!(
                        "school {} ({}) has {} score {} outside [0, 1]",
                        record.id,
                        record.name,
                        year,
                        value
                    );
                }
            }
        }
        for (year, rank) in [(2014, record.rank_2014), (2017, record.rank_2017)] {
            if rank == Some(0) {
                bail!(
                    "school {} ({}) has a zero {} rank; ranks start at 1",
                    record.id,
                    record.name,
                    year
                );
            }
        }
    }

    for year in [2014u16, 2017] {
        let mut seen: HashSet<(SchoolType, u32)> = HashSet::new();
        for record in records {
            let rank = if year == 2014 {
                record.rank_2014
            } else {
                record.rank_2017
            };
            if let Some(rank) = rank {
                if !seen.insert((record.school_type, rank)) {
                    bail!(
                        "duplicate {} rank {} among {} schools",
                        year,
                        rank,
                        record.school_type
                    );
                }
            }
        }
    }

    Ok(())
}

/// Write the enriched snapshot: source columns with the derived columns
/// appended.
pub fn write_snapshot(records: &[SchoolRecord], path: &Path) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for record in records {
        writer.serialize(SnapshotRow {
            id: record.id,
            name: &record.name,
            school_type: record.school_type,
            score_2014: record.score_2014,
            rank_2014: record.rank_2014,
            score_2017: record.score_2017,
            rank_2017: record.rank_2017,
            score_change: record.score_change,
            rank_change: record.rank_change,
            name_word_count: record.name_word_count,
            academy_named: record.academy_named,
        })?;
    }
    writer.flush()?;

    Ok(records.len())
}

/// Descriptive score statistics per (school type, year). Groups with no
/// present scores are skipped.
pub fn summarize_scores(records: &[SchoolRecord]) -> Vec<GroupSummary> {
    let mut summaries = Vec::new();

    for school_type in [SchoolType::Elementary, SchoolType::Secondary] {
        let group: Vec<&SchoolRecord> = records
            .iter()
            .filter(|r| r.school_type == school_type)
            .collect();

        for year in [2014u16, 2017] {
            let scores: Vec<f64> = group
                .iter()
                .filter_map(|r| if year == 2014 { r.score_2014 } else { r.score_2017 })
                .collect();
            if let Some(stats) = stats::describe(&scores) {
                summaries.push(GroupSummary {
                    school_type,
                    year,
                    missing: group.len() - scores.len(),
                    scores: stats,
                });
            }
        }
    }

    summaries
}

/// (2014, 2017) score pairs for every record carrying both.
pub fn score_pairs(records: &[SchoolRecord]) -> Vec<(f64, f64)> {
    let a: Vec<Option<f64>> = records.iter().map(|r| r.score_2014).collect();
    let b: Vec<Option<f64>> = records.iter().map(|r| r.score_2017).collect();
    stats::pairwise_complete(&a, &b)
}

pub fn score_changes(records: &[SchoolRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.score_change).collect()
}

/// Records whose score rose by more than `threshold`, largest change first.
pub fn score_change_outliers(records: &[SchoolRecord], threshold: f64) -> Vec<&SchoolRecord> {
    let mut outliers: Vec<&SchoolRecord> = records
        .iter()
        .filter(|r| r.score_change.map_or(false, |change| change > threshold))
        .collect();
    outliers.sort_by(|a, b| {
        b.score_change
            .partial_cmp(&a.score_change)
            .unwrap_or(Ordering::Equal)
    });
    outliers
}

/// Records ordered by absolute score change, largest movers first.
pub fn largest_shifts(records: &[SchoolRecord], limit: usize) -> Vec<&SchoolRecord> {
    let mut movers: Vec<&SchoolRecord> = records
        .iter()
        .filter(|r| r.score_change.is_some())
        .collect();
    movers.sort_by(|a, b| {
        let a_change = a.score_change.unwrap_or(0.0).abs();
        let b_change = b.score_change.unwrap_or(0.0).abs();
        b_change.partial_cmp(&a_change).unwrap_or(Ordering::Equal)
    });
    movers.truncate(limit);
    movers
}

/// A small realistic slice of the published dataset, enough to exercise
/// every command. The lone mover above +0.2 matches the published outlier.
pub fn seed_records() -> Vec<SchoolRecord> {
    let rows = vec![
        (1, "Thorncliffe Park Public School", SchoolType::Elementary, Some(0.91), Some(1), Some(0.93), Some(1)),
        (2, "Gateway Public School", SchoolType::Elementary, Some(0.88), Some(2), Some(0.90), Some(2)),
        (3, "Blake Street Junior Public School", SchoolType::Elementary, Some(0.82), Some(3), Some(0.79), Some(3)),
        (4, "Cresthaven Public School", SchoolType::Elementary, Some(0.55), Some(4), Some(0.58), Some(5)),
        (5, "Withrow Avenue Junior Public School", SchoolType::Elementary, Some(0.42), Some(5), Some(0.40), Some(6)),
        (6, "Rolph Road Elementary School", SchoolType::Elementary, Some(0.35), Some(6), Some(0.33), Some(7)),
        (7, "Maurice Cody Junior Public School", SchoolType::Elementary, Some(0.18), Some(7), Some(0.15), Some(8)),
        (8, "Swansea Junior and Senior Public School", SchoolType::Elementary, Some(0.12), Some(8), Some(0.10), Some(9)),
        (9, "Valley Park Middle School", SchoolType::Elementary, None, None, Some(0.72), Some(4)),
        (10, "Marc Garneau Collegiate Institute", SchoolType::Secondary, Some(0.78), Some(1), Some(0.81), Some(1)),
        (11, "Central Technical School", SchoolType::Secondary, Some(0.64), Some(2), Some(0.61), Some(3)),
        (12, "East York Collegiate Institute", SchoolType::Secondary, Some(0.46), Some(3), Some(0.67), Some(2)),
        (13, "Riverdale Collegiate Institute", SchoolType::Secondary, Some(0.30), Some(4), Some(0.28), Some(4)),
        (14, "Northern Secondary School", SchoolType::Secondary, Some(0.21), Some(5), Some(0.19), Some(5)),
        (15, "Ursula Franklin Academy", SchoolType::Secondary, Some(0.09), Some(6), Some(0.07), Some(6)),
    ];

    rows.into_iter()
        .map(
            |(id, name, school_type, score_2014, rank_2014, score_2017, rank_2017)| {
                enrich(RawRow {
                    id,
                    name: name.to_string(),
                    school_type,
                    score_2014,
                    rank_2014,
                    score_2017,
                    rank_2017,
                })
            },
        )
        .collect()
}

/// Write the sample dataset in source-CSV shape (no derived columns).
pub fn write_seed(path: &Path) -> anyhow::Result<usize> {
    let records = seed_records();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for record in &records {
        writer.serialize(RawRow {
            id: record.id,
            name: record.name.clone(),
            school_type: record.school_type,
            score_2014: record.score_2014,
            rank_2014: record.rank_2014,
            score_2017: record.score_2017,
            rank_2017: record.rank_2017,
        })?;
    }
    writer.flush()?;

    Ok(records.len())
}
