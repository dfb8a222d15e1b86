use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchoolType {
    Elementary,
    Secondary,
}

impl fmt::Display for SchoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchoolType::Elementary => write!(f, "Elementary"),
            SchoolType::Secondary => write!(f, "Secondary"),
        }
    }
}

/// One school with its LOI score and within-type rank for both
/// publication years, plus the columns derived at load time.
#[derive(Debug, Clone)]
pub struct SchoolRecord {
    pub id: u32,
    pub name: String,
    pub school_type: SchoolType,
    pub score_2014: Option<f64>,
    pub rank_2014: Option<u32>,
    pub score_2017: Option<f64>,
    pub rank_2017: Option<u32>,
    pub score_change: Option<f64>,
    pub rank_change: Option<i64>,
    pub name_word_count: usize,
    pub academy_named: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Descriptive {
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub school_type: SchoolType,
    pub year: u16,
    pub missing: usize,
    #[serde(flatten)]
    pub scores: Descriptive,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelationResult {
    pub r: f64,
    pub n: usize,
    /// 95% interval via the Fisher transform; absent below four pairs.
    pub ci: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TTestResult {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
    pub mean_a: f64,
    pub mean_b: f64,
    pub n_a: usize,
    pub n_b: usize,
}

#[derive(Debug, Clone)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}
