use std::collections::HashMap;

use crate::models::{SchoolRecord, TTestResult, WordCount};
use crate::stats;

/// Name tokens that mark a school as academy-styled. Exact token match;
/// source names are title-case.
pub const ACADEMY_WORDS: [&str; 3] = ["Institute", "Collegiate", "Academy"];

pub fn word_count(name: &str) -> usize {
    name.split_whitespace().count()
}

pub fn is_academy_named(name: &str) -> bool {
    name.split_whitespace()
        .any(|word| ACADEMY_WORDS.contains(&word))
}

/// Word-frequency table over all school names, most frequent first, ties
/// broken alphabetically so output is stable.
pub fn word_frequencies(records: &[SchoolRecord]) -> Vec<WordCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        for word in record.name.split_whitespace() {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut table: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect();

    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    table
}

pub fn academy_partition(records: &[SchoolRecord]) -> (Vec<&SchoolRecord>, Vec<&SchoolRecord>) {
    records.iter().partition(|record| record.academy_named)
}

/// Welch t-test of 2017 scores, academy-named schools against the rest.
pub fn academy_score_test(records: &[SchoolRecord]) -> Option<TTestResult> {
    let (academy, rest) = academy_partition(records);
    let a: Vec<f64> = academy.iter().filter_map(|r| r.score_2017).collect();
    let b: Vec<f64> = rest.iter().filter_map(|r| r.score_2017).collect();
    stats::welch_t_test(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchoolType;

    fn sample_record(id: u32, name: &str, score_2017: Option<f64>) -> SchoolRecord {
        SchoolRecord {
            id,
            name: name.to_string(),
            school_type: SchoolType::Secondary,
            score_2014: None,
            rank_2014: None,
            score_2017,
            rank_2017: None,
            score_change: None,
            rank_change: None,
            name_word_count: word_count(name),
            academy_named: is_academy_named(name),
        }
    }

    #[test]
    fn word_count_counts_whitespace_tokens() {
        assert_eq!(word_count("East York Collegiate Institute"), 4);
        assert_eq!(word_count("  Gateway   Public  School "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn academy_words_flag_matching_names() {
        assert!(is_academy_named("East York Collegiate Institute"));
        assert!(is_academy_named("Ursula Franklin Academy"));
        assert!(!is_academy_named("Blake Street Junior Public School"));
        // substring of a token is not a match
        assert!(!is_academy_named("Academia Heights School"));
    }

    #[test]
    fn frequencies_sort_by_count_then_word() {
        let records = vec![
            sample_record(1, "Gateway Public School", None),
            sample_record(2, "Rolph Road School", None),
            sample_record(3, "Gateway Annex", None),
        ];
        let table = word_frequencies(&records);
        assert_eq!(table[0].word, "Gateway");
        assert_eq!(table[0].count, 2);
        assert_eq!(table[1].word, "School");
        assert_eq!(table[1].count, 2);
    }

    #[test]
    fn partition_splits_on_the_flag() {
        let records = vec![
            sample_record(1, "East York Collegiate Institute", Some(0.6)),
            sample_record(2, "Northern Secondary School", Some(0.2)),
        ];
        let (academy, rest) = academy_partition(&records);
        assert_eq!(academy.len(), 1);
        assert_eq!(rest.len(), 1);
        assert_eq!(academy[0].id, 1);
    }

    #[test]
    fn score_test_compares_partitions() {
        let records = vec![
            sample_record(1, "East York Collegiate Institute", Some(0.6)),
            sample_record(2, "Riverdale Collegiate Institute", Some(0.5)),
            sample_record(3, "Northern Secondary School", Some(0.2)),
            sample_record(4, "Western Technical School", Some(0.3)),
        ];
        let result = academy_score_test(&records).unwrap();
        assert_eq!(result.n_a, 2);
        assert_eq!(result.n_b, 2);
        assert!(result.t > 0.0);
        assert!((result.mean_a - 0.55).abs() < 1e-12);
        assert!((result.mean_b - 0.25).abs() < 1e-12);
    }

    #[test]
    fn score_test_skips_missing_scores() {
        let records = vec![
            sample_record(1, "East York Collegiate Institute", Some(0.6)),
            sample_record(2, "Riverdale Collegiate Institute", None),
            sample_record(3, "Northern Secondary School", Some(0.2)),
            sample_record(4, "Western Technical School", Some(0.3)),
        ];
        // only one academy score left, not enough for a test
        assert!(academy_score_test(&records).is_none());
    }
}
