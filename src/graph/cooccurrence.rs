//! Item co-occurrence across exercises, independent of the lesson-based builder.

use std::collections::{BTreeMap, BTreeSet};

use super::EncompassingEdge;
use crate::content::LessonExercise;

const PAIR_SEPARATOR: &str = "::";

/// Order-independent key for an unordered pair.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}{PAIR_SEPARATOR}{b}")
    } else {
        format!("{b}{PAIR_SEPARATOR}{a}")
    }
}

/// Counts, per unordered item pair, how many exercises contain both.
pub fn analyze_co_occurrence(exercises: &[LessonExercise]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for exercise in exercises {
        let items: BTreeSet<&str> = exercise.item_ids.iter().map(String::as_str).collect();
        let items: Vec<&str> = items.into_iter().collect();
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                *counts.entry(pair_key(a, b)).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Bidirectional edges weighted `count / max_count`, dropping those below `min_weight`.
pub fn co_occurrence_to_edges(
    counts: &BTreeMap<String, u32>,
    max_count: u32,
    min_weight: f64,
) -> Vec<EncompassingEdge> {
    if max_count == 0 {
        return Vec::new();
    }
    let mut edges = Vec::with_capacity(counts.len() * 2);
    for (key, count) in counts {
        let Some((a, b)) = key.split_once(PAIR_SEPARATOR) else {
            continue;
        };
        let weight = (*count as f64 / max_count as f64).min(1.0);
        if weight < min_weight {
            continue;
        }
        edges.push(EncompassingEdge::new(a, b, weight));
        edges.push(EncompassingEdge::new(b, a, weight));
    }
    edges
}
