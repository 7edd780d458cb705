//! Implicit review credit: practising an item partially exercises everything it encompasses.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, SecondsFormat, Utc};

use super::EncompassingGraph;
use crate::mastery::effective_strength;
use crate::types::{MasteryRecord, MAX_STRENGTH};

const CREDIT_SCALE: f64 = 10.0;

/// Best path weight (product of edge weights, maximised over paths) from `id` to every
/// item it transitively encompasses. Edges lighter than `threshold` are not followed.
pub fn implicit_credit(id: &str, graph: &EncompassingGraph, threshold: f64) -> BTreeMap<String, f64> {
    let mut best: BTreeMap<String, f64> = BTreeMap::new();
    let mut queue: VecDeque<(String, f64)> = VecDeque::from([(id.to_string(), 1.0)]);

    while let Some((current, credit)) = queue.pop_front() {
        // A stale entry: a heavier path to `current` was found after this one was queued.
        if current != id && best.get(&current).is_some_and(|b| *b > credit) {
            continue;
        }
        let Some(targets) = graph.encompasses.get(&current) else {
            continue;
        };
        for (target, weight) in targets {
            if *weight < threshold || target == id {
                continue;
            }
            let next = credit * weight;
            if best.get(target).is_some_and(|b| *b >= next) {
                continue;
            }
            best.insert(target.clone(), next);
            queue.push_back((target.clone(), next));
        }
    }
    best
}

/// Raises the decayed strength of encompassed items after a correct answer by
/// `round(10 * credit)` and counts it as practice at `now`. Only items that already have a
/// record are touched; returns how many were credited.
pub fn apply_implicit_credit(
    word_mastery: &mut BTreeMap<String, MasteryRecord>,
    credits: &BTreeMap<String, f64>,
    is_correct: bool,
    now: DateTime<Utc>,
) -> usize {
    if !is_correct {
        return 0;
    }
    let mut touched = 0;
    for (id, credit) in credits {
        let Some(record) = word_mastery.get_mut(id) else {
            continue;
        };
        let gain = (credit * CREDIT_SCALE).round() as u8;
        if gain == 0 {
            continue;
        }
        let next = effective_strength(record, now)
            .saturating_add(gain)
            .min(MAX_STRENGTH);
        record.set_strength(next);
        record.last_practiced = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        touched += 1;
    }
    tracing::debug!(touched, "implicit credit applied");
    touched
}
