//! Encompassing graph: directed, weighted "contains / depends on" relations between
//! words, grammar points, lessons and books.
//!
//! `encompassed_by` is always the exact transpose of `encompasses`; every mutation goes
//! through [`EncompassingGraph::insert_edge`] or a full [`EncompassingGraph::rebuild_reverse_index`].

pub mod builder;
pub mod cooccurrence;
pub mod propagation;
pub mod query;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

pub use builder::{book_node_id, build_encompassing_graph};
pub use cooccurrence::{analyze_co_occurrence, co_occurrence_to_edges, pair_key};
pub use propagation::{apply_implicit_credit, implicit_credit};
pub use query::{calculate_reach, find_high_reach_items, get_all_encompassed, get_encompassing_items};

pub const GRAPH_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncompassingEdge {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

impl EncompassingEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, weight: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            weight,
        }
    }
}

/// Adjacency maps keyed by node id. Inner maps are `target -> weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncompassingGraph {
    pub version: u32,
    pub encompasses: BTreeMap<String, BTreeMap<String, f64>>,
    pub encompassed_by: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for EncompassingGraph {
    fn default() -> Self {
        create_empty_graph()
    }
}

impl EncompassingGraph {
    /// Sets `from -> to`, replacing any existing weight. Self-loops and non-positive weights are ignored.
    pub fn insert_edge(&mut self, from: &str, to: &str, weight: f64) {
        if from == to || !(weight > 0.0) {
            return;
        }
        let weight = weight.min(1.0);
        self.encompasses
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), weight);
        self.encompassed_by
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string(), weight);
    }

    /// Deletes `from -> to` from both indexes; returns whether it existed.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let removed = match self.encompasses.get_mut(from) {
            Some(targets) => targets.remove(to).is_some(),
            None => false,
        };
        if !removed {
            return false;
        }
        if self.encompasses.get(from).is_some_and(BTreeMap::is_empty) {
            self.encompasses.remove(from);
        }
        if let Some(sources) = self.encompassed_by.get_mut(to) {
            sources.remove(from);
            if sources.is_empty() {
                self.encompassed_by.remove(to);
            }
        }
        true
    }

    /// Keeps the heavier of the existing and new weight.
    pub fn insert_max(&mut self, from: &str, to: &str, weight: f64) {
        match self.weight(from, to) {
            Some(existing) if existing >= weight => {}
            _ => self.insert_edge(from, to, weight),
        }
    }

    pub fn weight(&self, from: &str, to: &str) -> Option<f64> {
        self.encompasses.get(from).and_then(|targets| targets.get(to)).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.encompasses.values().map(BTreeMap::len).sum()
    }

    pub fn edges(&self) -> impl Iterator<Item = EncompassingEdge> + '_ {
        self.encompasses.iter().flat_map(|(from, targets)| {
            targets
                .iter()
                .map(move |(to, weight)| EncompassingEdge::new(from.clone(), to.clone(), *weight))
        })
    }

    /// Drops every edge lighter than `min_weight`.
    pub fn prune(&mut self, min_weight: f64) {
        for targets in self.encompasses.values_mut() {
            targets.retain(|_, weight| *weight >= min_weight);
        }
        self.encompasses.retain(|_, targets| !targets.is_empty());
        self.rebuild_reverse_index();
    }

    pub fn rebuild_reverse_index(&mut self) {
        let mut reverse: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (from, targets) in &self.encompasses {
            for (to, weight) in targets {
                reverse
                    .entry(to.clone())
                    .or_default()
                    .insert(from.clone(), *weight);
            }
        }
        self.encompassed_by = reverse;
    }
}

pub fn create_empty_graph() -> EncompassingGraph {
    EncompassingGraph {
        version: GRAPH_VERSION,
        encompasses: BTreeMap::new(),
        encompassed_by: BTreeMap::new(),
    }
}

pub fn serialize_graph(graph: &EncompassingGraph) -> EngineResult<String> {
    Ok(serde_json::to_string(graph)?)
}

/// The reverse index is rebuilt from `encompasses`, so a hand-edited blob cannot desync it.
pub fn deserialize_graph(json: &str) -> EngineResult<EncompassingGraph> {
    let mut graph: EncompassingGraph = serde_json::from_str(json)?;
    graph.rebuild_reverse_index();
    Ok(graph)
}

/// Edge union; on a duplicate `(from, to)` the heavier weight wins.
pub fn merge_graphs(a: &EncompassingGraph, b: &EncompassingGraph) -> EncompassingGraph {
    let mut merged = a.clone();
    merged.version = a.version.max(b.version);
    for edge in b.edges() {
        merged.insert_max(&edge.from, &edge.to, edge.weight);
    }
    merged
}
