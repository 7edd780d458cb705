use std::collections::{BTreeSet, HashSet, VecDeque};

use super::{EncompassingEdge, EncompassingGraph};

/// Everything reachable from `id` over edges weighing at least `threshold`.
/// Never contains `id` itself; unknown ids yield an empty set.
pub fn get_all_encompassed(id: &str, graph: &EncompassingGraph, threshold: f64) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    if !graph.encompasses.contains_key(id) {
        return found;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(id);
    let mut queue: VecDeque<&str> = VecDeque::from([id]);

    while let Some(current) = queue.pop_front() {
        let Some(targets) = graph.encompasses.get(current) else {
            continue;
        };
        for (target, weight) in targets {
            if *weight < threshold || !visited.insert(target.as_str()) {
                continue;
            }
            found.insert(target.clone());
            queue.push_back(target.as_str());
        }
    }
    found
}

/// Direct parents of `id`, heaviest first.
pub fn get_encompassing_items(id: &str, graph: &EncompassingGraph) -> Vec<EncompassingEdge> {
    let mut parents: Vec<EncompassingEdge> = graph
        .encompassed_by
        .get(id)
        .map(|sources| {
            sources
                .iter()
                .map(|(from, weight)| EncompassingEdge::new(from.clone(), id, *weight))
                .collect()
        })
        .unwrap_or_default();
    parents.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    parents
}

pub fn calculate_reach(id: &str, graph: &EncompassingGraph) -> usize {
    graph.encompasses.get(id).map_or(0, |targets| targets.len())
}

/// The `top_n` ids with the most direct outgoing edges. Ties keep input order.
pub fn find_high_reach_items(ids: &[String], graph: &EncompassingGraph, top_n: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, usize)> = ids
        .iter()
        .map(|id| (id, calculate_reach(id, graph)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::create_empty_graph;

    fn cyclic() -> EncompassingGraph {
        let mut g = create_empty_graph();
        g.insert_edge("a", "b", 1.0);
        g.insert_edge("b", "c", 0.5);
        g.insert_edge("c", "a", 0.5);
        g.insert_edge("c", "d", 0.2);
        g
    }

    #[test]
    fn closure_survives_cycles_and_excludes_self() {
        let g = cyclic();
        let all = get_all_encompassed("a", &g, 0.0);
        let expected: BTreeSet<String> = ["b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(all, expected);
        assert!(!all.contains("a"));
    }

    #[test]
    fn threshold_cuts_light_edges() {
        let g = cyclic();
        let all = get_all_encompassed("a", &g, 0.3);
        assert!(all.contains("c"));
        assert!(!all.contains("d"));
        assert!(get_all_encompassed("a", &g, 0.9).contains("b"));
        assert_eq!(get_all_encompassed("a", &g, 0.9).len(), 1);
    }

    #[test]
    fn unknown_id_is_empty() {
        assert!(get_all_encompassed("zzz", &cyclic(), 0.0).is_empty());
        assert!(get_encompassing_items("zzz", &cyclic()).is_empty());
        assert_eq!(calculate_reach("zzz", &cyclic()), 0);
    }

    #[test]
    fn direct_parents_only() {
        let g = cyclic();
        let parents = get_encompassing_items("c", &g);
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].from, "b");
        assert_eq!(parents[0].to, "c");
    }

    #[test]
    fn high_reach_is_stable() {
        let mut g = cyclic();
        g.insert_edge("x", "y", 1.0);
        let ids: Vec<String> = ["d", "x", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_high_reach_items(&ids, &g, 3), vec!["c", "x", "a"]);
        assert!(find_high_reach_items(&ids, &g, 0).is_empty());
    }
}
