//! Builds the encompassing graph from ordered lesson content.
//!
//! Edge sources, applied in this order (later sources never lower an earlier weight,
//! except manual overrides which replace it):
//! - lesson -> its vocabulary and grammar items at 1.0
//! - book node -> each of its lessons at 1.0, kept even when lesson encompassing is
//!   disabled since a book contains its lessons the way a lesson contains its items
//! - item <-> item for items taught together, at `same_lesson_item_weight`
//! - lesson -> earlier lesson of the same book at `adjacent_lesson_weight / distance`
//! - lesson -> every lesson of an earlier book at `cross_book_weight`
//! - manual overrides; a weight of 0 or below deletes the edge
//!
//! Edges lighter than `min_weight` are pruned last.

use std::collections::BTreeMap;

use super::{create_empty_graph, EncompassingGraph};
use crate::config::GraphConfig;
use crate::content::LessonContent;

pub fn book_node_id(book: u32) -> String {
    format!("book-{book}")
}

pub fn build_encompassing_graph(lessons: &[LessonContent], config: &GraphConfig) -> EncompassingGraph {
    let mut graph = create_empty_graph();

    let mut books: BTreeMap<u32, Vec<&LessonContent>> = BTreeMap::new();
    for lesson in lessons {
        books.entry(lesson.book).or_default().push(lesson);
    }
    for book_lessons in books.values_mut() {
        // Stable: lessons sharing a number keep their input order.
        book_lessons.sort_by_key(|lesson| lesson.lesson);
    }

    for (book, book_lessons) in &books {
        let book_id = book_node_id(*book);
        for lesson in book_lessons {
            graph.insert_max(&book_id, &lesson.id, 1.0);
            add_lesson_items(&mut graph, lesson, config.same_lesson_item_weight);
        }
    }

    if config.enable_lesson_encompassing {
        add_lesson_edges(&mut graph, &books, config);
    }

    for edge in &config.manual_overrides {
        if edge.weight > 0.0 {
            graph.insert_edge(&edge.from, &edge.to, edge.weight);
        } else {
            graph.remove_edge(&edge.from, &edge.to);
        }
    }

    graph.prune(config.min_weight);

    tracing::info!(
        lessons = lessons.len(),
        books = books.len(),
        edges = graph.edge_count(),
        "encompassing graph built"
    );
    graph
}

fn add_lesson_items(graph: &mut EncompassingGraph, lesson: &LessonContent, pair_weight: f64) {
    let items: Vec<&String> = lesson
        .vocabulary
        .iter()
        .chain(lesson.grammar_points.iter())
        .collect();

    for item in &items {
        graph.insert_max(&lesson.id, item, 1.0);
    }

    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            graph.insert_max(a, b, pair_weight);
            graph.insert_max(b, a, pair_weight);
        }
    }
}

fn add_lesson_edges(
    graph: &mut EncompassingGraph,
    books: &BTreeMap<u32, Vec<&LessonContent>>,
    config: &GraphConfig,
) {
    let mut earlier_books: Vec<&LessonContent> = Vec::new();

    for book_lessons in books.values() {
        for (position, lesson) in book_lessons.iter().enumerate() {
            for (back, earlier) in book_lessons[..position].iter().rev().enumerate() {
                let distance = (back + 1) as f64;
                graph.insert_max(&lesson.id, &earlier.id, config.adjacent_lesson_weight / distance);
            }
            for earlier in &earlier_books {
                graph.insert_max(&lesson.id, &earlier.id, config.cross_book_weight);
            }
        }
        earlier_books.extend(book_lessons.iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EncompassingEdge;

    fn lesson(id: &str, book: u32, number: u32, vocab: &[&str], grammar: &[&str]) -> LessonContent {
        LessonContent {
            id: id.to_string(),
            book,
            lesson: number,
            vocabulary: vocab.iter().map(|s| s.to_string()).collect(),
            grammar_points: grammar.iter().map(|s| s.to_string()).collect(),
            exercises: Vec::new(),
        }
    }

    fn three_lessons() -> Vec<LessonContent> {
        vec![
            lesson("l1", 1, 1, &["w1", "w2"], &["g1"]),
            lesson("l2", 1, 2, &["w3"], &[]),
            lesson("l3", 1, 3, &["w4"], &[]),
        ]
    }

    #[test]
    fn adjacent_weight_halves_with_distance() {
        let config = GraphConfig {
            adjacent_lesson_weight: 0.5,
            ..Default::default()
        };
        let g = build_encompassing_graph(&three_lessons(), &config);
        assert_eq!(g.weight("l3", "l2"), Some(0.5));
        assert_eq!(g.weight("l3", "l1"), Some(0.25));
        assert_eq!(g.weight("l2", "l1"), Some(0.5));
        assert_eq!(g.weight("l1", "l2"), None);
    }

    #[test]
    fn lessons_own_their_items_and_items_pair_up() {
        let g = build_encompassing_graph(&three_lessons(), &GraphConfig::default());
        assert_eq!(g.weight("l1", "w1"), Some(1.0));
        assert_eq!(g.weight("l1", "g1"), Some(1.0));
        assert_eq!(g.weight("w1", "w2"), Some(0.3));
        assert_eq!(g.weight("w2", "g1"), Some(0.3));
        assert_eq!(g.weight("g1", "w1"), Some(0.3));
        assert_eq!(g.weight("book-1", "l3"), Some(1.0));
    }

    #[test]
    fn cross_book_edges_are_flat() {
        let mut lessons = three_lessons();
        lessons.push(lesson("b2l1", 2, 1, &["w9"], &[]));
        let g = build_encompassing_graph(&lessons, &GraphConfig::default());
        for earlier in ["l1", "l2", "l3"] {
            assert_eq!(g.weight("b2l1", earlier), Some(0.1));
        }
        assert_eq!(g.weight("l3", "b2l1"), None);
    }

    #[test]
    fn min_weight_prunes_distant_lessons() {
        let lessons: Vec<LessonContent> = (1..=12)
            .map(|n| lesson(&format!("l{n}"), 1, n, &[], &[]))
            .collect();
        let config = GraphConfig {
            min_weight: 0.1,
            ..Default::default()
        };
        let g = build_encompassing_graph(&lessons, &config);
        // 0.5 / 5 = 0.1 kept, 0.5 / 6 dropped
        assert_eq!(g.weight("l12", "l7"), Some(0.1));
        assert_eq!(g.weight("l12", "l6"), None);
        assert!(g.edges().all(|e| e.weight >= 0.1));
    }

    #[test]
    fn lesson_encompassing_can_be_disabled() {
        let config = GraphConfig {
            enable_lesson_encompassing: false,
            ..Default::default()
        };
        let g = build_encompassing_graph(&three_lessons(), &config);
        assert_eq!(g.weight("l3", "l2"), None);
        assert_eq!(g.weight("l3", "w4"), Some(1.0));
        assert_eq!(g.weight("book-1", "l3"), Some(1.0));
    }

    #[test]
    fn manual_overrides_win() {
        let config = GraphConfig {
            manual_overrides: vec![
                EncompassingEdge::new("l3", "l1", 0.9),
                EncompassingEdge::new("w1", "w2", 0.01),
                EncompassingEdge::new("w4", "w1", 0.6),
            ],
            ..Default::default()
        };
        let g = build_encompassing_graph(&three_lessons(), &config);
        assert_eq!(g.weight("l3", "l1"), Some(0.9));
        assert_eq!(g.weight("w1", "w2"), None);
        assert_eq!(g.weight("w4", "w1"), Some(0.6));
        assert_eq!(g.encompassed_by["w1"]["w4"], 0.6);
    }

    #[test]
    fn non_positive_override_removes_computed_edge() {
        let config = GraphConfig {
            manual_overrides: vec![
                EncompassingEdge::new("l2", "l1", 0.0),
                EncompassingEdge::new("w1", "w2", -1.0),
                EncompassingEdge::new("w9", "w1", 0.0),
            ],
            ..Default::default()
        };
        let g = build_encompassing_graph(&three_lessons(), &config);
        assert_eq!(g.weight("l2", "l1"), None);
        assert_eq!(g.weight("w1", "w2"), None);
        assert_eq!(g.weight("w2", "w1"), Some(0.3));
        assert_eq!(g.weight("w9", "w1"), None);
        assert!(!g.encompassed_by["l1"].contains_key("l2"));
    }

    #[test]
    fn input_order_within_book_does_not_matter() {
        let mut shuffled = three_lessons();
        shuffled.reverse();
        let config = GraphConfig::default();
        assert_eq!(
            build_encompassing_graph(&shuffled, &config),
            build_encompassing_graph(&three_lessons(), &config)
        );
    }
}
