//! Read-only content collaborators: the lesson manifest and the vocabulary index.

pub mod stats;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::graph::book_node_id;
use crate::types::{ItemKind, KnowledgeItem};

pub use stats::{book_stats, lesson_stats, BookStats, LessonStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonExercise {
    pub id: String,
    #[serde(default)]
    pub item_ids: Vec<String>,
}

/// One manifest entry as consumed by the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonContent {
    pub id: String,
    pub book: u32,
    pub lesson: u32,
    #[serde(default)]
    pub vocabulary: Vec<String>,
    #[serde(default)]
    pub grammar_points: Vec<String>,
    #[serde(default)]
    pub exercises: Vec<LessonExercise>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordData {
    pub id: String,
    pub arabic: String,
    pub english: String,
    #[serde(default)]
    pub transliteration: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<String>,
}

pub trait VocabularySource {
    fn word_by_id(&self, id: &str) -> Option<&WordData>;
}

#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    words: HashMap<String, WordData>,
}

impl VocabularyIndex {
    pub fn new(words: Vec<WordData>) -> Self {
        let words = words.into_iter().map(|w| (w.id.clone(), w)).collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl VocabularySource for VocabularyIndex {
    fn word_by_id(&self, id: &str) -> Option<&WordData> {
        self.words.get(id)
    }
}

/// Ordered lessons with lookup by id and by book number.
#[derive(Debug, Clone, Default)]
pub struct ContentManifest {
    lessons: Vec<LessonContent>,
    by_id: HashMap<String, usize>,
    by_book: BTreeMap<u32, Vec<usize>>,
}

impl ContentManifest {
    pub fn new(lessons: Vec<LessonContent>) -> Self {
        let mut by_id = HashMap::with_capacity(lessons.len());
        let mut by_book: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, lesson) in lessons.iter().enumerate() {
            by_id.insert(lesson.id.clone(), idx);
            by_book.entry(lesson.book).or_default().push(idx);
        }
        for indices in by_book.values_mut() {
            indices.sort_by_key(|idx| lessons[*idx].lesson);
        }
        Self {
            lessons,
            by_id,
            by_book,
        }
    }

    pub fn lessons(&self) -> &[LessonContent] {
        &self.lessons
    }

    pub fn lesson(&self, lesson_id: &str) -> EngineResult<&LessonContent> {
        self.by_id
            .get(lesson_id)
            .map(|idx| &self.lessons[*idx])
            .ok_or_else(|| EngineError::UnknownLesson(lesson_id.to_string()))
    }

    /// Lessons of `book` in lesson-number order.
    pub fn book_lessons(&self, book: u32) -> EngineResult<Vec<&LessonContent>> {
        self.by_book
            .get(&book)
            .map(|indices| indices.iter().map(|idx| &self.lessons[*idx]).collect())
            .ok_or(EngineError::UnknownBook(book))
    }

    pub fn books(&self) -> Vec<u32> {
        self.by_book.keys().copied().collect()
    }

    /// Every node the graph can mention: books, lessons, then each lesson's items.
    /// Items shared between lessons are listed once.
    pub fn knowledge_items(&self) -> Vec<KnowledgeItem> {
        let mut seen = HashSet::new();
        let mut items: Vec<KnowledgeItem> = self
            .books()
            .into_iter()
            .map(|book| KnowledgeItem {
                id: book_node_id(book),
                kind: ItemKind::Book,
            })
            .collect();
        for lesson in &self.lessons {
            items.push(KnowledgeItem {
                id: lesson.id.clone(),
                kind: ItemKind::Lesson,
            });
        }
        for lesson in &self.lessons {
            let words = lesson.vocabulary.iter().map(|id| (id, ItemKind::Word));
            let grammar = lesson.grammar_points.iter().map(|id| (id, ItemKind::GrammarPoint));
            for (id, kind) in words.chain(grammar) {
                if seen.insert(id.as_str()) {
                    items.push(KnowledgeItem {
                        id: id.clone(),
                        kind,
                    });
                }
            }
        }
        items
    }
}
