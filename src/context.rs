//! Lazily loaded content shared by every analysis call.
//!
//! Each dataset is loaded at most once. Concurrent first callers wait on the same
//! in-flight load; a failed load leaves the slot empty so the next call retries.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::config::GraphConfig;
use crate::content::{ContentManifest, LessonContent, VocabularyIndex, WordData};
use crate::error::{EngineError, EngineResult};
use crate::graph::{build_encompassing_graph, EncompassingGraph};

/// Supplies the backing datasets.
pub trait ContentLoader: Send + Sync {
    fn load_lessons(&self) -> impl Future<Output = EngineResult<Vec<LessonContent>>> + Send;

    fn load_vocabulary(&self) -> impl Future<Output = EngineResult<Vec<WordData>>> + Send;
}

/// Reads lessons and vocabulary from JSON array files.
#[derive(Debug, Clone)]
pub struct JsonContentLoader {
    manifest_path: PathBuf,
    vocabulary_path: Option<PathBuf>,
}

impl JsonContentLoader {
    pub fn new(manifest_path: impl Into<PathBuf>, vocabulary_path: Option<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            vocabulary_path,
        }
    }
}

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> EngineResult<Vec<T>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EngineError::Load(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| EngineError::Load(format!("{}: {e}", path.display())))
}

impl ContentLoader for JsonContentLoader {
    async fn load_lessons(&self) -> EngineResult<Vec<LessonContent>> {
        read_json_array(&self.manifest_path).await
    }

    async fn load_vocabulary(&self) -> EngineResult<Vec<WordData>> {
        match &self.vocabulary_path {
            Some(path) => read_json_array(path).await,
            None => Ok(Vec::new()),
        }
    }
}

pub struct EngineContext<L> {
    loader: L,
    graph_config: GraphConfig,
    manifest: OnceCell<Arc<ContentManifest>>,
    vocabulary: OnceCell<Arc<VocabularyIndex>>,
    graph: OnceCell<Arc<EncompassingGraph>>,
}

impl<L: ContentLoader> EngineContext<L> {
    pub fn new(loader: L, graph_config: GraphConfig) -> Self {
        Self {
            loader,
            graph_config,
            manifest: OnceCell::new(),
            vocabulary: OnceCell::new(),
            graph: OnceCell::new(),
        }
    }

    pub async fn manifest(&self) -> EngineResult<Arc<ContentManifest>> {
        self.manifest
            .get_or_try_init(|| async {
                let lessons = self.loader.load_lessons().await?;
                tracing::info!(lessons = lessons.len(), "lesson manifest loaded");
                Ok::<_, EngineError>(Arc::new(ContentManifest::new(lessons)))
            })
            .await
            .cloned()
    }

    pub async fn vocabulary(&self) -> EngineResult<Arc<VocabularyIndex>> {
        self.vocabulary
            .get_or_try_init(|| async {
                let words = self.loader.load_vocabulary().await?;
                tracing::info!(words = words.len(), "vocabulary loaded");
                Ok::<_, EngineError>(Arc::new(VocabularyIndex::new(words)))
            })
            .await
            .cloned()
    }

    pub async fn graph(&self) -> EngineResult<Arc<EncompassingGraph>> {
        self.graph
            .get_or_try_init(|| async {
                let manifest = self.manifest().await?;
                let graph = build_encompassing_graph(manifest.lessons(), &self.graph_config);
                Ok::<_, EngineError>(Arc::new(graph))
            })
            .await
            .cloned()
    }

    /// Graph if it has already been built, without triggering a load.
    pub fn cached_graph(&self) -> Option<Arc<EncompassingGraph>> {
        self.graph.get().cloned()
    }

    /// Drops every cached dataset; the next access reloads.
    pub fn reset(&mut self) {
        self.manifest = OnceCell::new();
        self.vocabulary = OnceCell::new();
        self.graph = OnceCell::new();
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}
