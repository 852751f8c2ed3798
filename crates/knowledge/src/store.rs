//! The knowledge store: lazy, cached, per-section retrieval.
//!
//! Sections load on first access and stay cached for the process lifetime
//! (until an explicit `clear_cache`). A load is atomic: either the whole
//! file parses or the section is absent; a partially parsed section is never
//! cached. Failed loads are not cached either, so a repaired corpus file is
//! picked up on the next call.
//!
//! Concurrency: the cache is shared read-mostly state. Lookups take a read
//! lock; first access to a section inserts a per-key `OnceCell` under a
//! short write lock and populates it outside any map lock, so concurrent
//! first-accesses to one section produce a single file read and requests for
//! different sections never serialize behind each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};
use zhiyuan_core::error::CorpusError;

use crate::manifest::Manifest;
use crate::search::{SearchHit, search_section};

/// One loaded section tree. Immutable once cached.
pub type Section = Arc<serde_json::Value>;

type SectionCell = Arc<OnceCell<Section>>;

/// Lazy, cached access to the on-disk knowledge corpus.
pub struct KnowledgeStore {
    base_dir: PathBuf,
    manifest: Manifest,
    cache: RwLock<HashMap<String, SectionCell>>,
}

impl KnowledgeStore {
    /// Open a corpus directory by reading its manifest.
    pub fn open(dir: impl Into<PathBuf>, manifest_name: &str) -> Result<Self, CorpusError> {
        let base_dir = dir.into();
        let manifest = Manifest::load(&base_dir.join(manifest_name))?;
        debug!(
            corpus = %base_dir.display(),
            sections = manifest.sections.len(),
            "Opened knowledge corpus"
        );
        Ok(Self {
            base_dir,
            manifest,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// The parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// All section ids in manifest order.
    pub fn section_ids(&self) -> Vec<String> {
        self.manifest.section_ids()
    }

    /// Load a section, reading its backing file at most once.
    ///
    /// `SectionNotFound` when the id is absent from the manifest;
    /// `Unreadable`/`Malformed` when the backing file is broken. Callers
    /// treat any of these as "no knowledge for this section".
    pub async fn load_section(&self, id: &str) -> Result<Section, CorpusError> {
        let entry = self
            .manifest
            .section(id)
            .ok_or_else(|| CorpusError::SectionNotFound(id.to_string()))?;

        let cell = self.cell_for(id).await;
        let path = self.base_dir.join(&entry.file);
        let section = cell
            .get_or_try_init(|| load_file(path))
            .await?
            .clone();
        Ok(section)
    }

    /// Load every manifest section, in manifest order, skipping failures.
    pub async fn load_all_sections(&self) -> Vec<(String, Section)> {
        let mut out = Vec::new();
        for id in self.section_ids() {
            match self.load_section(&id).await {
                Ok(section) => out.push((id, section)),
                Err(e) => warn!(section = %id, error = %e, "Skipping unloadable section"),
            }
        }
        out
    }

    /// Flat substring search across sections.
    ///
    /// Defaults to every manifest section, in manifest order. Sections that
    /// fail to load are excluded from the scan rather than failing the
    /// search.
    pub async fn search(&self, query: &str, section_ids: Option<&[String]>) -> Vec<SearchHit> {
        let ids: Vec<String> = match section_ids {
            Some(ids) => ids.to_vec(),
            None => self.section_ids(),
        };

        let mut hits = Vec::new();
        for id in &ids {
            match self.load_section(id).await {
                Ok(section) => hits.extend(search_section(id, &section, query)),
                Err(e) => debug!(section = %id, error = %e, "Section excluded from search"),
            }
        }
        hits
    }

    /// Evict every cached section (corpus hot-reload).
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    // --- Typed accessors for the well-known sections ---

    pub async fn policy_data(&self) -> Result<Section, CorpusError> {
        self.load_section("policy").await
    }

    pub async fn regions_data(&self) -> Result<Section, CorpusError> {
        self.load_section("regions").await
    }

    pub async fn student_status_data(&self) -> Result<Section, CorpusError> {
        self.load_section("student_status").await
    }

    pub async fn medical_exam_data(&self) -> Result<Section, CorpusError> {
        self.load_section("medical_exam").await
    }

    pub async fn subject_categories_data(&self) -> Result<Section, CorpusError> {
        self.load_section("subject_categories").await
    }

    pub async fn majors_data(&self) -> Result<Section, CorpusError> {
        self.load_section("majors").await
    }

    pub async fn universities_data(&self) -> Result<Section, CorpusError> {
        self.load_section("universities").await
    }

    pub async fn admission_guide_data(&self) -> Result<Section, CorpusError> {
        self.load_section("admission_guide").await
    }

    pub async fn career_planning_data(&self) -> Result<Section, CorpusError> {
        self.load_section("career_planning").await
    }

    /// Get (or insert) the per-section cell holding the cached value.
    async fn cell_for(&self, id: &str) -> SectionCell {
        {
            let cache = self.cache.read().await;
            if let Some(cell) = cache.get(id) {
                return cell.clone();
            }
        }
        let mut cache = self.cache.write().await;
        cache
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

async fn load_file(path: PathBuf) -> Result<Section, CorpusError> {
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| CorpusError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| CorpusError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    debug!(path = %path.display(), "Loaded corpus section");
    Ok(Arc::new(value))
}
