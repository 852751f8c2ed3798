//! Corpus manifest.
//!
//! The manifest lists every loadable section of the knowledge corpus.
//! Adding a section means adding one entry here plus one data file; no code
//! change required.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zhiyuan_core::error::CorpusError;

/// The corpus manifest (`knowledgebase.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    pub sections: Vec<SectionEntry>,
}

/// One independently loadable unit of the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEntry {
    /// Short id, e.g. "policy", "universities".
    pub id: String,
    pub name: String,
    /// File name relative to the corpus directory.
    pub file: String,
    pub description: String,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let raw =
            std::fs::read_to_string(path).map_err(|e| CorpusError::ManifestUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| CorpusError::ManifestUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Look up a section entry by id.
    pub fn section(&self, id: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// All section ids in manifest order.
    pub fn section_ids(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_json() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "version": "1.0",
                "name": "高考知识库",
                "description": "高考报名与志愿填报知识",
                "lastUpdated": "2025-06-01",
                "sections": [
                    {"id": "policy", "name": "高考政策", "file": "policy.json", "description": "各省报名与考试政策"},
                    {"id": "majors", "name": "专业目录", "file": "majors.json", "description": "本科专业目录"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.sections.len(), 2);
        assert_eq!(manifest.section("policy").unwrap().file, "policy.json");
        assert!(manifest.section("nope").is_none());
        assert_eq!(manifest.section_ids(), vec!["policy", "majors"]);
    }
}
