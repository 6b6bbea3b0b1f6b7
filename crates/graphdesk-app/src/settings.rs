use anyhow::{Context, Result};
use graphdesk_core::IdStrategy;
use graphdesk_graph::{EvidenceBuilder, FieldNames, GroupingTable, LayoutMode, LayoutParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    pub layout: LayoutSettings,
    pub query: QuerySettings,
    pub tutor: TutorSettings,
    pub jobs: JobSettings,
    pub grouping: GroupingTable,
    pub evidence: EvidenceSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub mode: LayoutMode,
    pub params: LayoutParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub overview_limit: usize,
    pub expand_limit: usize,
    pub path_depth: u32,
    pub path_limit: usize,
    pub search_limit: usize,
    pub catalog_limit: usize,
    /// Linked nodes listed per label in skill plans and competency guides.
    pub related_limit: usize,
    pub id_strategy: IdStrategy,
    pub fields: FieldNames,
    /// Drop responses that arrive after a newer one was already applied.
    pub discard_stale_responses: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            overview_limit: 200,
            expand_limit: 100,
            path_depth: 2,
            path_limit: 200,
            search_limit: 50,
            catalog_limit: 100,
            related_limit: 10,
            id_strategy: IdStrategy::default(),
            fields: FieldNames::default(),
            discard_stale_responses: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub module_name: Option<String>,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            timeout_secs: 60,
            module_name: None,
        }
    }
}

impl TutorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    /// Database uploaded documents are ingested into.
    pub database: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            poll_interval_ms: 1000,
            timeout_secs: 30,
            database: "neo4j".to_string(),
        }
    }
}

impl JobSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Caps on the evidence sent to the tutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceSettings {
    pub max_foci: usize,
    pub max_neighbors: usize,
    pub max_relations: usize,
    pub max_links: usize,
    pub max_per_category: usize,
}

impl Default for EvidenceSettings {
    fn default() -> Self {
        let builder = EvidenceBuilder::default();
        Self {
            max_foci: builder.max_foci,
            max_neighbors: builder.max_neighbors,
            max_relations: builder.max_relations,
            max_links: builder.max_links,
            max_per_category: builder.max_per_category,
        }
    }
}

impl EvidenceSettings {
    pub fn builder(&self) -> EvidenceBuilder {
        EvidenceBuilder {
            max_foci: self.max_foci,
            max_neighbors: self.max_neighbors,
            max_relations: self.max_relations,
            max_links: self.max_links,
            max_per_category: self.max_per_category,
        }
    }
}

impl StudioSettings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("graphdesk").join("settings.json"))
    }

    /// Reads settings from `path`. A missing file yields the defaults; fields
    /// absent from the file keep their default values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Loads from the platform config directory, falling back to defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = StudioSettings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, StudioSettings::default());
        assert_eq!(settings.query.overview_limit, 200);
        assert_eq!(settings.jobs.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.jobs.database, "neo4j");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"layout": {"mode": "radial"}, "query": {"discard_stale_responses": true}}"#,
        )
        .unwrap();

        let settings = StudioSettings::load(&path).unwrap();
        assert_eq!(settings.layout.mode, LayoutMode::Radial);
        assert_eq!(settings.layout.params, LayoutParams::default());
        assert!(settings.query.discard_stale_responses);
        assert_eq!(settings.query.path_depth, 2);
        assert_eq!(settings.query.related_limit, 10);
        assert_eq!(settings.grouping, GroupingTable::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = StudioSettings::default();
        settings.tutor.module_name = Some("Fractions".into());
        settings.grouping.special.push("Task".into());

        settings.save(&path).unwrap();
        assert_eq!(StudioSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = StudioSettings::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings"));
    }

    #[test]
    fn test_evidence_caps_feed_builder() {
        let caps = EvidenceSettings {
            max_foci: 1,
            ..EvidenceSettings::default()
        };
        assert_eq!(caps.builder().max_foci, 1);
        assert_eq!(caps.builder().max_links, 30);
    }
}
