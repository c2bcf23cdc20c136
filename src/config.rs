//! Loader and metrics configuration
//!
//! Configuration is plain data with defaults for every field, so an empty
//! TOML file is a valid configuration. CLI flags override individual fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::GazeError;
use crate::metrics::AverageMode;
use crate::types::{ParticipantId, RecordKind, VisualizationCondition};

/// Default raw file template, relative to the data root
pub const DEFAULT_RAW_TEMPLATE: &str = "raw/{participant}/{participant}.{condition}{kind}.txt";

/// Default generated file template, relative to the data root
pub const DEFAULT_GENERATED_TEMPLATE: &str =
    "generated/{participant}/{participant}.{condition}{kind}.txt";

pub const DEFAULT_METADATA_FILE: &str = "Project_2_Additional_Participant_Data.csv";

/// Look-ahead offset for playback windows (ms)
pub const DEFAULT_LOOK_AHEAD_MS: f64 = 1000.0;

/// Largest bubble radius produced by the duration multiplier
pub const DEFAULT_RADIUS_SCALE: f64 = 25.0;

/// Radius factor for mouse click bubbles
pub const DEFAULT_CLICK_RADIUS: f64 = 100.0;

/// Data source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root directory of the data archive
    pub data_root: PathBuf,
    /// Raw record path template ({participant}, {condition}, {kind})
    pub raw_template: String,
    /// Generated stats path template
    pub generated_template: String,
    /// Metadata table file, relative to the data root
    pub metadata_file: String,
    /// Participants in canonical order
    pub participants: Vec<ParticipantId>,
    pub conditions: Vec<VisualizationCondition>,
    /// Per-file fetch timeout
    pub fetch_timeout_ms: u64,
    /// Files larger than this are treated as unavailable
    pub max_file_bytes: u64,
    pub metrics: MetricsConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            raw_template: DEFAULT_RAW_TEMPLATE.to_string(),
            generated_template: DEFAULT_GENERATED_TEMPLATE.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            participants: ParticipantId::defaults(),
            conditions: VisualizationCondition::ALL.to_vec(),
            fetch_timeout_ms: 5_000,
            max_file_bytes: 64 * 1024 * 1024,
            metrics: MetricsConfig::default(),
        }
    }
}

/// Derived metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub look_ahead_ms: f64,
    pub radius_scale: f64,
    pub click_radius: f64,
    pub average_mode: AverageMode,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            look_ahead_ms: DEFAULT_LOOK_AHEAD_MS,
            radius_scale: DEFAULT_RADIUS_SCALE,
            click_radius: DEFAULT_CLICK_RADIUS,
            average_mode: AverageMode::default(),
        }
    }
}

impl LoaderConfig {
    /// Parse TOML; missing fields take their defaults
    pub fn from_toml_str(toml_content: &str) -> Result<Self, GazeError> {
        let config: LoaderConfig =
            toml::from_str(toml_content).map_err(|e| GazeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, GazeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GazeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), GazeError> {
        if self.participants.is_empty() {
            return Err(GazeError::Config("participant list is empty".to_string()));
        }
        if self.conditions.is_empty() {
            return Err(GazeError::Config("condition list is empty".to_string()));
        }
        for (name, template) in [
            ("raw_template", &self.raw_template),
            ("generated_template", &self.generated_template),
        ] {
            let missing = ["{participant}", "{condition}", "{kind}"]
                .into_iter()
                .find(|placeholder| !template.contains(*placeholder));
            if let Some(placeholder) = missing {
                return Err(GazeError::Config(format!(
                    "{} is missing {}: {}",
                    name, placeholder, template
                )));
            }
        }
        if self.fetch_timeout_ms == 0 {
            return Err(GazeError::Config("fetch_timeout_ms must be > 0".to_string()));
        }
        if self.metrics.radius_scale <= 0.0 {
            return Err(GazeError::Config("radius_scale must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn raw_path(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        kind: RecordKind,
    ) -> PathBuf {
        self.data_root
            .join(expand_template(&self.raw_template, participant, condition, kind))
    }

    pub fn generated_path(
        &self,
        participant: &ParticipantId,
        condition: VisualizationCondition,
        kind: RecordKind,
    ) -> PathBuf {
        self.data_root.join(expand_template(
            &self.generated_template,
            participant,
            condition,
            kind,
        ))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_root.join(&self.metadata_file)
    }
}

fn expand_template(
    template: &str,
    participant: &ParticipantId,
    condition: VisualizationCondition,
    kind: RecordKind,
) -> String {
    template
        .replace("{participant}", participant.as_str())
        .replace("{condition}", condition.as_str())
        .replace("{kind}", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = LoaderConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.participants.len(), 31);
        assert_eq!(config.metrics.look_ahead_ms, 1000.0);
        assert_eq!(config.metrics.average_mode, AverageMode::PairwiseFold);
    }

    #[test]
    fn test_partial_toml() {
        let config = LoaderConfig::from_toml_str(
            r#"
            data_root = "/srv/gaze"
            participants = ["p2", "p1"]
            conditions = ["tree"]

            [metrics]
            look_ahead_ms = 500.0
            average_mode = "arithmetic_mean"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_root, PathBuf::from("/srv/gaze"));
        assert_eq!(config.participants[0].as_str(), "p2");
        assert_eq!(config.conditions, vec![VisualizationCondition::Tree]);
        assert_eq!(config.metrics.look_ahead_ms, 500.0);
        assert_eq!(config.metrics.radius_scale, 25.0);
        assert_eq!(config.metrics.average_mode, AverageMode::ArithmeticMean);
    }

    #[test]
    fn test_paths_follow_templates() {
        let config = LoaderConfig {
            data_root: PathBuf::from("/data"),
            ..Default::default()
        };
        let p3 = ParticipantId::new("p3");

        assert_eq!(
            config.raw_path(&p3, VisualizationCondition::Graph, RecordKind::Fxd),
            PathBuf::from("/data/raw/p3/p3.graphFXD.txt")
        );
        assert_eq!(
            config.generated_path(&p3, VisualizationCondition::Tree, RecordKind::Evd),
            PathBuf::from("/data/generated/p3/p3.treeEVD.txt")
        );
        assert_eq!(
            config.metadata_path(),
            PathBuf::from("/data/Project_2_Additional_Participant_Data.csv")
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LoaderConfig::from_toml_str("participants = []"),
            Err(GazeError::Config(_))
        ));
        assert!(LoaderConfig::from_toml_str("raw_template = \"raw.txt\"").is_err());
        assert!(matches!(
            LoaderConfig::from_toml_str(
                "generated_template = \"generated/{participant}/{participant}{kind}.txt\""
            ),
            Err(GazeError::Config(msg)) if msg.contains("{condition}")
        ));
        assert!(LoaderConfig::from_toml_str("fetch_timeout_ms = 0").is_err());
        assert!(LoaderConfig::from_toml_str("data_root = 5").is_err());
    }
}
