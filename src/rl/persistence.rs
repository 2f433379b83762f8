//! Q-table persistence
//!
//! A trained learner is stored as one JSON document: metadata describing how
//! the table was built, followed by the table entries as `(key, values)`
//! pairs sorted by key.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::config::LearnerConfig;
use super::discretizer::{Discretizer, StateKey};
use super::learner::{QTable, TabularLearner};

/// Metadata saved with the Q-table
///
/// Contains what is needed to reuse the table: the game it was trained on
/// and the discretizer that produced its keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Environment name (`snake`, `volley`, `breakout`)
    pub game: String,

    /// Game configuration the table was trained on
    pub game_config: Value,

    /// Width of every action-value vector
    pub action_count: usize,

    /// Learner configuration used during training
    pub learner_config: LearnerConfig,

    /// Discretizer that produced the state keys
    pub discretizer: Discretizer,

    /// Total environment steps taken during training
    pub training_steps: usize,

    /// Number of episodes trained
    pub episodes_trained: usize,

    /// Crate version that wrote the file
    pub version: String,
}

impl ModelMetadata {
    pub fn new(
        game: &str,
        game_config: Value,
        learner: &TabularLearner,
        discretizer: &Discretizer,
        training_steps: usize,
        episodes_trained: usize,
    ) -> Self {
        Self {
            game: game.to_string(),
            game_config,
            action_count: learner.action_count(),
            learner_config: learner.config().clone(),
            discretizer: discretizer.clone(),
            training_steps,
            episodes_trained,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Whether the table was trained on `game_config`; the step budget may
    /// differ between training and evaluation
    pub fn trained_on(&self, game_config: &Value) -> bool {
        config_matches(&self.game_config, game_config)
    }
}

fn config_matches(saved: &Value, current: &Value) -> bool {
    match (saved, current) {
        (Value::Object(saved), Value::Object(current)) => {
            fields(saved).count() == fields(current).count()
                && fields(saved).all(|(key, value)| {
                    current
                        .get(key)
                        .is_some_and(|other| config_matches(value, other))
                })
        }
        // Floats are only parsed back to within an ulp
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() <= 1e-6 * a.abs().max(1.0),
            _ => a == b,
        },
        _ => saved == current,
    }
}

fn fields(config: &Map<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    config.iter().filter(|(key, _)| key.as_str() != "max_steps")
}

#[derive(Serialize, Deserialize)]
struct QTableFile {
    metadata: ModelMetadata,
    entries: Vec<(StateKey, Vec<f32>)>,
}

/// Save a learner's Q-table with its metadata
///
/// Creates parent directories if they don't exist.
pub fn save_q_table(learner: &TabularLearner, metadata: &ModelMetadata, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let mut entries: Vec<(StateKey, Vec<f32>)> = learner
        .table()
        .iter()
        .map(|(key, values)| (key.clone(), values.clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let file = QTableFile {
        metadata: metadata.clone(),
        entries,
    };
    let json = serde_json::to_string(&file).context("Failed to serialize Q-table")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write Q-table to {:?}", path))?;

    Ok(())
}

/// Load a learner and its metadata
///
/// Fails if any stored value vector does not match the recorded action count.
pub fn load_q_table(path: &Path) -> Result<(TabularLearner, ModelMetadata)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read Q-table from {:?}", path))?;
    let file: QTableFile = serde_json::from_str(&json)
        .with_context(|| format!("Failed to deserialize Q-table from {:?}", path))?;

    let metadata = file.metadata;
    if metadata.action_count == 0 {
        bail!("Q-table at {:?} declares zero actions", path);
    }
    let table = QTable::from_entries(metadata.action_count, file.entries)
        .map_err(|err| anyhow::anyhow!(err))
        .with_context(|| format!("Invalid Q-table in {:?}", path))?;

    let learner = TabularLearner::from_table(table, metadata.learner_config.clone());
    Ok((learner, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use tempfile::TempDir;

    fn trained_learner() -> TabularLearner {
        let mut learner = TabularLearner::new(4, LearnerConfig::default());
        let a = StateKey(vec![1, 2, 3]);
        let b = StateKey(vec![3, 2, 1]);
        learner.update(&a, 1, 10.0, &b);
        learner.update(&b, 3, -10.0, &a);
        learner
    }

    fn metadata(learner: &TabularLearner) -> ModelMetadata {
        let config = GameConfig::default();
        let discretizer = Discretizer::for_snake(&config);
        let game_config = serde_json::to_value(&config).unwrap();
        ModelMetadata::new("snake", game_config, learner, &discretizer, 42, 3)
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q_table.json");

        let learner = trained_learner();
        let meta = metadata(&learner);
        save_q_table(&learner, &meta, &path).unwrap();

        assert!(path.exists());

        let (loaded, loaded_meta) = load_q_table(&path).unwrap();
        assert_eq!(loaded.table(), learner.table());
        assert_eq!(loaded_meta.game, "snake");
        assert_eq!(loaded_meta.discretizer, meta.discretizer);
        assert_eq!(loaded_meta.training_steps, 42);
        assert_eq!(loaded_meta.episodes_trained, 3);
        assert!(loaded_meta.trained_on(&meta.game_config));
        assert_eq!(loaded_meta.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_loaded_learner_acts_the_same() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q_table.json");
        let learner = trained_learner();
        save_q_table(&learner, &metadata(&learner), &path).unwrap();

        let (mut loaded, _) = load_q_table(&path).unwrap();
        let key = StateKey(vec![1, 2, 3]);
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(loaded.select_action(&key, 0.0, &mut rng), 1);
    }

    #[test]
    fn test_save_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/q_table.json");

        let learner = trained_learner();
        save_q_table(&learner, &metadata(&learner), &path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_load_nonexistent_fails() {
        let result = load_q_table(Path::new("/nonexistent/q_table.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_mismatched_widths() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("q_table.json");
        let learner = trained_learner();
        let mut meta = metadata(&learner);
        meta.action_count = 3;
        save_q_table(&learner, &meta, &path).unwrap();

        let err = load_q_table(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("expected 3"));
    }

    #[test]
    fn test_trained_on_ignores_step_budget() {
        let learner = trained_learner();
        let meta = metadata(&learner);

        let mut config = GameConfig::default();
        config.max_steps += 500;
        assert!(meta.trained_on(&serde_json::to_value(&config).unwrap()));

        let small = GameConfig::new(20, 20);
        assert!(!meta.trained_on(&serde_json::to_value(&small).unwrap()));
        assert!(!meta.trained_on(&Value::Null));
    }
}
