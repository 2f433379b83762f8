//! Observation binning for tabular learning
//!
//! Each observation dimension is binned on its own fixed range with evenly
//! spaced edges. The bin index is the number of edges at or below the value,
//! so a dimension with `n` edges yields indices `0..=n`.

use serde::{Deserialize, Serialize};

use crate::arcade::{BreakoutConfig, VolleyConfig};
use crate::game::GameConfig;

/// Binning of one observation dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub low: f32,
    pub high: f32,
    /// Number of evenly spaced edges from `low` to `high`; zero ignores the dimension
    pub edges: usize,
}

impl Bin {
    pub fn new(low: f32, high: f32, edges: usize) -> Self {
        Self { low, high, edges }
    }

    /// A dimension that always maps to bin 0
    pub fn ignored() -> Self {
        Self::new(0.0, 0.0, 0)
    }

    /// Splits at zero: negative values map to 0, others to 1
    pub fn sign() -> Self {
        Self::new(0.0, 0.0, 1)
    }

    fn edge(&self, i: usize) -> f32 {
        if self.edges <= 1 {
            return self.low;
        }
        self.low + (self.high - self.low) * i as f32 / (self.edges - 1) as f32
    }

    pub fn index(&self, value: f32) -> u16 {
        (0..self.edges).filter(|&i| self.edge(i) <= value).count() as u16
    }
}

/// Discretized observation used as a Q-table key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(pub Vec<u16>);

/// Maps observations to state keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    bins: Vec<Bin>,
}

impl Discretizer {
    pub fn new(bins: Vec<Bin>) -> Self {
        Self { bins }
    }

    /// Snake layout: offsets, food and head coordinates, direction code
    pub fn for_snake(config: &GameConfig) -> Self {
        let (w, h) = (config.width as f32, config.height as f32);
        Self::new(vec![
            Bin::new(-w, w, 10),
            Bin::new(-h, h, 10),
            Bin::new(0.0, w, 8),
            Bin::new(0.0, h, 8),
            Bin::new(0.0, w, 8),
            Bin::new(0.0, h, 8),
            Bin::new(0.0, 3.0, 4),
        ])
    }

    /// Volley layout: 50-pixel ball cells, ball heading and agent paddle
    /// height; ball vertical heading and the opponent are ignored
    pub fn for_volley(config: &VolleyConfig) -> Self {
        let paddle_range = config.height - config.paddle_height;
        Self::new(vec![
            Bin::new(0.0, config.width, edges_every(config.width, 50.0)),
            Bin::new(0.0, config.height, edges_every(config.height, 50.0)),
            Bin::sign(),
            Bin::ignored(),
            Bin::new(0.0, paddle_range, edges_every(paddle_range, 50.0)),
            Bin::ignored(),
        ])
    }

    /// Breakout layout: 50-pixel ball cells, ball heading and paddle column
    pub fn for_breakout(config: &BreakoutConfig) -> Self {
        let paddle_range = config.width - config.paddle_width;
        Self::new(vec![
            Bin::new(0.0, config.width, edges_every(config.width, 50.0)),
            Bin::new(0.0, config.height, edges_every(config.height, 50.0)),
            Bin::sign(),
            Bin::sign(),
            Bin::new(0.0, paddle_range, edges_every(paddle_range, 50.0)),
            Bin::ignored(),
        ])
    }

    /// Number of observation dimensions this discretizer expects
    pub fn dims(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Discretize an observation
    ///
    /// Panics if the observation length does not match `dims()`.
    pub fn discretize(&self, observation: &[f32]) -> StateKey {
        assert_eq!(
            observation.len(),
            self.bins.len(),
            "observation has {} values, discretizer expects {}",
            observation.len(),
            self.bins.len()
        );
        StateKey(
            self.bins
                .iter()
                .zip(observation)
                .map(|(bin, &value)| bin.index(value))
                .collect(),
        )
    }
}

/// Edge count giving one bin per `step` across `[0, range]`
fn edges_every(range: f32, step: f32) -> usize {
    (range / step).floor() as usize + 1
}
