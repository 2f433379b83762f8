//! Tabular Q-learning hyperparameter configuration

use serde::{Deserialize, Serialize};

/// Configuration for the tabular Q-learning update
///
/// # Example
///
/// ```rust
/// use arcade_rl::rl::LearnerConfig;
///
/// let config = LearnerConfig {
///     alpha: 0.2,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Learning rate applied to each temporal-difference error
    ///
    /// Default: 0.1
    pub alpha: f32,

    /// Discount factor for future rewards
    ///
    /// Default: 0.99
    pub gamma: f32,

    /// Whether transitions that end an episode still bootstrap from the
    /// value of the state they land in
    ///
    /// When false, the trainer routes terminated transitions through
    /// `TabularLearner::update_terminal` and the target is the reward alone.
    /// Truncated transitions always bootstrap.
    ///
    /// Default: true
    pub terminal_bootstrap: bool,
}

impl LearnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    ///
    /// Returns `Err(String)` with a message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(format!("alpha must be in (0, 1], got {}", self.alpha));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        Ok(())
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.99,
            terminal_bootstrap: true,
        }
    }
}

/// Per-episode exploration rate: `max(start * decay^episode, min)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    /// Default: 1.0
    pub start: f64,

    /// Floor the rate never decays below
    ///
    /// Default: 0.05
    pub min: f64,

    /// Multiplicative decay applied after each episode
    ///
    /// Default: 0.995
    pub decay: f64,
}

impl EpsilonSchedule {
    /// Exploration rate for a zero-based episode index
    pub fn value(&self, episode: usize) -> f64 {
        let exponent = i32::try_from(episode).unwrap_or(i32::MAX);
        (self.start * self.decay.powi(exponent)).max(self.min)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.start) {
            return Err(format!("epsilon start must be in [0, 1], got {}", self.start));
        }

        if !(0.0..=1.0).contains(&self.min) {
            return Err(format!("epsilon min must be in [0, 1], got {}", self.min));
        }

        if self.min > self.start {
            return Err(format!(
                "epsilon min ({}) cannot exceed start ({})",
                self.min, self.start
            ));
        }

        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(format!("epsilon decay must be in (0, 1], got {}", self.decay));
        }

        Ok(())
    }
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self {
            start: 1.0,
            min: 0.05,
            decay: 0.995,
        }
    }
}
