use serde::{Deserialize, Serialize};

/// Configuration for the snake game
///
/// Coordinates are in pixels; every position is aligned to `cell_size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the playfield in pixels
    pub width: i32,
    /// Height of the playfield in pixels
    pub height: i32,
    /// Edge length of one cell in pixels
    pub cell_size: i32,
    /// Cells travelled per tick
    pub velocity: i32,
    /// Step budget before an episode is truncated
    pub max_steps: u32,
    /// Whether dying ends the episode; when false the snake respawns in place
    /// of termination and only truncation ends the episode
    pub death_ends_episode: bool,

    // Rewards (for RL)
    /// Reward for eating food
    pub food_reward: f32,
    /// Penalty for each step (encourages efficiency)
    pub step_penalty: f32,
    /// Penalty for dying
    pub death_penalty: f32,
    /// Weight of the distance-shaping term
    pub shaping_coef: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            cell_size: 10,
            velocity: 1,
            max_steps: 1000,
            death_ends_episode: true,
            food_reward: 10.0,
            step_penalty: -0.01,
            death_penalty: -10.0,
            shaping_coef: 0.1,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom grid size measured in cells
    pub fn new(columns: i32, rows: i32) -> Self {
        let defaults = Self::default();
        Self {
            width: columns * defaults.cell_size,
            height: rows * defaults.cell_size,
            ..defaults
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Number of cell columns
    pub fn columns(&self) -> i32 {
        self.width / self.cell_size
    }

    /// Number of cell rows
    pub fn rows(&self) -> i32 {
        self.height / self.cell_size
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cell_size <= 0 {
            return Err(format!("cell_size must be positive, got {}", self.cell_size));
        }

        if self.width < self.cell_size || self.height < self.cell_size {
            return Err(format!(
                "arena {}x{} must hold at least one {}px cell",
                self.width, self.height, self.cell_size
            ));
        }

        if self.width % self.cell_size != 0 || self.height % self.cell_size != 0 {
            return Err(format!(
                "arena {}x{} is not a multiple of cell_size {}",
                self.width, self.height, self.cell_size
            ));
        }

        if self.velocity < 1 {
            return Err(format!("velocity must be at least 1, got {}", self.velocity));
        }

        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.cell_size, 10);
        assert_eq!(config.columns(), 80);
        assert_eq!(config.rows(), 60);
        assert!(config.death_ends_episode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = GameConfig::new(15, 12);
        assert_eq!(config.width, 150);
        assert_eq!(config.height, 120);
        assert_eq!(config.columns(), 15);
        assert_eq!(config.rows(), 12);
    }

    #[test]
    fn test_validation() {
        let mut config = GameConfig::default();
        config.width = 805;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.velocity = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.max_steps = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.cell_size = 0;
        assert!(config.validate().is_err());
    }
}
