//! Error types shared by the simulations and environment adapters

use thiserror::Error;

/// Failures raised inside a game simulation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Every cell of the arena is occupied, so no target can be placed
    #[error("no free cell left for a target in a {width}x{height} arena")]
    SpawnExhaustion { width: i32, height: i32 },

    /// A game was built from a configuration that fails validation
    #[error("invalid {game} config: {reason}")]
    InvalidConfig { game: &'static str, reason: String },
}

/// Failures surfaced at the environment boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Action index outside the environment's discrete action set
    #[error("invalid action {action}: expected an index below {action_count}")]
    InvalidAction { action: usize, action_count: usize },

    #[error(transparent)]
    Game(#[from] GameError),
}

impl EnvError {
    /// Whether this error ends the current episode (as opposed to a
    /// rejected request that left the simulation untouched)
    pub fn ends_episode(&self) -> bool {
        matches!(self, EnvError::Game(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EnvError::InvalidAction {
            action: 7,
            action_count: 4,
        };
        assert_eq!(
            err.to_string(),
            "invalid action 7: expected an index below 4"
        );

        let err: EnvError = GameError::SpawnExhaustion {
            width: 20,
            height: 10,
        }
        .into();
        assert!(err.to_string().contains("20x10"));
        assert!(err.ends_episode());

        let err = GameError::InvalidConfig {
            game: "volley",
            reason: "max_steps must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid volley config: max_steps must be at least 1"
        );
    }
}
