//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! It is driven both by human play and by the RL environment adapters.

pub mod action;
pub mod config;
pub mod engine;
pub mod spawner;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use config::GameConfig;
pub use engine::{GameEngine, TickOutcome};
pub use spawner::spawn_target;
pub use state::{Arena, CollisionType, GameState, GameStatus, Position, Snake};
