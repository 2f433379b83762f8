//! Arcade RL - classic arcade games as reinforcement learning environments
//!
//! This library provides:
//! - Snake game logic on a pixel grid (game module)
//! - Paddle games: two-paddle volley and brick breaking (arcade module)
//! - Environment adapters, discretization and a tabular Q-learner (rl module)
//! - TUI rendering and keyboard input (render, input modules)
//! - Training and session statistics (metrics module)
//! - Keyboard play, training and evaluation drivers (modes module)

pub mod arcade;
pub mod error;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;
