//! Reinforcement learning layer
//!
//! Provides:
//! - The `Environment` contract and adapters for snake, volley and breakout
//! - Per-game observation vectors and their discretization into state keys
//! - An epsilon-greedy tabular Q-learner and its JSON persistence

pub mod breakout;
pub mod config;
pub mod discretizer;
pub mod environment;
pub mod learner;
pub mod observation;
pub mod persistence;
pub mod snake;
pub mod volley;

pub use breakout::{BreakoutEnvironment, BreakoutInfo};
pub use config::{EpsilonSchedule, LearnerConfig};
pub use discretizer::{Bin, Discretizer, StateKey};
pub use environment::{Environment, Observation, Step};
pub use learner::{QTable, TabularLearner};
pub use persistence::{ModelMetadata, load_q_table, save_q_table};
pub use snake::{SnakeEnvironment, SnakeInfo};
pub use volley::{VolleyEnvironment, VolleyInfo};
