//! Program drivers: keyboard play, training and evaluation

pub mod arcade;
pub mod evaluate;
pub mod human;
pub mod train;

pub use arcade::{ArcadeMode, PaddleGame};
pub use evaluate::{EpisodeSummary, EvalConfig, EvalMode, EvalReport};
pub use human::HumanMode;
pub use train::{EpisodeReport, TrainConfig, TrainMode};
