//! Paddle-based arcade games: two-paddle volley and brick breaking
//!
//! These share float geometry and differ from the snake game only in their
//! state shape; they plug into the same environment contract in `rl`.

pub mod breakout;
pub mod geometry;
pub mod volley;

pub use breakout::{BreakoutAction, BreakoutConfig, BreakoutGame, BreakoutState, BreakoutStatus};
pub use geometry::{Ball, Paddle, Rect, Vector2};
pub use volley::{Point, VolleyAction, VolleyConfig, VolleyGame, VolleyState};
