//! Observation vectors for each game
//!
//! Every layout is fixed per game; the `*_OBSERVATION_SIZE` constants give
//! the vector lengths the discretizers are built against.

use super::environment::Observation;
use crate::arcade::{BreakoutState, VolleyState};
use crate::game::GameState;

pub const SNAKE_OBSERVATION_SIZE: usize = 7;
pub const VOLLEY_OBSERVATION_SIZE: usize = 6;
pub const BREAKOUT_OBSERVATION_SIZE: usize = 6;

/// Snake observation
///
/// Layout:
/// - 0, 1: food offset from the head (x, y)
/// - 2, 3: food position
/// - 4, 5: head position
/// - 6: direction code (Up 0, Down 1, Left 2, Right 3)
pub fn snake_observation(state: &GameState) -> Observation {
    let head = state.snake.head();
    let food = state.food;
    vec![
        (food.x - head.x) as f32,
        (food.y - head.y) as f32,
        food.x as f32,
        food.y as f32,
        head.x as f32,
        head.y as f32,
        state.snake.direction().code() as f32,
    ]
}

/// Volley observation: `[ball_x, ball_y, ball_vx, ball_vy, agent_y, opponent_y]`
///
/// Paddle values are the top edge of each paddle.
pub fn volley_observation(state: &VolleyState) -> Observation {
    let velocity = state.ball.velocity();
    vec![
        state.ball.pos.x,
        state.ball.pos.y,
        velocity.x,
        velocity.y,
        state.agent.rect.y,
        state.opponent.rect.y,
    ]
}

/// Breakout observation: `[ball_x, ball_y, ball_vx, ball_vy, paddle_x, bricks_remaining]`
pub fn breakout_observation(state: &BreakoutState) -> Observation {
    let velocity = state.ball.velocity();
    vec![
        state.ball.pos.x,
        state.ball.pos.y,
        velocity.x,
        velocity.y,
        state.paddle.rect.x,
        state.bricks_remaining() as f32,
    ]
}
