//! Brick-breaking game
//!
//! A paddle near the bottom of the field keeps the ball in play while the
//! ball clears a wall of bricks at the top.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::geometry::{Ball, Paddle, Rect, Vector2};
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakoutAction {
    Left,
    Right,
}

impl BreakoutAction {
    pub const ALL: [BreakoutAction; 2] = [BreakoutAction::Left, BreakoutAction::Right];

    pub fn x_factor(&self) -> f32 {
        match self {
            BreakoutAction::Left => -1.0,
            BreakoutAction::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakoutConfig {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    /// Distance from the bottom edge to the paddle's top
    pub paddle_offset: f32,
    pub ball_radius: f32,
    pub ball_speed: f32,
    pub brick_rows: usize,
    pub brick_columns: usize,
    pub brick_height: f32,
    /// Y coordinate of the first brick row
    pub brick_top: f32,
    pub max_steps: u32,

    pub brick_reward: f32,
    pub clear_reward: f32,
    pub miss_penalty: f32,
    pub distance_penalty_coef: f32,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 100.0,
            paddle_height: 10.0,
            paddle_speed: 10.0,
            paddle_offset: 100.0,
            ball_radius: 7.0,
            ball_speed: 7.0,
            brick_rows: 4,
            brick_columns: 10,
            brick_height: 20.0,
            brick_top: 40.0,
            max_steps: 1000,
            brick_reward: 1.0,
            clear_reward: 10.0,
            miss_penalty: -10.0,
            distance_penalty_coef: 0.01,
        }
    }
}

impl BreakoutConfig {
    pub fn brick_width(&self) -> f32 {
        self.width / self.brick_columns as f32
    }

    pub fn brick_count(&self) -> usize {
        self.brick_rows * self.brick_columns
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.brick_rows == 0 || self.brick_columns == 0 {
            return Err("brick_rows and brick_columns must be at least 1".to_string());
        }
        let wall_bottom = self.brick_top + self.brick_rows as f32 * self.brick_height;
        if wall_bottom >= self.height / 2.0 {
            return Err(format!(
                "brick wall reaches y={}, past the ball's serve point",
                wall_bottom
            ));
        }
        if self.paddle_width >= self.width {
            return Err(format!(
                "paddle_width {} must be narrower than width {}",
                self.paddle_width, self.width
            ));
        }
        if self.ball_speed <= 0.0 || self.paddle_speed <= 0.0 {
            return Err("ball_speed and paddle_speed must be positive".to_string());
        }
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub rect: Rect,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakoutStatus {
    Active,
    /// Ball fell past the bottom edge
    Missed,
    /// Every brick is gone
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutState {
    pub paddle: Paddle,
    pub ball: Ball,
    pub bricks: Vec<Brick>,
    pub score: u32,
    pub steps: u32,
    pub status: BreakoutStatus,
    pub width: f32,
    pub height: f32,
}

impl BreakoutState {
    pub fn bricks_remaining(&self) -> usize {
        self.bricks.iter().filter(|brick| brick.alive).count()
    }
}

/// Result of one breakout tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakoutTick {
    pub brick_broken: bool,
    pub status: BreakoutStatus,
}

pub struct BreakoutGame {
    config: BreakoutConfig,
    state: BreakoutState,
    rng: SmallRng,
}

impl BreakoutGame {
    pub fn new(config: BreakoutConfig, seed: u64) -> Result<Self, GameError> {
        config
            .validate()
            .map_err(|reason| GameError::InvalidConfig {
                game: "breakout",
                reason,
            })?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let state = Self::fresh_state(&config, &mut rng);
        Ok(Self { config, state, rng })
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn reset(&mut self) -> &BreakoutState {
        self.state = Self::fresh_state(&self.config, &mut self.rng);
        &self.state
    }

    /// Advance one tick; a finished game is left untouched
    pub fn tick(&mut self, action: BreakoutAction) -> BreakoutTick {
        self.advance(action.x_factor())
    }

    /// Advance one tick with the paddle held still (keyboard play)
    pub fn tick_idle(&mut self) -> BreakoutTick {
        self.advance(0.0)
    }

    fn advance(&mut self, x_factor: f32) -> BreakoutTick {
        let state = &mut self.state;
        if state.status != BreakoutStatus::Active {
            debug!(status = ?state.status, "tick after game end ignored");
            return BreakoutTick {
                brick_broken: false,
                status: state.status,
            };
        }

        let (w, h) = (self.config.width, self.config.height);
        state.steps += 1;
        state.paddle.shift(x_factor, 0.0, w, h);

        let ball = &mut state.ball;
        ball.advance();
        if ball.pos.x - ball.radius <= 0.0 {
            ball.direction.x = 1.0;
        } else if ball.pos.x + ball.radius >= w {
            ball.direction.x = -1.0;
        }
        if ball.pos.y - ball.radius <= 0.0 {
            ball.direction.y = 1.0;
        }

        if ball.pos.y + ball.radius >= h {
            state.status = BreakoutStatus::Missed;
            return BreakoutTick {
                brick_broken: false,
                status: state.status,
            };
        }

        let ball_rect = ball.rect();
        let hit = state
            .bricks
            .iter_mut()
            .find(|brick| brick.alive && brick.rect.intersects(&ball_rect));
        let brick_broken = match hit {
            Some(brick) => {
                brick.alive = false;
                ball.direction.y = -ball.direction.y;
                state.score += 1;
                true
            }
            None => false,
        };

        if ball.direction.y > 0.0 && ball_rect.intersects(&state.paddle.rect) {
            ball.direction.y = -1.0;
        }

        if state.bricks.iter().all(|brick| !brick.alive) {
            state.status = BreakoutStatus::Cleared;
        }

        BreakoutTick {
            brick_broken,
            status: state.status,
        }
    }

    pub fn state(&self) -> &BreakoutState {
        &self.state
    }

    pub fn config(&self) -> &BreakoutConfig {
        &self.config
    }

    fn fresh_state(config: &BreakoutConfig, rng: &mut SmallRng) -> BreakoutState {
        let brick_width = config.brick_width();
        let bricks = (0..config.brick_rows)
            .flat_map(|row| (0..config.brick_columns).map(move |col| (row, col)))
            .map(|(row, col)| Brick {
                rect: Rect::new(
                    col as f32 * brick_width,
                    config.brick_top + row as f32 * config.brick_height,
                    brick_width,
                    config.brick_height,
                ),
                alive: true,
            })
            .collect();

        let x_dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };

        BreakoutState {
            paddle: Paddle::new(
                (config.width - config.paddle_width) / 2.0,
                config.height - config.paddle_offset,
                config.paddle_width,
                config.paddle_height,
                config.paddle_speed,
            ),
            ball: Ball::new(
                Vector2::new(config.width / 2.0, config.height / 2.0),
                Vector2::new(x_dir, -1.0),
                config.ball_speed,
                config.ball_radius,
            ),
            bricks,
            score: 0,
            steps: 0,
            status: BreakoutStatus::Active,
            width: config.width,
            height: config.height,
        }
    }
}
