//! Two-paddle volley game
//!
//! The agent controls the left paddle; the right paddle follows the ball on
//! its own. A point is scored when the ball leaves the field through one of
//! the side edges.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::geometry::{Ball, Paddle, Vector2};
use crate::error::GameError;

/// Agent paddle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolleyAction {
    Stay,
    Up,
    Down,
}

impl VolleyAction {
    pub const ALL: [VolleyAction; 3] = [VolleyAction::Stay, VolleyAction::Up, VolleyAction::Down];

    /// Vertical movement factor
    pub fn y_factor(&self) -> f32 {
        match self {
            VolleyAction::Stay => 0.0,
            VolleyAction::Up => -1.0,
            VolleyAction::Down => 1.0,
        }
    }
}

/// Which side won a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Point {
    Agent,
    Opponent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolleyConfig {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    /// Distance of each paddle from its side edge
    pub paddle_margin: f32,
    pub ball_radius: f32,
    pub ball_speed: f32,
    /// Opponent ignores ball offsets smaller than this
    pub opponent_dead_zone: f32,
    pub max_steps: u32,

    pub score_reward: f32,
    pub concede_penalty: f32,
    pub hit_reward: f32,
    pub distance_penalty_coef: f32,
}

impl Default for VolleyConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 10.0,
            paddle_height: 100.0,
            paddle_speed: 10.0,
            paddle_margin: 20.0,
            ball_radius: 7.0,
            ball_speed: 7.0,
            opponent_dead_zone: 10.0,
            max_steps: 1000,
            score_reward: 10.0,
            concede_penalty: -10.0,
            hit_reward: 1.0,
            distance_penalty_coef: 0.01,
        }
    }
}

impl VolleyConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 2.0 * (self.paddle_margin + self.paddle_width) {
            return Err(format!("width {} leaves no room between paddles", self.width));
        }
        if self.height <= self.paddle_height {
            return Err(format!(
                "height {} must exceed paddle_height {}",
                self.height, self.paddle_height
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolleyState {
    pub agent: Paddle,
    pub opponent: Paddle,
    pub ball: Ball,
    /// Points won by (agent, opponent)
    pub scores: (u32, u32),
    pub steps: u32,
    pub width: f32,
    pub height: f32,
}

/// Result of one volley tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolleyTick {
    pub point: Option<Point>,
    /// Ball overlaps the agent paddle after the move
    pub agent_touch: bool,
}

pub struct VolleyGame {
    config: VolleyConfig,
    state: VolleyState,
    serve_x: f32,
    rng: SmallRng,
}

impl VolleyGame {
    pub fn new(config: VolleyConfig, seed: u64) -> Result<Self, GameError> {
        config
            .validate()
            .map_err(|reason| GameError::InvalidConfig {
                game: "volley",
                reason,
            })?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let serve_x = 1.0;
        let state = Self::fresh_state(&config, serve_x, &mut rng);
        Ok(Self {
            config,
            state,
            serve_x,
            rng,
        })
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Center the paddles and serve a fresh ball toward the other side
    pub fn reset(&mut self) -> &VolleyState {
        self.serve_x = -self.serve_x;
        self.state = Self::fresh_state(&self.config, self.serve_x, &mut self.rng);
        &self.state
    }

    pub fn tick(&mut self, action: VolleyAction) -> VolleyTick {
        let (w, h) = (self.config.width, self.config.height);
        let state = &mut self.state;
        state.steps += 1;

        state.agent.shift(0.0, action.y_factor(), w, h);

        let paddle_center = state.opponent.rect.center().y;
        if state.ball.pos.y < paddle_center - self.config.opponent_dead_zone {
            state.opponent.shift(0.0, -1.0, w, h);
        } else if state.ball.pos.y > paddle_center + self.config.opponent_dead_zone {
            state.opponent.shift(0.0, 1.0, w, h);
        }

        state.ball.advance();
        if state.ball.pos.y <= 0.0 {
            state.ball.direction.y = 1.0;
        } else if state.ball.pos.y >= h {
            state.ball.direction.y = -1.0;
        }

        let point = if state.ball.pos.x <= 0.0 {
            Some(Point::Opponent)
        } else if state.ball.pos.x >= w {
            Some(Point::Agent)
        } else {
            None
        };

        let ball_rect = state.ball.rect();
        let agent_touch = ball_rect.intersects(&state.agent.rect);
        if agent_touch {
            state.ball.direction.x = 1.0;
        } else if ball_rect.intersects(&state.opponent.rect) {
            state.ball.direction.x = -1.0;
        }

        if let Some(point) = point {
            match point {
                Point::Agent => state.scores.0 += 1,
                Point::Opponent => state.scores.1 += 1,
            }
            self.serve_x = -self.serve_x;
            let y_dir = random_sign(&mut self.rng);
            self.state.ball = Self::serve(&self.config, self.serve_x, y_dir);
        }

        VolleyTick { point, agent_touch }
    }

    pub fn state(&self) -> &VolleyState {
        &self.state
    }

    pub fn config(&self) -> &VolleyConfig {
        &self.config
    }

    fn serve(config: &VolleyConfig, x_dir: f32, y_dir: f32) -> Ball {
        Ball::new(
            Vector2::new(config.width / 2.0, config.height / 2.0),
            Vector2::new(x_dir, y_dir),
            config.ball_speed,
            config.ball_radius,
        )
    }

    fn fresh_state(config: &VolleyConfig, serve_x: f32, rng: &mut SmallRng) -> VolleyState {
        let paddle_y = config.height / 2.0 - config.paddle_height / 2.0;
        let paddle = |x: f32| {
            Paddle::new(
                x,
                paddle_y,
                config.paddle_width,
                config.paddle_height,
                config.paddle_speed,
            )
        };

        VolleyState {
            agent: paddle(config.paddle_margin),
            opponent: paddle(config.width - config.paddle_margin - config.paddle_width),
            ball: Self::serve(config, serve_x, random_sign(rng)),
            scores: (0, 0),
            steps: 0,
            width: config.width,
            height: config.height,
        }
    }
}

fn random_sign(rng: &mut SmallRng) -> f32 {
    if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
}
