use serde::Serialize;
use tracing::debug;

use super::environment::{Display, Environment, Observation, Step, decode_action};
use super::observation::{BREAKOUT_OBSERVATION_SIZE, breakout_observation};
use crate::arcade::{BreakoutAction, BreakoutConfig, BreakoutGame, BreakoutState, BreakoutStatus};
use crate::error::EnvError;
use crate::render::{Flow, Render};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakoutInfo {
    pub bricks_remaining: usize,
    pub score: u32,
    pub step: u32,
    pub status: BreakoutStatus,
}

/// Breakout environment: two actions, episode ends on a miss or a cleared wall
pub struct BreakoutEnvironment {
    game: BreakoutGame,
    display: Display<BreakoutState>,
}

impl BreakoutEnvironment {
    pub fn new(config: BreakoutConfig, seed: u64) -> Result<Self, EnvError> {
        Ok(Self::from_game(BreakoutGame::new(config, seed)?))
    }

    pub fn from_game(game: BreakoutGame) -> Self {
        Self {
            game,
            display: Display::new(),
        }
    }

    fn info(&self) -> BreakoutInfo {
        let state = self.game.state();
        BreakoutInfo {
            bricks_remaining: state.bricks_remaining(),
            score: state.score,
            step: state.steps,
            status: state.status,
        }
    }

    fn truncated(&self) -> bool {
        self.game.state().steps >= self.game.config().max_steps
    }
}

impl Environment for BreakoutEnvironment {
    type State = BreakoutState;
    type Info = BreakoutInfo;

    fn name(&self) -> &'static str {
        "breakout"
    }

    fn action_count(&self) -> usize {
        BreakoutAction::ALL.len()
    }

    fn observation_size(&self) -> usize {
        BREAKOUT_OBSERVATION_SIZE
    }

    fn game_config(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.game.config())
    }

    fn seed(&mut self, seed: u64) {
        self.game.seed(seed);
    }

    fn reset(&mut self) -> Result<(Observation, BreakoutInfo), EnvError> {
        let obs = breakout_observation(self.game.reset());
        Ok((obs, self.info()))
    }

    fn step(&mut self, action: usize) -> Result<Step<BreakoutInfo>, EnvError> {
        let action = decode_action(&BreakoutAction::ALL, action)?;

        if self.game.state().status != BreakoutStatus::Active {
            debug!(?action, "step after episode end");
            return Ok(Step {
                observation: breakout_observation(self.game.state()),
                reward: 0.0,
                terminated: true,
                truncated: self.truncated(),
                info: self.info(),
            });
        }

        let tick = self.game.tick(action);
        let config = self.game.config();
        let state = self.game.state();

        let (reward, terminated) = match tick.status {
            BreakoutStatus::Cleared => (config.clear_reward, true),
            BreakoutStatus::Missed => (config.miss_penalty, true),
            BreakoutStatus::Active if tick.brick_broken => (config.brick_reward, false),
            BreakoutStatus::Active => {
                let offset = (state.ball.pos.x - state.paddle.rect.center().x).abs();
                (-config.distance_penalty_coef * offset / config.width, false)
            }
        };

        Ok(Step {
            observation: breakout_observation(state),
            reward,
            terminated,
            truncated: self.truncated(),
            info: self.info(),
        })
    }

    fn state(&self) -> &BreakoutState {
        self.game.state()
    }

    /// Bricks broken so far
    fn score(&self) -> u32 {
        self.game.state().score
    }

    fn attach_renderer(&mut self, renderer: Box<dyn Render<BreakoutState>>) {
        self.display.attach(renderer);
    }

    fn render(&mut self) -> anyhow::Result<Flow> {
        self.display.draw(self.game.state())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.display.close()
    }
}
