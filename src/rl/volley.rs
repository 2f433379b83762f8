use serde::Serialize;
use tracing::debug;

use super::environment::{Display, Environment, Observation, Step, decode_action};
use super::observation::{VOLLEY_OBSERVATION_SIZE, volley_observation};
use crate::arcade::{Point, VolleyAction, VolleyConfig, VolleyGame, VolleyState};
use crate::error::EnvError;
use crate::render::{Flow, Render};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolleyInfo {
    pub scores: (u32, u32),
    pub step: u32,
    pub point: Option<Point>,
    pub agent_touch: bool,
}

/// Volley environment: the agent plays the left paddle for a single point
pub struct VolleyEnvironment {
    game: VolleyGame,
    display: Display<VolleyState>,
    point_played: bool,
}

impl VolleyEnvironment {
    pub fn new(config: VolleyConfig, seed: u64) -> Result<Self, EnvError> {
        Ok(Self::from_game(VolleyGame::new(config, seed)?))
    }

    pub fn from_game(game: VolleyGame) -> Self {
        Self {
            game,
            display: Display::new(),
            point_played: false,
        }
    }

    fn info(&self, point: Option<Point>, agent_touch: bool) -> VolleyInfo {
        let state = self.game.state();
        VolleyInfo {
            scores: state.scores,
            step: state.steps,
            point,
            agent_touch,
        }
    }

    fn truncated(&self) -> bool {
        self.game.state().steps >= self.game.config().max_steps
    }
}

impl Environment for VolleyEnvironment {
    type State = VolleyState;
    type Info = VolleyInfo;

    fn name(&self) -> &'static str {
        "volley"
    }

    fn action_count(&self) -> usize {
        VolleyAction::ALL.len()
    }

    fn observation_size(&self) -> usize {
        VOLLEY_OBSERVATION_SIZE
    }

    fn game_config(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.game.config())
    }

    fn seed(&mut self, seed: u64) {
        self.game.seed(seed);
    }

    fn reset(&mut self) -> Result<(Observation, VolleyInfo), EnvError> {
        self.point_played = false;
        let obs = volley_observation(self.game.reset());
        Ok((obs, self.info(None, false)))
    }

    fn step(&mut self, action: usize) -> Result<Step<VolleyInfo>, EnvError> {
        let action = decode_action(&VolleyAction::ALL, action)?;

        if self.point_played {
            debug!(?action, "step after point ignored");
            return Ok(Step {
                observation: volley_observation(self.game.state()),
                reward: 0.0,
                terminated: true,
                truncated: self.truncated(),
                info: self.info(None, false),
            });
        }

        let tick = self.game.tick(action);
        let config = self.game.config();
        let state = self.game.state();

        let (reward, terminated) = match tick.point {
            Some(Point::Agent) => (config.score_reward, true),
            Some(Point::Opponent) => (config.concede_penalty, true),
            None => {
                let offset = (state.ball.pos.y - state.agent.rect.center().y).abs();
                let touch = if tick.agent_touch { config.hit_reward } else { 0.0 };
                (touch - config.distance_penalty_coef * offset / config.height, false)
            }
        };
        self.point_played = terminated;

        Ok(Step {
            observation: volley_observation(state),
            reward,
            terminated,
            truncated: self.truncated(),
            info: self.info(tick.point, tick.agent_touch),
        })
    }

    fn state(&self) -> &VolleyState {
        self.game.state()
    }

    /// Points won by the agent
    fn score(&self) -> u32 {
        self.game.state().scores.0
    }

    fn attach_renderer(&mut self, renderer: Box<dyn Render<VolleyState>>) {
        self.display.attach(renderer);
    }

    fn render(&mut self) -> anyhow::Result<Flow> {
        self.display.draw(self.game.state())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.display.close()
    }
}
