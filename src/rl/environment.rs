//! Environment contract shared by every game
//!
//! An environment owns one game simulation and exposes it as an episodic
//! decision process: `reset` starts an episode, `step` applies one discrete
//! action and advances the game by exactly one tick.

use std::fmt::Debug;

use anyhow::Result;

use crate::error::EnvError;
use crate::render::{Flow, Render};

/// Fixed-length numeric observation; the layout is documented per environment
pub type Observation = Vec<f32>;

/// Result of an environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step<I> {
    /// Next observation
    pub observation: Observation,

    /// Reward received
    pub reward: f32,

    /// Whether the episode ended through a game-ending condition
    pub terminated: bool,

    /// Whether the episode hit its step budget
    pub truncated: bool,

    /// Diagnostic details about the new state
    pub info: I,
}

impl<I> Step<I> {
    /// Either ending condition holds
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Core trait for RL environments
pub trait Environment {
    /// Game state handed to renderers
    type State;

    /// Diagnostic record returned alongside observations
    type Info: Clone + Debug;

    /// Short identifier of the game
    fn name(&self) -> &'static str;

    /// Size of the discrete action set; valid actions are `0..action_count()`
    fn action_count(&self) -> usize;

    /// Length of every observation vector
    fn observation_size(&self) -> usize;

    /// Game configuration, saved with a trained table
    fn game_config(&self) -> serde_json::Result<serde_json::Value>;

    /// Reseed the environment's random generator
    fn seed(&mut self, seed: u64);

    /// Start a new episode
    fn reset(&mut self) -> Result<(Observation, Self::Info), EnvError>;

    /// Apply one action and advance the game by one tick
    fn step(&mut self, action: usize) -> Result<Step<Self::Info>, EnvError>;

    /// Current game state (read-only)
    fn state(&self) -> &Self::State;

    /// Game-specific score of the current episode
    fn score(&self) -> u32;

    /// Attach a display; `render` and `close` delegate to it
    fn attach_renderer(&mut self, renderer: Box<dyn Render<Self::State>>);

    /// Draw the current state; a no-op without an attached renderer
    fn render(&mut self) -> Result<Flow>;

    /// Release the attached renderer, if any
    fn close(&mut self) -> Result<()>;
}

/// Map an action index onto a game's closed action set
///
/// Indices outside the set are rejected rather than mapped to a default.
pub(crate) fn decode_action<A: Copy>(actions: &[A], action: usize) -> Result<A, EnvError> {
    actions
        .get(action)
        .copied()
        .ok_or(EnvError::InvalidAction {
            action,
            action_count: actions.len(),
        })
}

/// Storage for an optional renderer, shared by the environment impls
pub(crate) struct Display<S> {
    renderer: Option<Box<dyn Render<S>>>,
}

impl<S> Display<S> {
    pub(crate) fn new() -> Self {
        Self { renderer: None }
    }

    pub(crate) fn attach(&mut self, renderer: Box<dyn Render<S>>) {
        self.renderer = Some(renderer);
    }

    pub(crate) fn draw(&mut self, state: &S) -> Result<Flow> {
        match self.renderer.as_mut() {
            Some(renderer) => renderer.draw(state),
            None => Ok(Flow::Continue),
        }
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        match self.renderer.take() {
            Some(mut renderer) => renderer.close(),
            None => Ok(()),
        }
    }
}
