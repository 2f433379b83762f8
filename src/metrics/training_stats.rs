//! Training statistics tracking for tabular Q-learning
//!
//! Tracks episode rewards, lengths and scores over a rolling window, how each
//! episode ended, and the learner's exploration rate and table size.

use std::collections::VecDeque;

/// How an episode came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    /// A game-ending condition (death, lost or won point, miss, cleared wall)
    Terminated,
    /// The step budget ran out
    Truncated,
    /// The environment reported an error and the episode was abandoned
    Aborted,
}

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use arcade_rl::metrics::{EpisodeEnd, TrainingStats};
///
/// let mut stats = TrainingStats::new(100);
/// stats.record_episode(15.5, 150, 5, EpisodeEnd::Terminated);
/// stats.record_exploration(0.5, 1200);
///
/// assert_eq!(stats.total_episodes(), 1);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Episode scores (rolling window)
    episode_scores: VecDeque<u32>,

    /// Best total reward of any episode so far
    best_reward: Option<f32>,

    terminated: usize,
    truncated: usize,
    aborted: usize,

    /// Exploration rate in effect for the latest episode
    epsilon: f64,

    /// Number of states in the Q-table
    table_size: usize,

    total_episodes: usize,
    total_steps: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the last `window_size` episodes for averages
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_scores: VecDeque::with_capacity(window_size),
            best_reward: None,
            terminated: 0,
            truncated: 0,
            aborted: 0,
            epsilon: 1.0,
            table_size: 0,
            total_episodes: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    pub fn record_episode(&mut self, reward: f32, length: usize, score: u32, end: EpisodeEnd) {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.episode_scores, score, self.window_size);
        self.best_reward = Some(self.best_reward.map_or(reward, |best| best.max(reward)));

        match end {
            EpisodeEnd::Terminated => self.terminated += 1,
            EpisodeEnd::Truncated => self.truncated += 1,
            EpisodeEnd::Aborted => self.aborted += 1,
        }

        self.total_episodes += 1;
        self.total_steps += length;
    }

    /// Record the learner's current exploration rate and table size
    pub fn record_exploration(&mut self, epsilon: f64, table_size: usize) {
        self.epsilon = epsilon;
        self.table_size = table_size;
    }

    /// Mean episode reward over the rolling window, or 0.0 if empty
    pub fn mean_episode_reward(&self) -> f32 {
        if self.episode_rewards.is_empty() {
            0.0
        } else {
            self.episode_rewards.iter().sum::<f32>() / self.episode_rewards.len() as f32
        }
    }

    pub fn mean_episode_length(&self) -> f32 {
        let sum: usize = self.episode_lengths.iter().sum();
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            sum as f32 / self.episode_lengths.len() as f32
        }
    }

    pub fn mean_episode_score(&self) -> f32 {
        let sum: u32 = self.episode_scores.iter().sum();
        if self.episode_scores.is_empty() {
            0.0
        } else {
            sum as f32 / self.episode_scores.len() as f32
        }
    }

    pub fn best_reward(&self) -> Option<f32> {
        self.best_reward
    }

    /// Episode counts by ending: (terminated, truncated, aborted)
    pub fn endings(&self) -> (usize, usize, usize) {
        (self.terminated, self.truncated, self.aborted)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn table_size(&self) -> usize {
        self.table_size
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the current statistics
    ///
    /// `Episodes: 1 | Steps: 150 | Reward: 15.50 | Score: 5.00 | Len: 150.0 | Eps: 0.500 | States: 1200`
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Reward: {:.2} | Score: {:.2} | Len: {:.1} | Eps: {:.3} | States: {}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_reward(),
            self.mean_episode_score(),
            self.mean_episode_length(),
            self.epsilon,
            self.table_size,
        )
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
