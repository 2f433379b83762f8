//! Tabular Q-learning agent

use std::collections::HashMap;

use rand::Rng;

use super::config::LearnerConfig;
use super::discretizer::StateKey;

/// Action values per discretized state
///
/// Unseen states read as all zeros and are materialized on first mutable
/// access. Entries are never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: HashMap<StateKey, Vec<f32>>,
    action_count: usize,
}

impl QTable {
    pub fn new(action_count: usize) -> Self {
        assert!(action_count > 0, "a Q-table needs at least one action");
        Self {
            values: HashMap::new(),
            action_count,
        }
    }

    /// Rebuild a table from stored entries
    ///
    /// Every value vector must hold exactly `action_count` entries.
    pub fn from_entries(
        action_count: usize,
        entries: impl IntoIterator<Item = (StateKey, Vec<f32>)>,
    ) -> Result<Self, String> {
        let mut table = Self::new(action_count);
        for (key, values) in entries {
            if values.len() != action_count {
                return Err(format!(
                    "state {:?} has {} action values, expected {}",
                    key.0,
                    values.len(),
                    action_count
                ));
            }
            table.values.insert(key, values);
        }
        Ok(table)
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Stored values for a state, if it has been visited
    pub fn get(&self, key: &StateKey) -> Option<&[f32]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Values for a state, materializing zeros on first access
    pub fn values_mut(&mut self, key: &StateKey) -> &mut Vec<f32> {
        let action_count = self.action_count;
        self.values
            .entry(key.clone())
            .or_insert_with(|| vec![0.0; action_count])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Vec<f32>)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Index of the largest value; ties go to the lowest index
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}

fn max_value(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Epsilon-greedy tabular Q-learner
#[derive(Debug, Clone)]
pub struct TabularLearner {
    table: QTable,
    config: LearnerConfig,
}

impl TabularLearner {
    pub fn new(action_count: usize, config: LearnerConfig) -> Self {
        Self::from_table(QTable::new(action_count), config)
    }

    pub fn from_table(table: QTable, config: LearnerConfig) -> Self {
        Self { table, config }
    }

    /// Pick an action: uniformly random with probability `epsilon`,
    /// otherwise the greedy action
    pub fn select_action<R: Rng>(&mut self, key: &StateKey, epsilon: f64, rng: &mut R) -> usize {
        if rng.gen::<f64>() < epsilon {
            rng.gen_range(0..self.table.action_count())
        } else {
            argmax(self.table.values_mut(key))
        }
    }

    /// Greedy action for a visited state, without touching the table
    pub fn greedy_action(&self, key: &StateKey) -> Option<usize> {
        self.table.get(key).map(argmax)
    }

    /// One-step Q-learning update:
    /// `Q[s][a] += alpha * (reward + gamma * max Q[s'] - Q[s][a])`
    pub fn update(&mut self, key: &StateKey, action: usize, reward: f32, next_key: &StateKey) {
        let next_best = max_value(self.table.values_mut(next_key));
        self.apply(key, action, reward + self.config.gamma * next_best);
    }

    /// Update for a transition into a terminal state: the target is the
    /// reward alone
    pub fn update_terminal(&mut self, key: &StateKey, action: usize, reward: f32) {
        self.apply(key, action, reward);
    }

    fn apply(&mut self, key: &StateKey, action: usize, target: f32) {
        assert!(
            action < self.table.action_count(),
            "action {} out of range for {} actions",
            action,
            self.table.action_count()
        );
        let alpha = self.config.alpha;
        let q = &mut self.table.values_mut(key)[action];
        *q += alpha * (target - *q);
    }

    pub fn values(&self, key: &StateKey) -> Option<&[f32]> {
        self.table.get(key)
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn action_count(&self) -> usize {
        self.table.action_count()
    }

    /// Number of materialized states
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
