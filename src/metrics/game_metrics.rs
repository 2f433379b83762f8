use std::time::{Duration, Instant};

/// Session statistics for keyboard play
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    /// Sum of final scores over finished games
    pub total_score: u64,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            total_score: 0,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_time = self.start_time.elapsed();
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.games_played += 1;
        self.total_score += u64::from(final_score);
        self.high_score = self.high_score.max(final_score);
    }

    pub fn average_score(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.total_score as f32 / self.games_played as f32
        }
    }

    /// Elapsed time of the current game as `MM:SS`
    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }

    /// Header values shown next to the board
    pub fn header(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Time", self.format_time()),
            ("Best", self.high_score.to_string()),
            ("Games", self.games_played.to_string()),
        ]
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_formatting() {
        let mut metrics = GameMetrics::new();
        metrics.elapsed_time = Duration::from_secs(125);
        assert_eq!(metrics.format_time(), "02:05");

        metrics.elapsed_time = Duration::from_secs(3661);
        assert_eq!(metrics.format_time(), "61:01");
    }

    #[test]
    fn test_score_tracking() {
        let mut metrics = GameMetrics::new();
        assert_eq!(metrics.average_score(), 0.0);

        metrics.on_game_over(10);
        metrics.on_game_over(5);
        assert_eq!(metrics.high_score, 10);
        assert_eq!(metrics.games_played, 2);
        assert!((metrics.average_score() - 7.5).abs() < 1e-5);

        metrics.on_game_over(15);
        assert_eq!(metrics.high_score, 15);
    }

    #[test]
    fn test_game_start_resets_time() {
        let mut metrics = GameMetrics::new();
        metrics.elapsed_time = Duration::from_secs(30);

        metrics.on_game_start();
        metrics.update();
        assert!(metrics.elapsed_time < Duration::from_secs(1));
    }

    #[test]
    fn test_header_values() {
        let mut metrics = GameMetrics::new();
        metrics.on_game_over(4);
        let header = metrics.header();
        assert_eq!(header[1], ("Best", "4".to_string()));
        assert_eq!(header[2], ("Games", "1".to_string()));
    }
}
