use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use crate::game::{Direction, GameConfig, GameEngine};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;

/// Keyboard-controlled snake in the terminal
pub struct HumanMode {
    engine: GameEngine,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
    /// Last steering key pressed since the previous tick
    pending_direction: Option<Direction>,
}

impl HumanMode {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let engine = GameEngine::new(config, seed).context("Failed to start game")?;

        Ok(Self {
            engine,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
            pending_direction: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        info!(
            games = self.metrics.games_played,
            best = self.metrics.high_score,
            "session ended"
        );

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Game ticks at 8 Hz (125ms per tick)
        let tick_interval = Duration::from_millis(125);
        let mut tick_timer = interval(tick_interval);

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event)?;
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    if self.engine.state().is_alive() {
                        self.update_game();
                    }
                }

                // Render frame
                _ = render_timer.tick() => {
                    if self.engine.state().is_alive() {
                        self.metrics.update();
                    }
                    let header = self.metrics.header();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, self.engine.state(), &header);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Steer(direction) => {
                    self.pending_direction = Some(direction);
                }
                KeyAction::Restart => {
                    self.reset_game()?;
                }
                KeyAction::Quit => {
                    self.should_quit = true;
                }
                KeyAction::None => {}
            }
        }

        Ok(())
    }

    fn update_game(&mut self) {
        // Without input the snake keeps its heading
        let direction = self
            .pending_direction
            .take()
            .unwrap_or_else(|| self.engine.state().snake.direction());

        match self.engine.tick(direction) {
            Ok(outcome) if !outcome.alive => {
                self.metrics.on_game_over(self.engine.state().score);
            }
            Ok(_) => {}
            Err(err) => {
                // The board is full; the game ends with the snake filling it
                info!(%err, score = self.engine.state().score, "board filled");
                self.metrics.on_game_over(self.engine.state().score);
            }
        }
    }

    fn reset_game(&mut self) -> Result<()> {
        self.engine.reset().context("Failed to restart game")?;
        self.metrics.on_game_start();
        self.pending_direction = None;
        Ok(())
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_initialization() {
        let mode = HumanMode::new(GameConfig::small(), 1).unwrap();
        assert!(mode.engine.state().is_alive());
        assert_eq!(mode.engine.state().score, 0);
    }

    #[test]
    fn test_steering_applies_on_next_tick() {
        let mut mode = HumanMode::new(GameConfig::new(20, 20), 1).unwrap();
        let heading = mode.engine.state().snake.direction();
        let turn = Direction::ALL
            .into_iter()
            .find(|d| *d != heading && !d.is_opposite(heading))
            .unwrap();

        mode.pending_direction = Some(turn);
        mode.update_game();
        assert_eq!(mode.pending_direction, None);
        if mode.engine.state().is_alive() {
            assert_eq!(mode.engine.state().snake.direction(), turn);
        }
    }

    #[test]
    fn test_game_over_recorded_once() {
        let mut mode = HumanMode::new(GameConfig::small(), 2).unwrap();
        for _ in 0..100 {
            if mode.engine.state().is_alive() {
                mode.update_game();
            }
        }
        // Heading straight on a 10x10 board hits a wall
        assert!(!mode.engine.state().is_alive());
        assert_eq!(mode.metrics.games_played, 1);
    }

    #[test]
    fn test_game_reset() {
        let mut mode = HumanMode::new(GameConfig::small(), 3).unwrap();
        while mode.engine.state().is_alive() {
            mode.update_game();
        }
        mode.reset_game().unwrap();
        assert_eq!(mode.engine.state().score, 0);
        assert_eq!(mode.engine.state().steps, 0);
        assert!(mode.engine.state().is_alive());
    }
}
