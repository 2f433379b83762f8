//! Keyboard play for the paddle games
//!
//! Volley puts the player on the left paddle (W/S or Up/Down) against the
//! tracking opponent. Breakout steers the paddle with A/D or Left/Right.
//! A paddle only moves on ticks that follow a key press, so holding a key
//! relies on the terminal's key repeat.

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

use crate::arcade::{
    BreakoutAction, BreakoutGame, BreakoutState, BreakoutStatus, VolleyAction, VolleyGame,
    VolleyState,
};
use crate::game::Direction;
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::{Renderer, Scene};

/// A paddle game driven by one steering key per tick
pub trait PaddleGame {
    type State: Scene;

    /// Advance one tick with the key pressed since the previous one;
    /// returns true when this tick ended the game
    fn play(&mut self, steer: Option<Direction>) -> bool;

    fn restart(&mut self);

    fn view(&self) -> &Self::State;

    /// Points won by the player
    fn points(&self) -> u32;
}

impl PaddleGame for VolleyGame {
    type State = VolleyState;

    fn play(&mut self, steer: Option<Direction>) -> bool {
        let action = match steer {
            Some(Direction::Up) => VolleyAction::Up,
            Some(Direction::Down) => VolleyAction::Down,
            _ => VolleyAction::Stay,
        };
        self.tick(action);
        // Rallies continue after every point
        false
    }

    fn restart(&mut self) {
        self.reset();
    }

    fn view(&self) -> &VolleyState {
        self.state()
    }

    fn points(&self) -> u32 {
        self.state().scores.0
    }
}

impl PaddleGame for BreakoutGame {
    type State = BreakoutState;

    fn play(&mut self, steer: Option<Direction>) -> bool {
        if self.state().status != BreakoutStatus::Active {
            return false;
        }
        let tick = match steer {
            Some(Direction::Left) => self.tick(BreakoutAction::Left),
            Some(Direction::Right) => self.tick(BreakoutAction::Right),
            _ => self.tick_idle(),
        };
        tick.status != BreakoutStatus::Active
    }

    fn restart(&mut self) {
        self.reset();
    }

    fn view(&self) -> &BreakoutState {
        self.state()
    }

    fn points(&self) -> u32 {
        self.state().score
    }
}

/// Keyboard-controlled paddle game in the terminal
pub struct ArcadeMode<G: PaddleGame> {
    game: G,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
    pending_steer: Option<Direction>,
}

impl<G: PaddleGame> ArcadeMode<G> {
    pub fn new(game: G) -> Self {
        Self {
            game,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
            pending_steer: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_game_loop(&mut terminal).await;

        self.cleanup_terminal(&mut terminal)?;

        info!(
            title = self.game.view().title().trim(),
            games = self.metrics.games_played,
            points = self.game.points(),
            "session ended"
        );

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Ball physics tick at 30 Hz, render at the same rate
        let mut tick_timer = interval(Duration::from_millis(33));
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                _ = tick_timer.tick() => {
                    self.update_game();
                }

                _ = render_timer.tick() => {
                    if !self.game.view().is_over() {
                        self.metrics.update();
                    }
                    let header = self.metrics.header();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, self.game.view(), &header);
                    }).context("Failed to draw frame")?;
                }

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

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.input_handler.handle_key_event(key) {
            KeyAction::Steer(direction) => self.pending_steer = Some(direction),
            KeyAction::Restart => self.reset_game(),
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    fn update_game(&mut self) {
        if self.game.view().is_over() {
            return;
        }
        let steer = self.pending_steer.take();
        if self.game.play(steer) {
            self.metrics.on_game_over(self.game.points());
        }
    }

    fn reset_game(&mut self) {
        self.game.restart();
        self.metrics.on_game_start();
        self.pending_steer = None;
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
    use crate::arcade::{BreakoutConfig, VolleyConfig};

    fn volley() -> ArcadeMode<VolleyGame> {
        ArcadeMode::new(VolleyGame::new(VolleyConfig::default(), 4).unwrap())
    }

    fn breakout() -> ArcadeMode<BreakoutGame> {
        ArcadeMode::new(BreakoutGame::new(BreakoutConfig::default(), 4).unwrap())
    }

    #[test]
    fn test_volley_steering_moves_player_paddle() {
        let mut mode = volley();
        let start = mode.game.view().agent.rect.y;

        mode.pending_steer = Some(Direction::Up);
        mode.update_game();
        assert_eq!(mode.game.view().agent.rect.y, start - 10.0);
        assert_eq!(mode.pending_steer, None);

        // No key since the last tick: the paddle stays put
        mode.update_game();
        assert_eq!(mode.game.view().agent.rect.y, start - 10.0);

        // Sideways keys don't move a vertical paddle
        mode.pending_steer = Some(Direction::Left);
        mode.update_game();
        assert_eq!(mode.game.view().agent.rect.y, start - 10.0);
    }

    #[test]
    fn test_breakout_steering_moves_paddle() {
        let mut mode = breakout();
        let start = mode.game.view().paddle.rect.x;

        mode.pending_steer = Some(Direction::Right);
        mode.update_game();
        assert_eq!(mode.game.view().paddle.rect.x, start + 10.0);

        mode.update_game();
        assert_eq!(mode.game.view().paddle.rect.x, start + 10.0);
    }

    #[test]
    fn test_breakout_miss_recorded_once() {
        let mut mode = breakout();
        // The first rebound off the wall lands wide of a centered paddle
        for _ in 0..2000 {
            mode.update_game();
        }
        assert_eq!(mode.game.view().status, BreakoutStatus::Missed);
        assert_eq!(mode.metrics.games_played, 1);

        mode.reset_game();
        assert!(!mode.game.view().is_over());
        assert_eq!(mode.game.view().steps, 0);
    }
}
