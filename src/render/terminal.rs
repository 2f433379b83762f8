use std::io::{Stderr, stderr};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use super::renderer::{Renderer, Scene};
use super::{Flow, Render};
use crate::input::InputHandler;

/// Renders agent play to the terminal's alternate screen
///
/// Between frames it drains pending key presses so the viewer can stop a run
/// with Q, Esc or Ctrl+C.
pub struct TerminalRenderer {
    terminal: Option<Terminal<CrosstermBackend<Stderr>>>,
    renderer: Renderer,
    input_handler: InputHandler,
}

impl TerminalRenderer {
    /// Switch the terminal into raw alternate-screen mode
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        Ok(Self {
            terminal: Some(terminal),
            renderer: Renderer::viewer(),
            input_handler: InputHandler::new(),
        })
    }

    fn quit_requested(&self) -> Result<bool> {
        while event::poll(Duration::ZERO).context("Failed to poll terminal events")? {
            if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
                if key.kind == KeyEventKind::Press && self.input_handler.is_quit(key) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn restore(&mut self) -> Result<()> {
        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

impl<S: Scene> Render<S> for TerminalRenderer {
    fn draw(&mut self, state: &S) -> Result<Flow> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(Flow::Quit);
        };
        terminal
            .draw(|frame| self.renderer.render(frame, state, &[]))
            .context("Failed to draw frame")?;

        if self.quit_requested()? {
            return Ok(Flow::Quit);
        }
        Ok(Flow::Continue)
    }

    fn close(&mut self) -> Result<()> {
        self.restore()
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(%err, "terminal not restored");
        }
    }
}
