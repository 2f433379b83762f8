//! Terminal rendering for all games
//!
//! Simulation types never touch the display. An environment hands its state
//! to whatever `Render` implementation the driver attached to it.

pub mod renderer;
pub mod terminal;

pub use renderer::{Renderer, Scene};
pub use terminal::TerminalRenderer;

use anyhow::Result;

/// What the driver should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The viewer asked to stop
    Quit,
}

/// A display that can draw states of type `S`
pub trait Render<S> {
    fn draw(&mut self, state: &S) -> Result<Flow>;

    /// Release the display
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
