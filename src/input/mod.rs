//! Keyboard input mapping

pub mod handler;

pub use handler::{InputHandler, KeyAction};
