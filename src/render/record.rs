//! Recording canvas.
//!
//! [`DisplayList`] rasterizes nothing. It keeps every command together with
//! the draw state it was issued under, which makes draw routines easy to
//! inspect in tests and cheap to run in benchmarks.

use super::canvas::{Canvas2d, DrawState, Paint, Shape, StateStack};
use crate::color::Rgba;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Clear,
    Fill { shape: Shape, paint: Paint, state: DrawState },
    Stroke { shape: Shape, color: Rgba, state: DrawState },
}

impl Command {
    /// State the command was issued under, `None` for [`Command::Clear`].
    pub fn state(&self) -> Option<&DrawState> {
        match self {
            Command::Clear => None,
            Command::Fill { state, .. } | Command::Stroke { state, .. } => Some(state),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    states: StateStack,
    commands: Vec<Command>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drop recorded commands, keeping the current state.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn fills(&self) -> impl Iterator<Item = (&Shape, &Paint, &DrawState)> {
        self.commands.iter().filter_map(|c| match c {
            Command::Fill { shape, paint, state } => Some((shape, paint, state)),
            _ => None,
        })
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&Shape, &Rgba, &DrawState)> {
        self.commands.iter().filter_map(|c| match c {
            Command::Stroke { shape, color, state } => Some((shape, color, state)),
            _ => None,
        })
    }
}

impl Canvas2d for DisplayList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn states(&self) -> &StateStack {
        &self.states
    }

    fn states_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn clear(&mut self) {
        self.commands.push(Command::Clear);
    }

    fn fill(&mut self, shape: &Shape, paint: &Paint) {
        self.commands.push(Command::Fill {
            shape: shape.clone(),
            paint: paint.clone(),
            state: *self.state(),
        });
    }

    fn stroke(&mut self, shape: &Shape, color: Rgba) {
        self.commands.push(Command::Stroke {
            shape: shape.clone(),
            color,
            state: *self.state(),
        });
    }
}
