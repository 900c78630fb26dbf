//! Touch gesture interpreter.
//!
//! Consumes ordered touch samples plus virtual-clock timer expiry and emits discrete
//! remote-control [`Action`]s. One touch session is live at a time; it starts with the first
//! contact-down and ends when the contact count returns to zero.

mod engine;

pub use engine::{GestureEngine, GestureOutput, MAX_ACTIONS_PER_TICK};

use crate::action::Action;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// One pointer sample.
///
/// `touch_count` is the number of contacts down after the event; for `End` that is the number
/// still remaining and `points[0]` is the contact that was lifted. Only the first two contacts
/// carry geometry the interpreter uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSample {
    pub phase: TouchPhase,
    pub touch_count: u8,
    pub points: [TouchPoint; 2],
}

impl TouchSample {
    pub fn new(phase: TouchPhase, touch_count: u8, points: &[TouchPoint]) -> Self {
        let mut slots = [TouchPoint::default(); 2];
        for (slot, point) in slots.iter_mut().zip(points) {
            *slot = *point;
        }
        Self {
            phase,
            touch_count,
            points: slots,
        }
    }

    pub fn primary(&self) -> TouchPoint {
        self.points[0]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GesturePhase {
    #[default]
    Idle,
    SinglePending,
    DragPending,
    Move,
    DragActive,
    TwoFingerPending,
    Scroll,
    Pinch,
    SwipePending,
}

/// Snapshot of interpreter state for diagnostics and replay output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureTrace {
    pub phase: GesturePhase,
    pub fingers: u8,
    pub actioned: bool,
    pub drag_held: bool,
    pub click_pending: bool,
}

impl GestureOutput {
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl IntoIterator for GestureOutput {
    type Item = Action;
    type IntoIter = <heapless::Vec<Action, MAX_ACTIONS_PER_TICK> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
