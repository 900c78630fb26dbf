use crate::gesture::{SwipeDirection, TouchPoint, TouchSample};

pub(super) fn distance(a: TouchPoint, b: TouchPoint) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Inter-finger distance and average vertical position of a two-contact sample.
pub(super) fn two_finger_metrics(sample: &TouchSample) -> (f32, f32) {
    let [a, b] = sample.points;
    (distance(a, b), (a.y + b.y) / 2.0)
}

/// Vertical wins exact ties so a diagonal flick reads as up/down.
pub(super) fn classify_swipe(dx: f32, dy: f32, threshold: f32) -> Option<SwipeDirection> {
    let ax = dx.abs();
    let ay = dy.abs();
    if ay > threshold && ay >= ax {
        return Some(if dy < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        });
    }
    if ax > threshold {
        return Some(if dx < 0.0 {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        });
    }
    None
}
