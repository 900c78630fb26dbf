use super::super::utils::{classify_swipe, distance};
use super::*;
use crate::{action::hotkeys, gesture::SwipeDirection};

impl GestureHsm {
    /// Classifies the net displacement of an unactioned swipe session at lift.
    pub(super) fn resolve_swipe(&mut self, context: &mut DispatchContext) -> LiftResolution {
        let start = self.session.start_point;
        let end = self.session.last_point;
        let direction = classify_swipe(
            end.x - start.x,
            end.y - start.y,
            self.config.swipe_threshold_px,
        );

        let keys = match self.session.edge {
            Some(edge) => {
                if direction.is_none() && distance(start, end) < self.config.tap_max_movement_px {
                    return LiftResolution::DeferClick;
                }
                direction.and_then(|direction| edge_hotkey(edge, direction))
            }
            None => direction.and_then(|direction| swipe_hotkey(self.session.fingers, direction)),
        };

        log::debug!(
            "gesture: swipe fingers={} edge={:?} direction={:?}",
            self.session.fingers,
            self.session.edge,
            direction
        );
        if let Some(keys) = keys {
            context.emit(Action::hotkey(keys));
        }
        LiftResolution::Resolved
    }
}

fn swipe_hotkey(fingers: u8, direction: SwipeDirection) -> Option<&'static [&'static str]> {
    match (fingers, direction) {
        (3, SwipeDirection::Up) => Some(hotkeys::TASK_VIEW),
        (3, SwipeDirection::Down) => Some(hotkeys::SHOW_DESKTOP),
        (3, SwipeDirection::Left) => Some(hotkeys::PREVIOUS_APP),
        (3, SwipeDirection::Right) => Some(hotkeys::NEXT_APP),
        (4, SwipeDirection::Left) => Some(hotkeys::DESKTOP_RIGHT),
        (4, SwipeDirection::Right) => Some(hotkeys::DESKTOP_LEFT),
        _ => None,
    }
}

fn edge_hotkey(edge: EdgeOrigin, direction: SwipeDirection) -> Option<&'static [&'static str]> {
    match (edge, direction) {
        (EdgeOrigin::Left, SwipeDirection::Right) => Some(hotkeys::WIDGETS),
        (EdgeOrigin::Right, SwipeDirection::Left) => Some(hotkeys::NOTIFICATIONS),
        _ => None,
    }
}
