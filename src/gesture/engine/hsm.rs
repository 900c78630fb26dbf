use super::utils::two_finger_metrics;
use super::*;
use crate::{
    gesture::{GesturePhase, TouchPoint},
    timer::{TimerSlot, TokenSource},
};
use statig::prelude::*;

mod session;
mod swipe;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeOrigin {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LiftResolution {
    /// Plain single tap: commit a left-click once the double-tap window closes.
    DeferClick,
    Resolved,
}

#[derive(Clone, Copy, Debug, Default)]
struct TouchSession {
    fingers: u8,
    start_ms: u64,
    start_point: TouchPoint,
    last_point: TouchPoint,
    start_distance: f32,
    pinch_reference: f32,
    start_avg_y: f32,
    last_avg_y: f32,
    actioned: bool,
    edge: Option<EdgeOrigin>,
}

#[derive(Debug, Default)]
struct TapHistory {
    last_tap_end_ms: Option<u64>,
    pending_click: TimerSlot,
}

pub(super) struct GestureHsm {
    config: GestureConfig,
    tokens: TokenSource,
    phase: GesturePhase,
    session: TouchSession,
    hold_timer: TimerSlot,
    tap: TapHistory,
    drag_held: bool,
}

#[state_machine(initial = "State::idle()")]
impl GestureHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &GestureHsmEvent) -> Outcome<State> {
        match event {
            GestureHsmEvent::Start { now_ms, sample } => {
                self.begin_session(context, *now_ms, sample)
            }
            GestureHsmEvent::Timer {
                now_ms,
                timer: GestureTimer::DeferredClick,
                token,
            } => {
                if self.tap.pending_click.is_current(*token) {
                    self.tap.pending_click.cancel();
                    log::debug!("gesture: deferred_click fired at_ms={}", now_ms);
                    context.emit(Action::LeftClick);
                }
                Handled
            }
            GestureHsmEvent::Timer {
                timer: GestureTimer::Hold,
                token,
                ..
            } => {
                self.discard_hold(*token);
                Handled
            }
            GestureHsmEvent::Reset { now_ms } => self.reset_all(context, *now_ms),
            // Stray samples with no live session (e.g. after a reset).
            GestureHsmEvent::Move { .. } | GestureHsmEvent::End { .. } => Handled,
        }
    }

    #[state(superstate = "session")]
    fn single_pending(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                self.hold_timer.cancel();
                if !self.past_tap_movement(sample.primary()) {
                    return Handled;
                }
                self.emit_pointer_move(context, sample.primary());
                self.go(GesturePhase::Move)
            }
            GestureHsmEvent::End { now_ms, sample } if sample.touch_count == 0 => {
                // Moves can be coalesced away, so the lift point decides tap-ness too.
                let lifted_far = self.past_tap_movement(sample.primary());
                self.session.last_point = sample.primary();
                let resolution = if self.session.actioned || lifted_far {
                    LiftResolution::Resolved
                } else {
                    LiftResolution::DeferClick
                };
                self.finish_session(context, *now_ms, resolution)
            }
            GestureHsmEvent::Timer {
                now_ms,
                timer: GestureTimer::Hold,
                token,
            } if self.hold_timer.is_current(*token) => {
                self.fire_hold(context, *now_ms);
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn drag_pending(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                self.hold_timer.cancel();
                if !self.past_tap_movement(sample.primary()) {
                    return Handled;
                }
                self.press_drag(context);
                self.emit_pointer_move(context, sample.primary());
                self.go(GesturePhase::DragActive)
            }
            GestureHsmEvent::End { now_ms, sample } if sample.touch_count == 0 => {
                let lifted_far = self.past_tap_movement(sample.primary());
                self.session.last_point = sample.primary();
                if !self.session.actioned && !lifted_far {
                    context.emit(Action::DoubleClick);
                }
                self.finish_session(context, *now_ms, LiftResolution::Resolved)
            }
            GestureHsmEvent::Timer {
                now_ms,
                timer: GestureTimer::Hold,
                token,
            } if self.hold_timer.is_current(*token) => {
                // A held second tap is a right-click, not a drag.
                self.fire_hold(context, *now_ms);
                self.go(GesturePhase::SinglePending)
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn pointer_move(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                if self.past_tap_movement(sample.primary()) {
                    self.emit_pointer_move(context, sample.primary());
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn drag_active(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                if self.past_tap_movement(sample.primary()) {
                    self.emit_pointer_move(context, sample.primary());
                }
                Handled
            }
            // Lift releases the button in `finish_session`.
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn two_finger_pending(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                let (distance, avg_y) = two_finger_metrics(sample);
                let distance_change = (distance - self.session.start_distance).abs();
                let vertical_change = (avg_y - self.session.start_avg_y).abs();
                if distance_change.max(vertical_change) < self.config.tap_max_movement_px {
                    return Handled;
                }

                // Decided once; the session never switches between scroll and pinch.
                let pinch = self.session.start_distance > 0.0
                    && distance_change
                        > vertical_change * self.config.pinch_vs_scroll_sensitivity;
                if pinch {
                    self.pinch_step(context, distance);
                    self.go(GesturePhase::Pinch)
                } else {
                    self.scroll_step(context, avg_y);
                    self.go(GesturePhase::Scroll)
                }
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn scroll(&mut self, context: &mut DispatchContext, event: &GestureHsmEvent) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                let (_, avg_y) = two_finger_metrics(sample);
                self.scroll_step(context, avg_y);
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn pinch(&mut self, context: &mut DispatchContext, event: &GestureHsmEvent) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                let (distance, _) = two_finger_metrics(sample);
                self.pinch_step(context, distance);
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "session")]
    fn swipe_pending(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Move { sample, .. } if self.matches_session(sample) => {
                self.hold_timer.cancel();
                self.session.last_point = sample.primary();
                Handled
            }
            GestureHsmEvent::End { now_ms, sample } if sample.touch_count == 0 => {
                if self.session.fingers == 1 {
                    self.session.last_point = sample.primary();
                }
                let resolution = if self.session.actioned {
                    LiftResolution::Resolved
                } else {
                    self.resolve_swipe(context)
                };
                self.finish_session(context, *now_ms, resolution)
            }
            GestureHsmEvent::Timer {
                now_ms,
                timer: GestureTimer::Hold,
                token,
            } if self.hold_timer.is_current(*token) => {
                self.fire_hold(context, *now_ms);
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn session(&mut self, context: &mut DispatchContext, event: &GestureHsmEvent) -> Outcome<State> {
        match event {
            GestureHsmEvent::Start { now_ms, sample } => {
                self.begin_session(context, *now_ms, sample)
            }
            GestureHsmEvent::End { now_ms, sample } if sample.touch_count == 0 => {
                self.finish_session(context, *now_ms, LiftResolution::Resolved)
            }
            GestureHsmEvent::Timer {
                timer: GestureTimer::Hold,
                token,
                ..
            } => {
                self.discard_hold(*token);
                Handled
            }
            GestureHsmEvent::Timer {
                timer: GestureTimer::DeferredClick,
                token,
                ..
            } => {
                self.discard_click(*token);
                Handled
            }
            GestureHsmEvent::Reset { now_ms } => self.reset_all(context, *now_ms),
            // Partial lifts and samples whose finger count disagrees with the session.
            GestureHsmEvent::Move { .. } | GestureHsmEvent::End { .. } => Handled,
        }
    }
}
