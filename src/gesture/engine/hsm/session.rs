use super::super::utils::distance;
use super::*;
use crate::{action::hotkeys, timer::Deadline};

impl GestureHsm {
    pub(crate) fn new(config: GestureConfig) -> Self {
        Self {
            config,
            tokens: TokenSource::new(),
            phase: GesturePhase::Idle,
            session: TouchSession::default(),
            hold_timer: TimerSlot::new(),
            tap: TapHistory::default(),
            drag_held: false,
        }
    }

    pub(in super::super) fn trace(&self) -> GestureTrace {
        GestureTrace {
            phase: self.phase,
            fingers: self.session.fingers,
            actioned: self.session.actioned,
            drag_held: self.drag_held,
            click_pending: self.tap.pending_click.is_armed(),
        }
    }

    pub(in super::super) fn hold_deadline(&self) -> Option<u64> {
        self.hold_timer.deadline().map(|deadline| deadline.at_ms)
    }

    pub(in super::super) fn click_deadline(&self) -> Option<u64> {
        self.tap.pending_click.deadline().map(|deadline| deadline.at_ms)
    }

    pub(in super::super) fn due_timer(&self, now_ms: u64) -> Option<(GestureTimer, Deadline)> {
        let hold = self
            .hold_timer
            .deadline()
            .filter(|deadline| deadline.at_ms <= now_ms)
            .map(|deadline| (GestureTimer::Hold, deadline));
        let click = self
            .tap
            .pending_click
            .deadline()
            .filter(|deadline| deadline.at_ms <= now_ms)
            .map(|deadline| (GestureTimer::DeferredClick, deadline));
        match (hold, click) {
            (Some(hold), Some(click)) if click.1.at_ms < hold.1.at_ms => Some(click),
            (Some(hold), _) => Some(hold),
            (None, click) => click,
        }
    }

    pub(super) fn go(&mut self, phase: GesturePhase) -> Outcome<State> {
        if self.phase != phase {
            log::debug!("gesture: phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        Transition(match phase {
            GesturePhase::Idle => State::idle(),
            GesturePhase::SinglePending => State::single_pending(),
            GesturePhase::DragPending => State::drag_pending(),
            GesturePhase::Move => State::pointer_move(),
            GesturePhase::DragActive => State::drag_active(),
            GesturePhase::TwoFingerPending => State::two_finger_pending(),
            GesturePhase::Scroll => State::scroll(),
            GesturePhase::Pinch => State::pinch(),
            GesturePhase::SwipePending => State::swipe_pending(),
        })
    }

    /// Starts a new session. Whatever the previous session left behind (hold timer, held drag
    /// button, deferred click) is cancelled first.
    pub(super) fn begin_session(
        &mut self,
        context: &mut DispatchContext,
        now_ms: u64,
        sample: &TouchSample,
    ) -> Outcome<State> {
        self.abandon_session(context);
        if self.tap.pending_click.cancel().is_some() {
            log::debug!("gesture: deferred_click superseded at_ms={}", now_ms);
        }
        let last_tap_end_ms = self.tap.last_tap_end_ms.take();

        let fingers = sample.touch_count;
        if fingers == 0 {
            return self.go(GesturePhase::Idle);
        }

        let primary = sample.primary();
        self.session = TouchSession {
            fingers,
            start_ms: now_ms,
            start_point: primary,
            last_point: primary,
            ..TouchSession::default()
        };
        log::debug!(
            "gesture: session_start fingers={} x={} y={} at_ms={}",
            fingers,
            primary.x,
            primary.y,
            now_ms
        );

        match fingers {
            1 => {
                self.arm_hold(now_ms);
                let within_double_tap = last_tap_end_ms.is_some_and(|tap_end_ms| {
                    now_ms.saturating_sub(tap_end_ms) < self.config.double_tap_window_ms
                });
                if within_double_tap {
                    return self.go(GesturePhase::DragPending);
                }
                if let Some(edge) = self.edge_origin(primary) {
                    self.session.edge = Some(edge);
                    return self.go(GesturePhase::SwipePending);
                }
                self.go(GesturePhase::SinglePending)
            }
            2 => {
                let (distance, avg_y) = two_finger_metrics(sample);
                self.session.start_distance = distance;
                self.session.pinch_reference = distance;
                self.session.start_avg_y = avg_y;
                self.session.last_avg_y = avg_y;
                self.go(GesturePhase::TwoFingerPending)
            }
            _ => self.go(GesturePhase::SwipePending),
        }
    }

    pub(super) fn finish_session(
        &mut self,
        context: &mut DispatchContext,
        now_ms: u64,
        resolution: LiftResolution,
    ) -> Outcome<State> {
        self.hold_timer.cancel();
        self.release_drag(context);
        match resolution {
            LiftResolution::DeferClick => {
                let at_ms = now_ms.saturating_add(self.config.double_tap_window_ms);
                self.tap.pending_click.arm(&mut self.tokens, at_ms);
                self.tap.last_tap_end_ms = Some(now_ms);
            }
            LiftResolution::Resolved => self.tap.last_tap_end_ms = None,
        }
        log::debug!(
            "gesture: session_end fingers={} actioned={} duration_ms={} resolution={:?}",
            self.session.fingers,
            self.session.actioned,
            now_ms.saturating_sub(self.session.start_ms),
            resolution
        );
        self.session = TouchSession::default();
        self.go(GesturePhase::Idle)
    }

    pub(super) fn reset_all(&mut self, context: &mut DispatchContext, now_ms: u64) -> Outcome<State> {
        self.abandon_session(context);
        self.tap.pending_click.cancel();
        self.tap.last_tap_end_ms = None;
        log::debug!("gesture: reset at_ms={}", now_ms);
        self.go(GesturePhase::Idle)
    }

    fn abandon_session(&mut self, context: &mut DispatchContext) {
        self.hold_timer.cancel();
        // A lost lift must not leave the remote button down.
        self.release_drag(context);
        self.session = TouchSession::default();
    }

    fn release_drag(&mut self, context: &mut DispatchContext) {
        if self.drag_held {
            self.drag_held = false;
            context.emit(Action::MouseUp);
        }
    }

    pub(super) fn press_drag(&mut self, context: &mut DispatchContext) {
        self.drag_held = true;
        self.session.actioned = true;
        context.emit(Action::MouseDown);
    }

    fn arm_hold(&mut self, now_ms: u64) {
        let at_ms = now_ms.saturating_add(self.config.hold_duration_ms);
        self.hold_timer.arm(&mut self.tokens, at_ms);
    }

    pub(super) fn fire_hold(&mut self, context: &mut DispatchContext, now_ms: u64) {
        self.hold_timer.cancel();
        self.session.actioned = true;
        log::debug!(
            "gesture: hold fired held_ms={}",
            now_ms.saturating_sub(self.session.start_ms)
        );
        context.emit(Action::RightClick);
    }

    pub(super) fn discard_hold(&mut self, token: TimerToken) {
        if self.hold_timer.is_current(token) {
            self.hold_timer.cancel();
        }
    }

    pub(super) fn discard_click(&mut self, token: TimerToken) {
        if self.tap.pending_click.is_current(token) {
            self.tap.pending_click.cancel();
        }
    }

    pub(super) fn matches_session(&self, sample: &TouchSample) -> bool {
        sample.touch_count == self.session.fingers
    }

    pub(super) fn past_tap_movement(&self, point: TouchPoint) -> bool {
        distance(point, self.session.start_point) >= self.config.tap_max_movement_px
    }

    pub(super) fn emit_pointer_move(&mut self, context: &mut DispatchContext, point: TouchPoint) {
        let dx = point.x - self.session.last_point.x;
        let dy = point.y - self.session.last_point.y;
        self.session.last_point = point;
        self.session.actioned = true;
        if dx != 0.0 || dy != 0.0 {
            context.emit(Action::Move { dx, dy });
        }
    }

    pub(super) fn scroll_step(&mut self, context: &mut DispatchContext, avg_y: f32) {
        let dy = avg_y - self.session.last_avg_y;
        self.session.last_avg_y = avg_y;
        self.session.actioned = true;
        if dy != 0.0 {
            context.emit(Action::Scroll { dy });
        }
    }

    /// Zooms once per step of distance change, then re-baselines so continued spreading
    /// produces further steps.
    pub(super) fn pinch_step(&mut self, context: &mut DispatchContext, distance: f32) {
        self.session.actioned = true;
        let reference = self.session.pinch_reference;
        if reference <= 0.0 {
            return;
        }
        let ratio = distance / reference;
        if ratio > 1.0 + self.config.pinch_step_ratio {
            self.session.pinch_reference = distance;
            context.emit(Action::hotkey(hotkeys::ZOOM_IN));
        } else if ratio < 1.0 - self.config.pinch_step_ratio {
            self.session.pinch_reference = distance;
            context.emit(Action::hotkey(hotkeys::ZOOM_OUT));
        }
    }

    fn edge_origin(&self, point: TouchPoint) -> Option<EdgeOrigin> {
        let width = self.config.surface_width_px;
        if !self.config.edge_swipes || width <= 0.0 {
            return None;
        }
        if point.x < self.config.edge_width_px {
            Some(EdgeOrigin::Left)
        } else if point.x > width - self.config.edge_width_px {
            Some(EdgeOrigin::Right)
        } else {
            None
        }
    }
}
