use statig::blocking::IntoStateMachineExt as _;

mod hsm;
mod utils;

use hsm::GestureHsm;

use super::{GestureTrace, TouchPhase, TouchSample};
use crate::{
    action::Action,
    config::GestureConfig,
    timer::{earliest, TimerToken},
};

pub const MAX_ACTIONS_PER_TICK: usize = 4;
// Hold and deferred-click are the only timers; they are never armed together.
const MAX_TIMER_FIRINGS_PER_ADVANCE: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GestureTimer {
    Hold,
    DeferredClick,
}

#[derive(Clone, Copy, Debug)]
enum GestureHsmEvent {
    Start { now_ms: u64, sample: TouchSample },
    Move { now_ms: u64, sample: TouchSample },
    End { now_ms: u64, sample: TouchSample },
    Timer {
        now_ms: u64,
        timer: GestureTimer,
        token: TimerToken,
    },
    Reset { now_ms: u64 },
}

#[derive(Clone, Debug, Default)]
pub struct GestureOutput {
    pub actions: heapless::Vec<Action, MAX_ACTIONS_PER_TICK>,
}

#[derive(Debug, Default)]
struct DispatchContext {
    actions: heapless::Vec<Action, MAX_ACTIONS_PER_TICK>,
}

impl DispatchContext {
    fn emit(&mut self, action: Action) {
        log::debug!("gesture: emit action={}", action.label());
        if let Err(action) = self.actions.push(action) {
            log::warn!("gesture: output full; dropping action={}", action.label());
        }
    }

    fn finish(self) -> GestureOutput {
        GestureOutput {
            actions: self.actions,
        }
    }
}

pub struct GestureEngine {
    machine: statig::blocking::StateMachine<GestureHsm>,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureEngine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            machine: GestureHsm::new(config).state_machine(),
        }
    }

    /// Fires timers due at or before `now_ms`, then classifies `sample`.
    pub fn tick(&mut self, now_ms: u64, sample: TouchSample) -> GestureOutput {
        let mut context = DispatchContext::default();
        self.fire_due_timers(now_ms, &mut context);
        let event = match sample.phase {
            TouchPhase::Start => GestureHsmEvent::Start { now_ms, sample },
            TouchPhase::Move => GestureHsmEvent::Move { now_ms, sample },
            TouchPhase::End => GestureHsmEvent::End { now_ms, sample },
        };
        self.machine.handle_with_context(&event, &mut context);
        context.finish()
    }

    /// Fires timers due at or before `now_ms` without a new sample.
    pub fn advance(&mut self, now_ms: u64) -> GestureOutput {
        let mut context = DispatchContext::default();
        self.fire_due_timers(now_ms, &mut context);
        context.finish()
    }

    /// Ends any live session without classifying it: a held drag button is released and all
    /// timers and tap history are dropped.
    pub fn reset(&mut self, now_ms: u64) -> GestureOutput {
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&GestureHsmEvent::Reset { now_ms }, &mut context);
        context.finish()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        let hsm = self.machine.inner();
        earliest(hsm.hold_deadline(), hsm.click_deadline())
    }

    pub fn trace(&self) -> GestureTrace {
        self.machine.inner().trace()
    }

    fn fire_due_timers(&mut self, now_ms: u64, context: &mut DispatchContext) {
        for _ in 0..MAX_TIMER_FIRINGS_PER_ADVANCE {
            let Some((timer, deadline)) = self.machine.inner().due_timer(now_ms) else {
                return;
            };
            self.machine.handle_with_context(
                &GestureHsmEvent::Timer {
                    now_ms: deadline.at_ms,
                    timer,
                    token: deadline.token,
                },
                context,
            );
        }
    }
}
