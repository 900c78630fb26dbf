//! Event-loop front end.
//!
//! [`RemoteController`] owns the interpreter state (gesture engine, sticky modifiers, air-mouse
//! relay) and turns every input into commands on the shared command channel. It never waits on
//! the transport: a full channel drops the command.


use embassy_sync::channel::TrySendError;

use crate::{
    action::{self, Action},
    airmouse::{AirMouseRelay, OrientationSample},
    config::{RemoteConfig, COMMAND_QUEUE_DEPTH},
    dispatch::CommandChannel,
    gesture::{GestureEngine, GestureTrace, TouchSample},
    sticky::{ModifierEvent, StickyModifiers},
    timer::earliest,
};

pub struct RemoteController<'a> {
    gestures: GestureEngine,
    modifiers: StickyModifiers,
    air_mouse: AirMouseRelay,
    commands: &'a CommandChannel,
}

impl<'a> RemoteController<'a> {
    pub fn new(config: &RemoteConfig, commands: &'a CommandChannel) -> Self {
        Self {
            gestures: GestureEngine::new(config.gesture),
            modifiers: StickyModifiers::new(config.sticky),
            air_mouse: AirMouseRelay::new(),
            commands,
        }
    }

    pub fn on_touch(&mut self, now_ms: u64, sample: TouchSample) {
        let output = self.gestures.tick(now_ms, sample);
        for action in output {
            self.enqueue(action);
        }
    }

    /// Fires every timer due at `now_ms`: gesture hold and deferred click, sticky long-press.
    pub fn advance(&mut self, now_ms: u64) -> Option<ModifierEvent> {
        let output = self.gestures.advance(now_ms);
        for action in output {
            self.enqueue(action);
        }
        self.modifiers.advance(now_ms)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        earliest(self.gestures.next_deadline(), self.modifiers.next_deadline())
    }

    /// Force-ends the touch session, releasing a held drag button.
    pub fn reset(&mut self, now_ms: u64) {
        let output = self.gestures.reset(now_ms);
        for action in output {
            self.enqueue(action);
        }
    }

    pub fn modifier_down(&mut self, now_ms: u64, key: &str) {
        self.modifiers.press(now_ms, key);
    }

    pub fn modifier_up(&mut self, now_ms: u64, key: &str) -> Option<ModifierEvent> {
        let outcome = self.modifiers.release(now_ms, key);
        if let Some(action) = outcome.action {
            self.enqueue(action);
        }
        outcome.event
    }

    pub fn key_down(&mut self, key: &str) -> Option<ModifierEvent> {
        let outcome = self.modifiers.key_down(key);
        if let Some(action) = outcome.action {
            self.enqueue(action);
        }
        outcome.event
    }

    pub fn text_input(&mut self, text: &str) {
        if let Some(action) = self.modifiers.text_input(text) {
            self.enqueue(action);
        }
    }

    /// Returns false for keys the remote does not handle.
    pub fn hardware_key(&mut self, key: &str) -> bool {
        match action::hardware_key(key) {
            Some(action) => {
                self.enqueue(action);
                true
            }
            None => false,
        }
    }

    pub fn media(&mut self, name: &str) {
        if let Some(action) = action::media(name) {
            self.enqueue(action);
        }
    }

    /// Flips air-mouse mode and returns the new state. Turning it off also withdraws orientation
    /// updates that are still waiting in the channel.
    pub fn toggle_air_mouse(&mut self) -> bool {
        let announcement = self.air_mouse.toggle();
        let active = self.air_mouse.is_active();
        if !active {
            self.purge_orientation();
        }
        self.enqueue(announcement);
        active
    }

    pub fn on_orientation(&mut self, sample: OrientationSample) {
        if let Some(action) = self.air_mouse.on_orientation(sample) {
            self.enqueue(action);
        }
    }

    pub fn gesture_trace(&self) -> GestureTrace {
        self.gestures.trace()
    }

    pub fn air_mouse_active(&self) -> bool {
        self.air_mouse.is_active()
    }

    pub fn sticky_keys(&self) -> impl Iterator<Item = &str> {
        self.modifiers.sticky_keys()
    }

    fn enqueue(&self, action: Action) {
        if let Err(TrySendError::Full(action)) = self.commands.try_send(action) {
            log::warn!("remote: command queue full; dropping action={}", action.label());
        }
    }

    fn purge_orientation(&self) {
        let mut kept: heapless::Vec<Action, COMMAND_QUEUE_DEPTH> = heapless::Vec::new();
        let mut purged = 0usize;
        while let Ok(action) = self.commands.try_receive() {
            if action.is_orientation() {
                purged += 1;
            } else {
                // Capacity matches the channel, so everything drained fits.
                let _ = kept.push(action);
            }
        }
        for action in kept {
            let _ = self.commands.try_send(action);
        }
        if purged > 0 {
            log::debug!("remote: purged orientation commands count={}", purged);
        }
    }
}
