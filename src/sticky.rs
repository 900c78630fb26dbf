//! Sticky modifier tracking.
//!
//! A modifier control held past the long-press threshold toggles its key in the sticky set
//! instead of firing. The next one-shot key press (a short press on a control, or a named key
//! from the keyboard) is sent as a hotkey combining every sticky key with its own, and the set is
//! cleared.


use crate::{
    action::Action,
    config::{StickyConfig, STICKY_MAX_KEYS},
    timer::{TimerSlot, TokenSource},
};

/// Presentation-facing change of a modifier control's affordance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModifierEvent {
    Toggled { key: String, sticky: bool },
    Cleared,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyPressOutcome {
    pub action: Option<Action>,
    pub event: Option<ModifierEvent>,
}

#[derive(Debug)]
struct HeldControl {
    key: String,
    long_press: TimerSlot,
    toggled: bool,
}

#[derive(Debug)]
pub struct StickyModifiers {
    config: StickyConfig,
    tokens: TokenSource,
    sticky: heapless::Vec<String, STICKY_MAX_KEYS>,
    held: Option<HeldControl>,
}

impl Default for StickyModifiers {
    fn default() -> Self {
        Self::new(StickyConfig::default())
    }
}

impl StickyModifiers {
    pub fn new(config: StickyConfig) -> Self {
        Self {
            config,
            tokens: TokenSource::new(),
            sticky: heapless::Vec::new(),
            held: None,
        }
    }

    /// A modifier control went down. Only one control is tracked at a time; pressing another
    /// abandons the first without firing it.
    pub fn press(&mut self, now_ms: u64, key: &str) {
        if let Some(previous) = self.held.take() {
            log::debug!("sticky: press superseded key={}", previous.key);
        }
        let mut long_press = TimerSlot::new();
        long_press.arm(
            &mut self.tokens,
            now_ms.saturating_add(self.config.long_press_ms),
        );
        self.held = Some(HeldControl {
            key: key.to_owned(),
            long_press,
            toggled: false,
        });
    }

    /// Fires a due long-press. Returns the affordance change, if any.
    pub fn advance(&mut self, now_ms: u64) -> Option<ModifierEvent> {
        let held = self.held.as_mut()?;
        held.long_press.take_due(now_ms)?;
        held.toggled = true;
        let key = held.key.clone();
        self.toggle(key)
    }

    /// A modifier control went up. A release before the long-press threshold is a one-shot key.
    pub fn release(&mut self, now_ms: u64, key: &str) -> KeyPressOutcome {
        let toggled_early = self.advance(now_ms);
        let Some(held) = self.held.take_if(|held| held.key == key) else {
            log::debug!("sticky: release without press key={}", key);
            return KeyPressOutcome {
                action: None,
                event: toggled_early,
            };
        };
        if held.toggled {
            return KeyPressOutcome {
                action: None,
                event: toggled_early,
            };
        }
        self.one_shot(key)
    }

    /// Keyboard key-down. Single characters arrive through [`Self::text_input`] instead.
    pub fn key_down(&mut self, key: &str) -> KeyPressOutcome {
        if key.chars().count() <= 1 {
            return KeyPressOutcome::default();
        }
        self.one_shot(key)
    }

    /// Typed text is sent verbatim and leaves the sticky set alone.
    pub fn text_input(&self, text: &str) -> Option<Action> {
        if text.is_empty() {
            return None;
        }
        Some(Action::key(text))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.held
            .as_ref()
            .and_then(|held| held.long_press.deadline())
            .map(|deadline| deadline.at_ms)
    }

    pub fn is_sticky(&self, key: &str) -> bool {
        self.sticky.iter().any(|sticky| sticky == key)
    }

    pub fn sticky_keys(&self) -> impl Iterator<Item = &str> {
        self.sticky.iter().map(String::as_str)
    }

    /// Drops the held control and the sticky set.
    pub fn clear(&mut self) -> Option<ModifierEvent> {
        self.held = None;
        if self.sticky.is_empty() {
            return None;
        }
        self.sticky.clear();
        Some(ModifierEvent::Cleared)
    }

    fn toggle(&mut self, key: String) -> Option<ModifierEvent> {
        if let Some(index) = self.sticky.iter().position(|sticky| *sticky == key) {
            self.sticky.remove(index);
            log::debug!("sticky: toggled key={} sticky=false", key);
            return Some(ModifierEvent::Toggled { key, sticky: false });
        }
        let event = ModifierEvent::Toggled {
            key: key.clone(),
            sticky: true,
        };
        if let Err(key) = self.sticky.push(key) {
            log::warn!("sticky: set full; ignoring key={}", key);
            return None;
        }
        log::debug!("sticky: toggled {:?}", event);
        Some(event)
    }

    fn one_shot(&mut self, key: &str) -> KeyPressOutcome {
        if self.sticky.is_empty() {
            return KeyPressOutcome {
                action: Some(Action::key(key)),
                event: None,
            };
        }
        let mut keys: Vec<String> = self.sticky.iter().cloned().collect();
        keys.push(key.to_owned());
        self.sticky.clear();
        log::debug!("sticky: merged combo={}", keys.join("+"));
        KeyPressOutcome {
            action: Some(Action::Hotkey { keys }),
            event: Some(ModifierEvent::Cleared),
        }
    }
}
