use serde::Serialize;

/// One outbound remote-control command.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    LeftClick,
    DoubleClick,
    RightClick,
    MouseDown,
    MouseUp,
    Move { dx: f32, dy: f32 },
    Scroll { dy: f32 },
    Hotkey { keys: Vec<String> },
    KeyAction { key: String },
    Orientation { alpha: f64, beta: Option<f64> },
    AirMouse { active: bool },
}

/// Sink route an action is delivered through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Touchpad,
    Hotkey,
    KeyAction,
    AirMouse,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Touchpad => "/api/touchpad",
            Endpoint::Hotkey => "/api/hotkey",
            Endpoint::KeyAction => "/api/key_action",
            Endpoint::AirMouse => "/api/airmouse",
        }
    }
}

impl Action {
    pub fn hotkey(keys: &[&str]) -> Self {
        Action::Hotkey {
            keys: keys.iter().map(|key| (*key).to_string()).collect(),
        }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Action::KeyAction { key: key.into() }
    }

    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Action::LeftClick
            | Action::DoubleClick
            | Action::RightClick
            | Action::MouseDown
            | Action::MouseUp
            | Action::Move { .. }
            | Action::Scroll { .. } => Endpoint::Touchpad,
            Action::Hotkey { .. } => Endpoint::Hotkey,
            Action::KeyAction { .. } => Endpoint::KeyAction,
            Action::Orientation { .. } | Action::AirMouse { .. } => Endpoint::AirMouse,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Action::LeftClick => "left_click",
            Action::DoubleClick => "double_click",
            Action::RightClick => "right_click",
            Action::MouseDown => "mouse_down",
            Action::MouseUp => "mouse_up",
            Action::Move { .. } => "move",
            Action::Scroll { .. } => "scroll",
            Action::Hotkey { .. } => "hotkey",
            Action::KeyAction { .. } => "key_action",
            Action::Orientation { .. } => "orientation",
            Action::AirMouse { .. } => "airmouse",
        }
    }

    pub const fn is_orientation(&self) -> bool {
        matches!(self, Action::Orientation { .. })
    }
}

pub(crate) mod hotkeys {
    pub const ZOOM_IN: &[&str] = &["ctrl", "+"];
    pub const ZOOM_OUT: &[&str] = &["ctrl", "-"];
    pub const TASK_VIEW: &[&str] = &["win", "tab"];
    pub const SHOW_DESKTOP: &[&str] = &["win", "d"];
    pub const PREVIOUS_APP: &[&str] = &["alt", "shift", "tab"];
    pub const NEXT_APP: &[&str] = &["alt", "tab"];
    pub const DESKTOP_RIGHT: &[&str] = &["ctrl", "win", "right"];
    pub const DESKTOP_LEFT: &[&str] = &["ctrl", "win", "left"];
    pub const WIDGETS: &[&str] = &["win", "w"];
    pub const NOTIFICATIONS: &[&str] = &["win", "n"];
}

/// Maps hardware keys the page intercepts (volume rocker) to hotkeys.
pub fn hardware_key(key: &str) -> Option<Action> {
    match key {
        "AudioVolumeUp" => Some(Action::hotkey(&["volumeup"])),
        "AudioVolumeDown" => Some(Action::hotkey(&["volumedown"])),
        _ => None,
    }
}

/// Media buttons send their action name as a one-key hotkey.
pub fn media(action: &str) -> Option<Action> {
    let action = action.trim();
    if action.is_empty() {
        return None;
    }
    Some(Action::hotkey(&[action]))
}
