pub const STATUS_CONNECTED: &str = "Connected";
pub const STATUS_DISCONNECTED: &str = "Disconnected";
pub const STATUS_CONNECTION_LOST: &str = "Connection Lost";
pub const STATUS_SERVER_NOT_FOUND: &str = "Server Not Found";

/// Connectivity gate plus the status line shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub status: String,
    cooldown: bool,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connected: false,
            status: STATUS_DISCONNECTED.to_owned(),
            cooldown: false,
        }
    }
}

impl ConnectionState {
    /// True while the status line shows a sink cooldown message.
    pub fn in_cooldown(&self) -> bool {
        self.cooldown
    }

    pub(super) fn set_connected(&mut self, message: Option<String>) {
        self.connected = true;
        self.cooldown = false;
        self.status = message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| STATUS_CONNECTED.to_owned());
        log::info!("dispatch: connected status={}", self.status);
    }

    pub(super) fn set_disconnected(&mut self, status: &str) {
        if self.connected {
            log::info!("dispatch: disconnected status={}", status);
        }
        self.connected = false;
        self.cooldown = false;
        self.status = status.to_owned();
    }

    /// Rate limiting is display-only; the connection stays up.
    pub(super) fn set_cooldown(&mut self, message: &str) {
        self.cooldown = true;
        self.status = message.to_owned();
    }

    pub(super) fn clear_cooldown(&mut self) {
        if self.cooldown {
            self.cooldown = false;
            self.status = STATUS_CONNECTED.to_owned();
            log::info!("dispatch: cooldown cleared");
        }
    }
}
