//! Command dispatch.
//!
//! Every outbound [`Action`] passes through one [`Dispatcher`]. Producers push into a bounded
//! command channel and never wait on delivery; the dispatcher drains the channel on the transport
//! side, drops everything while disconnected, and turns sink replies into connection status.
//!
//! The channel is shareable across threads, so a blocking sink can be served from its own thread
//! with [`Dispatcher::serve`] while the controller keeps classifying input.

mod connection;
#[cfg(feature = "http-sink")]
mod http;
#[cfg(test)]
mod tests;

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver, Sender},
};
use thiserror::Error;

pub use connection::{
    ConnectionState, STATUS_CONNECTED, STATUS_CONNECTION_LOST, STATUS_DISCONNECTED,
    STATUS_SERVER_NOT_FOUND,
};
#[cfg(feature = "http-sink")]
pub use http::HttpSink;

use crate::{action::Action, config::COMMAND_QUEUE_DEPTH};

pub type CommandChannel = Channel<CriticalSectionRawMutex, Action, COMMAND_QUEUE_DEPTH>;
pub type CommandSender<'a> = Sender<'a, CriticalSectionRawMutex, Action, COMMAND_QUEUE_DEPTH>;
pub type CommandReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Action, COMMAND_QUEUE_DEPTH>;

pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("command sink unreachable: {0}")]
    Unreachable(String),
    #[error("request setup failed: {0}")]
    Setup(String),
}

/// Status code and optional human-readable message returned by the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkReply {
    pub status: u16,
    pub message: Option<String>,
}

impl SinkReply {
    pub fn ok() -> Self {
        Self {
            status: 200,
            message: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub const fn is_rate_limited(&self) -> bool {
        self.status == HTTP_TOO_MANY_REQUESTS
    }
}

/// Remote command executor as seen from the dispatcher.
pub trait CommandSink {
    /// Session handshake.
    fn connect(&mut self) -> Result<SinkReply, TransportError>;

    fn deliver(&mut self, action: &Action) -> Result<SinkReply, TransportError>;
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn connect(&mut self) -> Result<SinkReply, TransportError> {
        (**self).connect()
    }

    fn deliver(&mut self, action: &Action) -> Result<SinkReply, TransportError> {
        (**self).deliver(action)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not connected; the action never reached the sink.
    Dropped,
    Delivered,
    RateLimited,
    Rejected { status: u16 },
    TransportFailed,
}

pub struct Dispatcher<S> {
    sink: S,
    connection: ConnectionState,
}

impl<S: CommandSink> Dispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            connection: ConnectionState::default(),
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.connected
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Performs the handshake. Commands queued before it are stale and discarded, so a reconnect
    /// never replays gestures from a previous connection.
    pub fn connect(&mut self, receiver: &CommandReceiver<'_>) -> bool {
        let mut discarded = 0usize;
        while receiver.try_receive().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            log::debug!("dispatch: discarded stale commands count={}", discarded);
        }

        match self.sink.connect() {
            Ok(reply) if reply.is_success() => self.connection.set_connected(reply.message),
            Ok(reply) => self
                .connection
                .set_disconnected(reply.message.as_deref().unwrap_or(STATUS_DISCONNECTED)),
            Err(err) => {
                log::warn!("dispatch: handshake failed err={}", err);
                self.connection.set_disconnected(STATUS_SERVER_NOT_FOUND);
            }
        }
        self.connection.connected
    }

    pub fn disconnect(&mut self) {
        self.connection.set_disconnected(STATUS_DISCONNECTED);
    }

    pub fn dispatch(&mut self, action: &Action) -> DispatchOutcome {
        if !self.connection.connected {
            log::trace!("dispatch: dropped while disconnected action={}", action.label());
            return DispatchOutcome::Dropped;
        }

        match self.sink.deliver(action) {
            Ok(reply) if reply.is_rate_limited() => {
                let message = reply.message.as_deref().unwrap_or("Cooldown");
                log::info!("dispatch: rate limited message={}", message);
                self.connection.set_cooldown(message);
                DispatchOutcome::RateLimited
            }
            Ok(reply) if reply.is_success() => {
                self.connection.clear_cooldown();
                DispatchOutcome::Delivered
            }
            Ok(reply) => {
                log::debug!(
                    "dispatch: rejected action={} status={}",
                    action.label(),
                    reply.status
                );
                DispatchOutcome::Rejected {
                    status: reply.status,
                }
            }
            Err(err) => {
                log::warn!(
                    "dispatch: transport failed action={} err={}",
                    action.label(),
                    err
                );
                self.connection.set_disconnected(STATUS_CONNECTION_LOST);
                DispatchOutcome::TransportFailed
            }
        }
    }

    /// Dispatches everything currently queued and returns how many commands were taken.
    pub fn pump(&mut self, receiver: &CommandReceiver<'_>) -> usize {
        let mut taken = 0usize;
        while let Ok(action) = receiver.try_receive() {
            let _ = self.dispatch(&action);
            taken += 1;
        }
        taken
    }

    /// Transport task body: dispatches commands as they arrive. Never returns.
    pub async fn run(&mut self, receiver: CommandReceiver<'_>) {
        loop {
            let action = receiver.receive().await;
            let _ = self.dispatch(&action);
        }
    }

    /// Blocking transport loop for a dedicated thread. Sleeps `idle` whenever the queue is empty
    /// and returns once `stop` is set and the queue has been drained. Returns how many commands
    /// were taken.
    pub fn serve(
        &mut self,
        receiver: &CommandReceiver<'_>,
        stop: &AtomicBool,
        idle: Duration,
    ) -> usize {
        let mut taken = 0usize;
        loop {
            let stopping = stop.load(Ordering::Acquire);
            let batch = self.pump(receiver);
            taken += batch;
            if stopping && batch == 0 {
                log::debug!("dispatch: transport stopped taken={}", taken);
                return taken;
            }
            if batch == 0 {
                thread::sleep(idle);
            }
        }
    }
}
