//! Phone-as-touchpad remote control core.
//!
//! Raw touch samples, keyboard and orientation events go in; discrete remote-control
//! [`Action`]s come out on a bounded command channel that a [`Dispatcher`] drains toward the
//! remote executor. Time is a virtual millisecond clock supplied by the caller.

pub mod action;
pub mod airmouse;
pub mod config;
pub mod dispatch;
pub mod gesture;
pub mod remote;
pub mod sticky;
pub mod timer;

pub use action::Action;
pub use airmouse::{AirMouseRelay, OrientationSample};
pub use config::{ConfigError, GestureConfig, RemoteConfig, StickyConfig};
pub use dispatch::{
    CommandChannel, CommandReceiver, CommandSender, CommandSink, ConnectionState, DispatchOutcome,
    Dispatcher, SinkReply, TransportError,
};
#[cfg(feature = "http-sink")]
pub use dispatch::HttpSink;
pub use gesture::{GestureEngine, GestureOutput, GestureTrace, TouchPhase, TouchPoint, TouchSample};
pub use remote::RemoteController;
pub use sticky::{KeyPressOutcome, ModifierEvent, StickyModifiers};
