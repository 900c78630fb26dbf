use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use super::*;
use crate::{
    config::RemoteConfig,
    gesture::{GesturePhase, TouchPhase, TouchPoint, TouchSample},
    remote::RemoteController,
};

#[derive(Default)]
struct ScriptedSink {
    handshake: VecDeque<Result<SinkReply, TransportError>>,
    replies: VecDeque<Result<SinkReply, TransportError>>,
    delivered: Vec<Action>,
}

impl ScriptedSink {
    fn reachable() -> Self {
        Self {
            handshake: VecDeque::from([Ok(SinkReply::with_status(200, "Device connected successfully."))]),
            ..Self::default()
        }
    }

    fn reply(mut self, reply: Result<SinkReply, TransportError>) -> Self {
        self.replies.push_back(reply);
        self
    }
}

impl CommandSink for ScriptedSink {
    fn connect(&mut self) -> Result<SinkReply, TransportError> {
        self.handshake
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("no handshake scripted".into())))
    }

    fn deliver(&mut self, action: &Action) -> Result<SinkReply, TransportError> {
        self.delivered.push(action.clone());
        self.replies.pop_front().unwrap_or_else(|| Ok(SinkReply::ok()))
    }
}

/// Holds every delivery until `release` is set.
struct GatedSink<'a> {
    started: &'a AtomicBool,
    release: &'a AtomicBool,
    delivered: Vec<Action>,
}

impl CommandSink for GatedSink<'_> {
    fn connect(&mut self) -> Result<SinkReply, TransportError> {
        Ok(SinkReply::ok())
    }

    fn deliver(&mut self, action: &Action) -> Result<SinkReply, TransportError> {
        self.started.store(true, Ordering::Release);
        while !self.release.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
        self.delivered.push(action.clone());
        Ok(SinkReply::ok())
    }
}

fn wait_for(flag: &AtomicBool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !flag.load(Ordering::Acquire) {
        assert!(Instant::now() < deadline, "flag never set");
        thread::sleep(Duration::from_millis(1));
    }
}

fn unreachable() -> TransportError {
    TransportError::Unreachable("connection refused".into())
}

#[test]
fn actions_are_dropped_until_connected() {
    let channel = CommandChannel::new();
    let mut dispatcher = Dispatcher::new(ScriptedSink::reachable());

    assert_eq!(dispatcher.dispatch(&Action::LeftClick), DispatchOutcome::Dropped);
    assert!(dispatcher.sink().delivered.is_empty());
    assert_eq!(dispatcher.connection().status, STATUS_DISCONNECTED);

    assert!(dispatcher.connect(&channel.receiver()));
    assert_eq!(dispatcher.connection().status, "Device connected successfully.");
    assert_eq!(dispatcher.dispatch(&Action::LeftClick), DispatchOutcome::Delivered);
    assert_eq!(dispatcher.sink().delivered, vec![Action::LeftClick]);
}

#[test]
fn handshake_outcomes_set_status() {
    let channel = CommandChannel::new();

    let mut refused = Dispatcher::new(ScriptedSink {
        handshake: VecDeque::from([Ok(SinkReply::with_status(403, "Connection refused."))]),
        ..ScriptedSink::default()
    });
    assert!(!refused.connect(&channel.receiver()));
    assert_eq!(refused.connection().status, "Connection refused.");

    let mut absent = Dispatcher::new(ScriptedSink::default());
    assert!(!absent.connect(&channel.receiver()));
    assert_eq!(absent.connection().status, STATUS_SERVER_NOT_FOUND);

    let mut silent = Dispatcher::new(ScriptedSink {
        handshake: VecDeque::from([Ok(SinkReply::ok())]),
        ..ScriptedSink::default()
    });
    assert!(silent.connect(&channel.receiver()));
    assert_eq!(silent.connection().status, STATUS_CONNECTED);
}

#[test]
fn rate_limit_shows_cooldown_and_recovers_on_success() {
    let channel = CommandChannel::new();
    let sink = ScriptedSink::reachable()
        .reply(Ok(SinkReply::with_status(429, "Cooldown: 1.5s")))
        .reply(Ok(SinkReply::ok()));
    let mut dispatcher = Dispatcher::new(sink);
    dispatcher.connect(&channel.receiver());

    assert_eq!(
        dispatcher.dispatch(&Action::RightClick),
        DispatchOutcome::RateLimited
    );
    assert!(dispatcher.is_connected());
    assert!(dispatcher.connection().in_cooldown());
    assert_eq!(dispatcher.connection().status, "Cooldown: 1.5s");

    assert_eq!(dispatcher.dispatch(&Action::LeftClick), DispatchOutcome::Delivered);
    assert!(!dispatcher.connection().in_cooldown());
    assert_eq!(dispatcher.connection().status, STATUS_CONNECTED);
}

#[test]
fn other_rejections_are_ignored() {
    let channel = CommandChannel::new();
    let sink = ScriptedSink::reachable().reply(Ok(SinkReply::with_status(400, "bad")));
    let mut dispatcher = Dispatcher::new(sink);
    dispatcher.connect(&channel.receiver());
    let before = dispatcher.connection().clone();

    assert_eq!(
        dispatcher.dispatch(&Action::key("")),
        DispatchOutcome::Rejected { status: 400 }
    );
    assert_eq!(dispatcher.connection(), &before);
}

#[test]
fn transport_failure_disconnects_until_reconnect() {
    let channel = CommandChannel::new();
    let sink = ScriptedSink::reachable().reply(Err(unreachable()));
    let mut dispatcher = Dispatcher::new(sink);
    dispatcher.connect(&channel.receiver());

    assert_eq!(
        dispatcher.dispatch(&Action::Scroll { dy: 4.0 }),
        DispatchOutcome::TransportFailed
    );
    assert!(!dispatcher.is_connected());
    assert_eq!(dispatcher.connection().status, STATUS_CONNECTION_LOST);

    // No retry: later actions are dropped without touching the sink.
    assert_eq!(dispatcher.dispatch(&Action::LeftClick), DispatchOutcome::Dropped);
    assert_eq!(dispatcher.sink().delivered.len(), 1);
}

#[test]
fn reconnect_discards_commands_queued_while_disconnected() {
    let channel = CommandChannel::new();
    let sender = channel.sender();
    let receiver = channel.receiver();
    let mut dispatcher = Dispatcher::new(ScriptedSink::reachable());

    sender.try_send(Action::LeftClick).unwrap();
    assert_eq!(dispatcher.pump(&receiver), 1);
    assert!(dispatcher.sink().delivered.is_empty());

    sender.try_send(Action::DoubleClick).unwrap();
    sender.try_send(Action::RightClick).unwrap();
    assert!(dispatcher.connect(&receiver));
    assert_eq!(dispatcher.pump(&receiver), 0);
    assert!(dispatcher.sink().delivered.is_empty());

    sender.try_send(Action::MouseDown).unwrap();
    sender.try_send(Action::MouseUp).unwrap();
    assert_eq!(dispatcher.pump(&receiver), 2);
    assert_eq!(
        dispatcher.sink().delivered,
        vec![Action::MouseDown, Action::MouseUp]
    );
}

#[test]
fn run_dispatches_queued_commands_in_order() {
    use embassy_futures::{
        block_on,
        select::{select, Either},
        yield_now,
    };

    let channel = CommandChannel::new();
    let sender = channel.sender();
    let mut dispatcher = Dispatcher::new(ScriptedSink::reachable());
    dispatcher.connect(&channel.receiver());

    sender.try_send(Action::MouseDown).unwrap();
    sender.try_send(Action::Move { dx: 1.0, dy: 2.0 }).unwrap();
    sender.try_send(Action::MouseUp).unwrap();

    let outcome = block_on(select(dispatcher.run(channel.receiver()), async {
        for _ in 0..8 {
            yield_now().await;
        }
    }));
    assert!(matches!(outcome, Either::Second(())));
    assert_eq!(
        dispatcher.sink().delivered,
        vec![
            Action::MouseDown,
            Action::Move { dx: 1.0, dy: 2.0 },
            Action::MouseUp
        ]
    );
}

#[test]
fn blocked_sink_does_not_stall_gesture_classification() {
    let channel = CommandChannel::new();
    let started = AtomicBool::new(false);
    let release = AtomicBool::new(false);
    let stop = AtomicBool::new(false);
    let mut dispatcher = Dispatcher::new(GatedSink {
        started: &started,
        release: &release,
        delivered: Vec::new(),
    });
    assert!(dispatcher.connect(&channel.receiver()));
    let mut remote = RemoteController::new(&RemoteConfig::default(), &channel);
    let touch = |phase, count, x| TouchSample::new(phase, count, &[TouchPoint::new(x, 100.0)]);

    thread::scope(|scope| {
        let transport = scope.spawn(|| {
            dispatcher.serve(&channel.receiver(), &stop, Duration::from_millis(1))
        });

        remote.on_touch(0, touch(TouchPhase::Start, 1, 100.0));
        remote.on_touch(20, touch(TouchPhase::Move, 1, 140.0));
        wait_for(&started);

        // The sink is stuck on the first move; input keeps being classified.
        remote.on_touch(40, touch(TouchPhase::Move, 1, 170.0));
        remote.on_touch(60, touch(TouchPhase::End, 0, 170.0));
        assert_eq!(remote.gesture_trace().phase, GesturePhase::Idle);
        assert_eq!(channel.len(), 1);

        release.store(true, Ordering::Release);
        stop.store(true, Ordering::Release);
        assert_eq!(transport.join().unwrap(), 2);
    });

    assert_eq!(
        dispatcher.sink().delivered,
        vec![
            Action::Move { dx: 40.0, dy: 0.0 },
            Action::Move { dx: 30.0, dy: 0.0 }
        ]
    );
}

#[test]
fn serve_drains_the_queue_before_stopping() {
    let channel = CommandChannel::new();
    let sender = channel.sender();
    let mut dispatcher = Dispatcher::new(ScriptedSink::reachable());
    dispatcher.connect(&channel.receiver());

    sender.try_send(Action::LeftClick).unwrap();
    sender.try_send(Action::RightClick).unwrap();
    let stop = AtomicBool::new(true);
    let taken = dispatcher.serve(&channel.receiver(), &stop, Duration::from_millis(1));

    assert_eq!(taken, 2);
    assert_eq!(
        dispatcher.sink().delivered,
        vec![Action::LeftClick, Action::RightClick]
    );
}

#[cfg(feature = "http-sink")]
#[test]
fn http_bodies_match_endpoint_shapes() {
    use super::http::request_body;
    use serde_json::json;

    assert_eq!(
        request_body(&Action::Move { dx: 1.5, dy: -2.0 }),
        json!({ "action": "move", "dx": 1.5, "dy": -2.0 })
    );
    assert_eq!(
        request_body(&Action::DoubleClick),
        json!({ "action": "double_click" })
    );
    assert_eq!(
        request_body(&Action::hotkey(&["ctrl", "+"])),
        json!({ "keys": ["ctrl", "+"] })
    );
    assert_eq!(
        request_body(&Action::key("Enter")),
        json!({ "key": "Enter" })
    );
    assert_eq!(
        request_body(&Action::AirMouse { active: false }),
        json!({ "active": false })
    );
    assert_eq!(
        request_body(&Action::Orientation {
            alpha: 12.5,
            beta: None
        }),
        json!({ "active": true, "orientation": { "alpha": 12.5, "beta": null } })
    );
}
