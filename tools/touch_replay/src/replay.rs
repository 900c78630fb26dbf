use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use remote_touchpad::{
    Action, CommandChannel, CommandSink, Dispatcher, ModifierEvent, RemoteConfig,
    RemoteController,
};

use crate::trace::{TraceEvent, TraceInput};

// Gesture hold, deferred click and sticky long-press can all be pending at once.
const MAX_DEADLINES_PER_STEP: usize = 8;
const TRANSPORT_IDLE: Duration = Duration::from_millis(2);

#[derive(Clone, Debug, PartialEq)]
pub struct ReplayedAction {
    pub ms: u64,
    pub action: Action,
}

impl ReplayedAction {
    pub fn line(&self) -> String {
        let ms = self.ms;
        let kind = self.action.label();
        match &self.action {
            Action::Move { dx, dy } => format!("action,{ms},{kind},{dx},{dy}"),
            Action::Scroll { dy } => format!("action,{ms},{kind},{dy}"),
            Action::Hotkey { keys } => format!("action,{ms},{kind},{}", keys.join("+")),
            Action::KeyAction { key } => format!("action,{ms},{kind},{key}"),
            Action::Orientation { alpha, beta } => match beta {
                Some(beta) => format!("action,{ms},{kind},{alpha},{beta}"),
                None => format!("action,{ms},{kind},{alpha},-"),
            },
            Action::AirMouse { active } => format!("action,{ms},{kind},{active}"),
            _ => format!("action,{ms},{kind}"),
        }
    }
}

/// Drives `events` through a controller. When a dispatcher is given it serves a separate
/// outbound queue from its own thread, so slow deliveries never hold up interpretation.
pub fn replay<S: CommandSink + Send>(
    config: &RemoteConfig,
    events: &[TraceEvent],
    dispatcher: Option<&mut Dispatcher<S>>,
) -> Vec<ReplayedAction> {
    let Some(dispatcher) = dispatcher else {
        return interpret(config, events, None);
    };

    let outbound = CommandChannel::new();
    if !dispatcher.connect(&outbound.receiver()) {
        log::warn!("replay: sink not connected status={}", dispatcher.connection().status);
    }
    let stop = AtomicBool::new(false);

    thread::scope(|scope| {
        let transport =
            scope.spawn(|| dispatcher.serve(&outbound.receiver(), &stop, TRANSPORT_IDLE));
        let replayed = interpret(config, events, Some(&outbound));
        stop.store(true, Ordering::Release);
        match transport.join() {
            Ok(taken) => log::info!("replay: transport done taken={}", taken),
            Err(_) => log::error!("replay: transport thread panicked"),
        }
        replayed
    })
}

fn interpret(
    config: &RemoteConfig,
    events: &[TraceEvent],
    outbound: Option<&CommandChannel>,
) -> Vec<ReplayedAction> {
    let channel = CommandChannel::new();
    let mut remote = RemoteController::new(config, &channel);
    let mut out = Vec::new();

    for event in events {
        fire_deadlines(&mut remote, Some(event.ms), &channel, &mut out, outbound);
        apply(&mut remote, event);
        collect(&channel, event.ms, &mut out, outbound);
    }
    // Let deferred clicks and pending long-presses resolve after the last sample.
    fire_deadlines(&mut remote, None, &channel, &mut out, outbound);

    out
}

fn apply(remote: &mut RemoteController<'_>, event: &TraceEvent) {
    let ms = event.ms;
    match &event.input {
        TraceInput::Touch(sample) => remote.on_touch(ms, *sample),
        TraceInput::Tick => {}
        TraceInput::ModifierDown(key) => remote.modifier_down(ms, key),
        TraceInput::ModifierUp(key) => report(ms, remote.modifier_up(ms, key)),
        TraceInput::Key(key) => report(ms, remote.key_down(key)),
        TraceInput::Text(text) => remote.text_input(text),
        TraceInput::HardwareKey(key) => {
            if !remote.hardware_key(key) {
                log::debug!("replay: unhandled hardware key={} ms={}", key, ms);
            }
        }
        TraceInput::Media(name) => remote.media(name),
        TraceInput::Orientation(sample) => remote.on_orientation(*sample),
        TraceInput::AirMouseToggle => {
            let active = remote.toggle_air_mouse();
            log::info!("replay: airmouse active={} ms={}", active, ms);
        }
        TraceInput::Reset => remote.reset(ms),
    }
}

/// Fires armed deadlines in order, up to `until_ms` or all of them when `None`.
fn fire_deadlines(
    remote: &mut RemoteController<'_>,
    until_ms: Option<u64>,
    channel: &CommandChannel,
    out: &mut Vec<ReplayedAction>,
    outbound: Option<&CommandChannel>,
) {
    for _ in 0..MAX_DEADLINES_PER_STEP {
        let Some(deadline) = remote.next_deadline() else {
            return;
        };
        if until_ms.is_some_and(|until_ms| deadline > until_ms) {
            return;
        }
        report(deadline, remote.advance(deadline));
        collect(channel, deadline, out, outbound);
    }
}

fn collect(
    channel: &CommandChannel,
    ms: u64,
    out: &mut Vec<ReplayedAction>,
    outbound: Option<&CommandChannel>,
) {
    while let Ok(action) = channel.try_receive() {
        if let Some(outbound) = outbound {
            if outbound.try_send(action.clone()).is_err() {
                log::warn!("replay: outbound queue full; dropped action={}", action.label());
            }
        }
        out.push(ReplayedAction { ms, action });
    }
}

fn report(ms: u64, event: Option<ModifierEvent>) {
    if let Some(event) = event {
        log::info!("replay: modifier ms={} event={:?}", ms, event);
    }
}

pub fn load_expected(path: &Path) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

pub fn check_expected(expected: &[String], actual: &[String]) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    for (index, (want, got)) in expected.iter().zip(actual).enumerate() {
        if want != got {
            eprintln!("first mismatch at action {}:", index + 1);
            eprintln!("  expected: {want}");
            eprintln!("  actual:   {got}");
            break;
        }
    }
    bail!(
        "action sequence mismatch (expected {} actions, got {})",
        expected.len(),
        actual.len()
    )
}

#[cfg(test)]
mod tests {
    use remote_touchpad::{SinkReply, TransportError};

    use super::*;
    use crate::trace;

    struct CountingSink {
        delivered: usize,
    }

    impl CommandSink for CountingSink {
        fn connect(&mut self) -> Result<SinkReply, TransportError> {
            Ok(SinkReply::ok())
        }

        fn deliver(&mut self, _action: &Action) -> Result<SinkReply, TransportError> {
            self.delivered += 1;
            Ok(SinkReply::ok())
        }
    }

    fn lines(text: &str) -> Vec<String> {
        let events = trace::parse(text).unwrap();
        replay(
            &RemoteConfig::default(),
            &events,
            None::<&mut Dispatcher<CountingSink>>,
        )
        .iter()
        .map(ReplayedAction::line)
        .collect()
    }

    #[test]
    fn trailing_tap_is_flushed_at_its_deadline() {
        assert_eq!(
            lines("0,start,1,100,100\n80,end,0,100,100\n"),
            vec!["action,380,left_click"]
        );
    }

    #[test]
    fn hold_is_stamped_at_the_hold_deadline() {
        assert_eq!(
            lines("0,start,1,100,100\n900,end,0,100,100\n"),
            vec!["action,400,right_click"]
        );
    }

    #[test]
    fn sticky_combo_and_swipe_lines() {
        let text = "\
            0,mod_down,win\n\
            350,mod_up,win\n\
            400,key,ArrowRight\n\
            1000,start,3,300,300,340,300\n\
            1050,move,3,300,180,340,180\n\
            1100,end,0,300,180\n";
        assert_eq!(
            lines(text),
            vec![
                "action,400,hotkey,win+ArrowRight",
                "action,1100,hotkey,win+tab"
            ]
        );
    }

    #[test]
    fn dispatcher_sees_every_replayed_action() {
        let events = trace::parse("0,hw,AudioVolumeDown\n10,text,ok\n20,air\n30,orient,5,-\n").unwrap();
        let mut dispatcher = Dispatcher::new(CountingSink { delivered: 0 });
        let replayed = replay(&RemoteConfig::default(), &events, Some(&mut dispatcher));

        assert_eq!(replayed.len(), 4);
        assert_eq!(dispatcher.sink().delivered, 4);
        assert_eq!(replayed[3].line(), "action,30,orientation,5,-");
    }

    #[test]
    fn bundled_fixtures_match_their_expectations() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        for name in ["tap_drag_scroll", "sticky_air"] {
            let events = trace::load(&fixtures.join(format!("{name}.csv"))).unwrap();
            let actual: Vec<String> = replay(
                &RemoteConfig::default(),
                &events,
                None::<&mut Dispatcher<CountingSink>>,
            )
            .iter()
            .map(ReplayedAction::line)
            .collect();
            let expected = load_expected(&fixtures.join(format!("{name}.expected"))).unwrap();
            assert_eq!(actual, expected, "{name}");
        }
    }

    #[test]
    fn mismatch_is_reported() {
        let expected = vec!["action,380,left_click".to_string()];
        assert!(check_expected(&expected, &expected).is_ok());
        assert!(check_expected(&expected, &[]).is_err());
    }
}
