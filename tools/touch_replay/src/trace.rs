use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use remote_touchpad::{OrientationSample, TouchPhase, TouchPoint, TouchSample};

#[derive(Clone, Debug, PartialEq)]
pub enum TraceInput {
    Touch(TouchSample),
    Tick,
    ModifierDown(String),
    ModifierUp(String),
    Key(String),
    Text(String),
    HardwareKey(String),
    Media(String),
    Orientation(OrientationSample),
    AirMouseToggle,
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceEvent {
    pub ms: u64,
    pub input: TraceInput,
}

pub fn load(path: &Path) -> Result<Vec<TraceEvent>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid trace {}", path.display()))
}

pub fn parse(text: &str) -> Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    let mut last_ms = 0u64;
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = parse_line(trimmed).with_context(|| format!("line {line_no}: {trimmed}"))?;
        if event.ms < last_ms {
            bail!("line {line_no}: time goes backwards ({} < {last_ms})", event.ms);
        }
        last_ms = event.ms;
        events.push(event);
    }
    Ok(events)
}

fn parse_line(line: &str) -> Result<TraceEvent> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let [ms, kind, args @ ..] = parts.as_slice() else {
        bail!("expected `ms,kind,...`");
    };
    let ms = ms
        .parse::<u64>()
        .map_err(|err| anyhow!("invalid ms '{ms}': {err}"))?;

    let input = match *kind {
        "start" => TraceInput::Touch(parse_touch(TouchPhase::Start, args)?),
        "move" => TraceInput::Touch(parse_touch(TouchPhase::Move, args)?),
        "end" => TraceInput::Touch(parse_touch(TouchPhase::End, args)?),
        "tick" => TraceInput::Tick,
        "mod_down" => TraceInput::ModifierDown(one_arg(args, "key")?),
        "mod_up" => TraceInput::ModifierUp(one_arg(args, "key")?),
        "key" => TraceInput::Key(one_arg(args, "key")?),
        // Text may itself contain commas.
        "text" => TraceInput::Text(args.join(",")),
        "hw" => TraceInput::HardwareKey(one_arg(args, "key")?),
        "media" => TraceInput::Media(one_arg(args, "action")?),
        "orient" => {
            let [alpha, beta] = args else {
                bail!("orient expects alpha,beta");
            };
            TraceInput::Orientation(OrientationSample::new(
                parse_axis(alpha)?,
                parse_axis(beta)?,
            ))
        }
        "air" => TraceInput::AirMouseToggle,
        "reset" => TraceInput::Reset,
        other => bail!("unknown event kind '{other}'"),
    };
    Ok(TraceEvent { ms, input })
}

fn parse_touch(phase: TouchPhase, args: &[&str]) -> Result<TouchSample> {
    let (count, coords) = match args {
        [count, x0, y0] => (count, vec![(x0, y0)]),
        [count, x0, y0, x1, y1] => (count, vec![(x0, y0), (x1, y1)]),
        _ => bail!("touch expects count,x0,y0[,x1,y1]"),
    };
    let count = count
        .parse::<u8>()
        .map_err(|err| anyhow!("invalid count '{count}': {err}"))?;
    let points = coords
        .into_iter()
        .map(|(x, y)| -> Result<TouchPoint> {
            Ok(TouchPoint::new(parse_coord(x)?, parse_coord(y)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TouchSample::new(phase, count, &points))
}

fn parse_coord(raw: &str) -> Result<f32> {
    raw.parse::<f32>()
        .map_err(|err| anyhow!("invalid coordinate '{raw}': {err}"))
}

fn parse_axis(raw: &str) -> Result<Option<f64>> {
    if raw == "-" {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|err| anyhow!("invalid orientation '{raw}': {err}"))
}

fn one_arg(args: &[&str], name: &str) -> Result<String> {
    match args {
        [value] if !value.is_empty() => Ok((*value).to_owned()),
        _ => bail!("expected exactly one {name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_touch_and_keyboard_lines() {
        let events = parse(
            "# tap then combo\n\
             0,start,1,100,200\n\
             40,move,2,10.5,20,30,40\n\
             80,end,0,100,200\n\
             \n\
             100,mod_down,ctrl\n\
             420,mod_up,ctrl\n\
             500,key,ArrowUp\n\
             510,text,a,b\n\
             520,hw,AudioVolumeUp\n\
             530,media,playpause\n\
             540,tick\n",
        )
        .unwrap();

        assert_eq!(events.len(), 10);
        assert_eq!(
            events[0].input,
            TraceInput::Touch(TouchSample::new(
                TouchPhase::Start,
                1,
                &[TouchPoint::new(100.0, 200.0)]
            ))
        );
        assert_eq!(
            events[1].input,
            TraceInput::Touch(TouchSample::new(
                TouchPhase::Move,
                2,
                &[TouchPoint::new(10.5, 20.0), TouchPoint::new(30.0, 40.0)]
            ))
        );
        assert_eq!(events[3].input, TraceInput::ModifierDown("ctrl".into()));
        assert_eq!(events[6].input, TraceInput::Text("a,b".into()));
        assert_eq!(events[9].ms, 540);
        assert_eq!(events[9].input, TraceInput::Tick);
    }

    #[test]
    fn parses_orientation_with_missing_axes() {
        let events = parse("0,air\n10,orient,12.5,-\n20,orient,-,3\n30,reset\n").unwrap();
        assert_eq!(events[0].input, TraceInput::AirMouseToggle);
        assert_eq!(
            events[1].input,
            TraceInput::Orientation(OrientationSample::new(Some(12.5), None))
        );
        assert_eq!(
            events[2].input,
            TraceInput::Orientation(OrientationSample::new(None, Some(3.0)))
        );
        assert_eq!(events[3].input, TraceInput::Reset);
    }

    #[test]
    fn rejects_malformed_lines_with_line_number() {
        let err = parse("0,start,1,100,200\n10,wiggle\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        assert!(parse("0,start,1,100\n").is_err());
        assert!(parse("0,key\n").is_err());
        assert!(parse("x,tick\n").is_err());
        assert!(parse("20,tick\n10,tick\n").is_err());
    }
}
