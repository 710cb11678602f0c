//! `decode`: run one frame through the link decoder.

use diffdrive_core::link::TERMINATOR;
use diffdrive_core::{DriveCommand, Frame, FrameDecoder, LinkParams, WheelCommand};

/// Decode the first complete frame in `text`, appending the terminator when
/// it is missing.
pub fn decode(text: &str, params: &LinkParams) -> eyre::Result<DriveCommand> {
    let mut dec = FrameDecoder::new(params);
    let trimmed = text.trim();
    let tail: &[u8] = if trimmed.ends_with(char::from(TERMINATOR)) {
        &[]
    } else {
        &[TERMINATOR]
    };
    for &b in trimmed.as_bytes().iter().chain(tail) {
        match dec.push(b) {
            Some(Frame::Valid(cmd)) => return Ok(cmd),
            Some(Frame::Malformed) => break,
            None => {}
        }
    }
    eyre::bail!("malformed frame {trimmed:?}: expected <dir_L>,<rpm_L>,<dir_R>,<rpm_R>#")
}

fn wheel_json(w: WheelCommand) -> serde_json::Value {
    serde_json::json!({
        "dir": w.direction.code(),
        "direction": w.direction.to_string(),
        "rpm": w.rpm,
    })
}

pub fn render(cmd: &DriveCommand, json: bool) -> String {
    if json {
        serde_json::json!({
            "left": wheel_json(cmd.left),
            "right": wheel_json(cmd.right),
        })
        .to_string()
    } else {
        format!(
            "left: {} {} rpm\nright: {} {} rpm",
            cmd.left.direction, cmd.left.rpm, cmd.right.direction, cmd.right.rpm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1,120,2,80#", "left: forward 120 rpm\nright: reverse 80 rpm")]
    #[case("1,120,2,80", "left: forward 120 rpm\nright: reverse 80 rpm")]
    #[case(" 0,0,0,0# ", "left: stop 0 rpm\nright: stop 0 rpm")]
    #[case("1,999,2,80#", "left: forward 500 rpm\nright: reverse 80 rpm")]
    fn decodes_and_renders(#[case] frame: &str, #[case] expected: &str) {
        let cmd = decode(frame, &LinkParams::default()).unwrap();
        assert_eq!(render(&cmd, false), expected);
    }

    #[test]
    fn malformed_is_an_error() {
        let err = decode("1,2#", &LinkParams::default()).unwrap_err();
        assert!(err.to_string().contains("malformed frame"));
    }

    #[test]
    fn json_shape() {
        let cmd = decode("2,40,1,30", &LinkParams::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&render(&cmd, true)).unwrap();
        assert_eq!(v["left"]["dir"], 2);
        assert_eq!(v["left"]["direction"], "reverse");
        assert_eq!(v["right"]["rpm"], 30);
    }
}
