//! Serial command link: `#`-terminated ASCII frames and a staleness watchdog.
//!
//! Frame format: `"<dir_L>,<rpm_L>,<dir_R>,<rpm_R>#"`, e.g. `"1,100,2,50#"`.
//! CR/LF are ignored, an over-long partial frame is discarded, and frames with
//! a broken comma structure are dropped without touching the last command.
//! Fields parse leniently (leading integer, else 0) and are clamped: direction
//! to `[0, 2]`, rpm to `[0, max_rpm]`.
use diffdrive_traits::SerialRx;
use eyre::WrapErr;

use crate::config::LinkParams;
use crate::error::Result;
use crate::hw_error::map_hw_error_dyn;
use crate::output::Direction;
use crate::types::{DriveCommand, WheelCommand};

pub const TERMINATOR: u8 = b'#';

/// Outcome of a terminated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Valid(DriveCommand),
    Malformed,
}

/// Parse the leading integer of `s` (optional whitespace and sign), or 0.
fn lenient_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut v: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        v = v.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if neg { -v } else { v }
}

fn wheel(dir: &str, rpm: &str, max_rpm: u32) -> WheelCommand {
    let dir = lenient_int(dir).clamp(0, 2) as i32;
    let rpm = lenient_int(rpm).clamp(0, i64::from(max_rpm)) as u32;
    WheelCommand::new(Direction::from_code(dir), rpm)
}

/// Decode a frame body (without the terminator).
pub fn decode_frame(body: &str, max_rpm: u32) -> Option<DriveCommand> {
    let first = body.find(',')?;
    let second = first + 1 + body[first + 1..].find(',')?;
    let third = second + 1 + body[second + 1..].find(',')?;
    if first == 0 {
        return None;
    }
    let left = wheel(&body[..first], &body[first + 1..second], max_rpm);
    let right = wheel(&body[second + 1..third], &body[third + 1..], max_rpm);
    Some(DriveCommand::new(left, right))
}

/// Byte-at-a-time frame assembler.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_len: usize,
    max_rpm: u32,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(&LinkParams::default())
    }
}

impl FrameDecoder {
    pub fn new(params: &LinkParams) -> Self {
        Self {
            buf: Vec::with_capacity(params.max_frame_len + 1),
            max_len: params.max_frame_len,
            max_rpm: params.max_rpm,
        }
    }

    /// Feed one byte; returns a frame outcome when `byte` is the terminator.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match byte {
            TERMINATOR => {
                let body = String::from_utf8_lossy(&self.buf);
                let frame = match decode_frame(&body, self.max_rpm) {
                    Some(cmd) => Frame::Valid(cmd),
                    None => {
                        tracing::trace!(frame = %body, "malformed frame dropped");
                        Frame::Malformed
                    }
                };
                self.buf.clear();
                Some(frame)
            }
            b'\r' | b'\n' => None,
            other => {
                // length counts received bytes, not decoded characters
                self.buf.push(other);
                if self.buf.len() > self.max_len {
                    tracing::trace!(len = self.buf.len(), "partial frame overflow, discarding");
                    self.buf.clear();
                }
                None
            }
        }
    }

    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_ok: u64,
    pub frames_dropped: u64,
}

/// Decoder plus last-valid-command bookkeeping over a `SerialRx`.
pub struct CommandLink<R: SerialRx> {
    rx: R,
    decoder: FrameDecoder,
    latest: DriveCommand,
    last_valid_ms: u64,
    timeout_ms: u64,
    stats: LinkStats,
}

impl<R: SerialRx> core::fmt::Debug for CommandLink<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandLink")
            .field("latest", &self.latest)
            .field("last_valid_ms", &self.last_valid_ms)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<R: SerialRx> CommandLink<R> {
    /// The watchdog window starts at `now_ms`, so the link is not timed out
    /// immediately after startup.
    pub fn new(rx: R, params: &LinkParams, now_ms: u64) -> Self {
        Self {
            rx,
            decoder: FrameDecoder::new(params),
            latest: DriveCommand::STOP,
            last_valid_ms: now_ms,
            timeout_ms: params.timeout_ms,
            stats: LinkStats::default(),
        }
    }

    /// Drain queued bytes up to and including the first terminator.
    ///
    /// Returns the completed frame, valid or not, or `None` once the queue
    /// is empty. Only a valid frame replaces the latest command.
    pub fn poll(&mut self, now_ms: u64) -> Result<Option<Frame>> {
        loop {
            let byte = self
                .rx
                .read_byte()
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err("serial read")?;
            let Some(byte) = byte else {
                return Ok(None);
            };
            match self.decoder.push(byte) {
                None => continue,
                Some(Frame::Valid(cmd)) => {
                    self.latest = cmd;
                    self.last_valid_ms = now_ms;
                    self.stats.frames_ok += 1;
                    tracing::trace!(?cmd, "frame");
                    return Ok(Some(Frame::Valid(cmd)));
                }
                Some(Frame::Malformed) => {
                    self.stats.frames_dropped += 1;
                    return Ok(Some(Frame::Malformed));
                }
            }
        }
    }

    /// Last successfully decoded command (STOP before the first frame).
    pub fn latest(&self) -> DriveCommand {
        self.latest
    }

    pub fn is_timed_out(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_valid_ms) > self.timeout_ms
    }

    pub fn last_valid_ms(&self) -> u64 {
        self.last_valid_ms
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn feed(dec: &mut FrameDecoder, s: &str) -> Vec<Frame> {
        s.bytes().filter_map(|b| dec.push(b)).collect()
    }

    fn cmd(dl: Direction, rl: u32, dr: Direction, rr: u32) -> DriveCommand {
        DriveCommand::new(WheelCommand::new(dl, rl), WheelCommand::new(dr, rr))
    }

    #[rstest]
    #[case("1,120,2,80", Some(cmd(Direction::Forward, 120, Direction::Reverse, 80)))]
    #[case("1,999,2,80", Some(cmd(Direction::Forward, 500, Direction::Reverse, 80)))]
    #[case("0,0,0,0", Some(DriveCommand::STOP))]
    #[case("7,-5,2,80", Some(cmd(Direction::Reverse, 0, Direction::Reverse, 80)))]
    #[case(" 1,abc,2, 40xyz", Some(cmd(Direction::Forward, 0, Direction::Reverse, 40)))]
    #[case("1,,2,3", Some(cmd(Direction::Forward, 0, Direction::Reverse, 3)))]
    #[case("1,100,2,50,9", Some(cmd(Direction::Forward, 100, Direction::Reverse, 50)))]
    #[case(",100,2,50", None)]
    #[case("1,100,2", None)]
    #[case("", None)]
    fn decode_cases(#[case] body: &str, #[case] expected: Option<DriveCommand>) {
        assert_eq!(decode_frame(body, 500), expected);
    }

    #[test]
    fn direction_codes_survive_decoding() {
        let c = decode_frame("1,120,2,80", 500).unwrap();
        assert_eq!(
            (c.left.direction.code(), c.left.rpm, c.right.direction.code(), c.right.rpm),
            (1, 120, 2, 80)
        );
    }

    #[test]
    fn crlf_is_ignored_inside_frames() {
        let mut dec = FrameDecoder::default();
        let frames = feed(&mut dec, "1,1\r\n00,2,\n50#");
        assert_eq!(
            frames,
            vec![Frame::Valid(cmd(Direction::Forward, 100, Direction::Reverse, 50))]
        );
    }

    #[test]
    fn overflow_discards_partial_and_restarts() {
        let mut dec = FrameDecoder::default();
        // 26 chars without terminator -> discarded
        assert!(feed(&mut dec, "11111111111111111111111111").is_empty());
        assert!(dec.pending().is_empty());
        let frames = feed(&mut dec, "2,30,1,40#");
        assert_eq!(
            frames,
            vec![Frame::Valid(cmd(Direction::Reverse, 30, Direction::Forward, 40))]
        );
    }

    #[test]
    fn exactly_max_len_is_kept() {
        let mut dec = FrameDecoder::default();
        feed(&mut dec, "1,100,2,1000000000000000");
        assert_eq!(dec.pending().len(), 24);
        feed(&mut dec, "0");
        assert_eq!(dec.pending().len(), 25);
    }

    #[test]
    fn high_bytes_count_once_against_the_limit() {
        let mut dec = FrameDecoder::default();
        for _ in 0..25 {
            assert_eq!(dec.push(0xB0), None);
        }
        assert_eq!(dec.pending().len(), 25);
        dec.push(0xB0);
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn line_noise_in_direction_field_decodes_as_stop() {
        let mut dec = FrameDecoder::default();
        for _ in 0..15 {
            dec.push(0xB0);
        }
        let frames = feed(&mut dec, ",120,1,80#");
        assert_eq!(
            frames,
            vec![Frame::Valid(cmd(Direction::Stop, 120, Direction::Forward, 80))]
        );
    }

    #[test]
    fn back_to_back_frames() {
        let mut dec = FrameDecoder::default();
        let frames = feed(&mut dec, "1,10,1,10#bad#0,0,0,0#");
        assert_eq!(
            frames,
            vec![
                Frame::Valid(cmd(Direction::Forward, 10, Direction::Forward, 10)),
                Frame::Malformed,
                Frame::Valid(DriveCommand::STOP),
            ]
        );
    }

    proptest! {
        #[test]
        fn decoder_never_panics_and_clamps(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut dec = FrameDecoder::default();
            for b in bytes {
                if let Some(Frame::Valid(c)) = dec.push(b) {
                    prop_assert!(c.left.rpm <= 500 && c.right.rpm <= 500);
                }
                prop_assert!(dec.pending().len() <= 25);
            }
        }

        #[test]
        fn well_formed_frames_roundtrip(
            dl in 0u8..=2, rl in 0u32..=500, dr in 0u8..=2, rr in 0u32..=500,
        ) {
            let body = format!("{dl},{rl},{dr},{rr}");
            let c = decode_frame(&body, 500).unwrap();
            prop_assert_eq!(c.left.direction.code(), dl);
            prop_assert_eq!(c.left.rpm, rl);
            prop_assert_eq!(c.right.direction.code(), dr);
            prop_assert_eq!(c.right.rpm, rr);
        }
    }
}
