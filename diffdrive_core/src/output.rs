//! Output stage: direction codes, enable-pin pairs and PWM duty mapping.

/// Per-motor direction as carried on the command link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Direction {
    #[default]
    Stop,
    Forward,
    Reverse,
}

impl Direction {
    /// Link code → direction. 1 and 2 drive; every other code stops.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Direction::Forward,
            2 => Direction::Reverse,
            _ => Direction::Stop,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Direction::Stop => 0,
            Direction::Forward => 1,
            Direction::Reverse => 2,
        }
    }

    /// `(en1, en2)` levels for the H-bridge.
    pub fn pins(self) -> (bool, bool) {
        match self {
            Direction::Stop => (false, false),
            Direction::Forward => (false, true),
            Direction::Reverse => (true, false),
        }
    }

    pub fn is_driving(self) -> bool {
        self != Direction::Stop
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Direction::Stop => "stop",
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        };
        f.write_str(s)
    }
}

/// Map control effort to a PWM duty: `round(|u|)` clamped to `[0, clamp]`.
/// Non-finite effort maps to 0.
#[inline]
pub fn duty_from_effort(effort: f32, clamp: u8) -> u8 {
    if !effort.is_finite() {
        return 0;
    }
    let mag = effort.abs().round();
    if mag >= f32::from(clamp) {
        clamp
    } else {
        mag as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.4, 0)]
    #[case(0.5, 1)]
    #[case(-12.6, 13)]
    #[case(253.6, 254)]
    #[case(1e9, 254)]
    #[case(-1e9, 254)]
    #[case(f32::NAN, 0)]
    #[case(f32::INFINITY, 0)]
    fn duty_mapping(#[case] effort: f32, #[case] duty: u8) {
        assert_eq!(duty_from_effort(effort, 254), duty);
    }

    #[rstest]
    #[case(0, Direction::Stop, (false, false))]
    #[case(1, Direction::Forward, (false, true))]
    #[case(2, Direction::Reverse, (true, false))]
    #[case(7, Direction::Stop, (false, false))]
    #[case(-1, Direction::Stop, (false, false))]
    fn direction_codes(#[case] code: i32, #[case] dir: Direction, #[case] pins: (bool, bool)) {
        assert_eq!(Direction::from_code(code), dir);
        assert_eq!(dir.pins(), pins);
    }
}
