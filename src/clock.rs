//! Minutes-since-midnight to 12-hour clock text, e.g. `500` -> `08:20AM`.

use std::fmt;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        })
    }
}

/// A wall-clock time on the 12-hour dial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTime {
    /// 1..=12
    pub hour: u32,
    pub minute: u32,
    pub meridiem: Meridiem,
}

impl ClockTime {
    /// Convert minutes since midnight; values past one day wrap around.
    pub fn from_minutes(minutes: u32) -> Self {
        let minutes = minutes % MINUTES_PER_DAY;
        let hour24 = minutes / 60;
        let meridiem = if hour24 < 12 { Meridiem::Am } else { Meridiem::Pm };
        let hour = match hour24 % 12 {
            0 => 12,
            h => h,
        };
        Self {
            hour,
            minute: minutes % 60,
            meridiem,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}{}", self.hour, self.minute, self.meridiem)
    }
}

pub fn minutes_to_clock(minutes: u32) -> String {
    ClockTime::from_minutes(minutes).to_string()
}
