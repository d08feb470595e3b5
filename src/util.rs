// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::path::Path;
use std::time::Duration;

/// Fixed-point unity for 16.16 ratios.
const FIXED_ONE: f64 = 65536.0;

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration in a minutes:seconds format.
pub fn duration_minutes_seconds(duration: Duration) -> String {
    let minutes = duration.as_secs() / 60;
    let secs = duration.as_secs() - minutes * 60;
    format!("{}:{:02}", minutes, secs)
}

/// The number of frames `duration` lasts at `sample_rate`, to the millisecond.
pub fn duration_to_frames(duration: Duration, sample_rate: u32) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    millis.saturating_mul(u64::from(sample_rate)) / 1000
}

/// Converts a playback speed ratio to 16.16 fixed point. Returns None for ratios that
/// aren't positive or don't fit.
pub fn speed_ratio_to_fixed(ratio: f64) -> Option<u32> {
    let fixed = (ratio * FIXED_ONE).round();
    if !fixed.is_finite() || fixed < 1.0 || fixed > u32::MAX as f64 {
        return None;
    }
    Some(fixed as u32)
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::time::Duration;

    use crate::util::{
        duration_minutes_seconds, duration_to_frames, filename_display, speed_ratio_to_fixed,
    };

    #[test]
    fn test_duration_minutes_strings() {
        assert_eq!("0:00", duration_minutes_seconds(Duration::new(0, 0)));
        assert_eq!("0:05", duration_minutes_seconds(Duration::new(5, 0)));
        assert_eq!("0:55", duration_minutes_seconds(Duration::new(55, 0)));
        assert_eq!("1:00", duration_minutes_seconds(Duration::new(60, 0)));
        assert_eq!("2:05", duration_minutes_seconds(Duration::new(125, 0)));
        assert_eq!("60:06", duration_minutes_seconds(Duration::new(3606, 0)));
    }

    #[test]
    fn test_filename_display() {
        assert_eq!("intro.ogg", filename_display(Path::new("/sounds/intro.ogg")));
        assert_eq!("unreadable file name", filename_display(Path::new("/")));
    }

    #[test]
    fn test_duration_to_frames() {
        assert_eq!(48000, duration_to_frames(Duration::from_secs(1), 48000));
        assert_eq!(11025, duration_to_frames(Duration::from_millis(250), 44100));
        assert_eq!(0, duration_to_frames(Duration::ZERO, 48000));
        // Sub-millisecond parts are dropped.
        assert_eq!(48, duration_to_frames(Duration::from_micros(1999), 48000));
    }

    #[test]
    fn test_speed_ratio_to_fixed() {
        assert_eq!(Some(0x10000), speed_ratio_to_fixed(1.0));
        assert_eq!(Some(0x8000), speed_ratio_to_fixed(0.5));
        assert_eq!(Some(0x18000), speed_ratio_to_fixed(1.5));
        assert_eq!(None, speed_ratio_to_fixed(0.0));
        assert_eq!(None, speed_ratio_to_fixed(-1.0));
        assert_eq!(None, speed_ratio_to_fixed(f64::NAN));
        assert_eq!(None, speed_ratio_to_fixed(1e9));
    }
}
