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

/// Extracts a displayable file stem from a path, returning a fallback if the name is unreadable.
pub fn file_stem_display(path: &Path) -> &str {
    path.file_stem()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration in a seconds.millis format.
pub fn duration_seconds_millis(duration: Duration) -> String {
    format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis())
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::time::Duration;

    use crate::util::{duration_seconds_millis, file_stem_display};

    #[test]
    fn test_duration_seconds_strings() {
        assert_eq!("0.000s", duration_seconds_millis(Duration::new(0, 0)));
        assert_eq!("0.350s", duration_seconds_millis(Duration::from_millis(350)));
        assert_eq!("2.005s", duration_seconds_millis(Duration::from_millis(2005)));
        assert_eq!("61.000s", duration_seconds_millis(Duration::new(61, 0)));
    }

    #[test]
    fn test_file_stem_display() {
        assert_eq!("step1", file_stem_display(Path::new("sfx/step1.wav")));
        assert_eq!("noext", file_stem_display(Path::new("noext")));
    }
}
