//! Conversions between Unix time and GPS seconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds between the Unix epoch and the GPS epoch as used by the archive.
pub const GPS_EPOCH_OFFSET_SECS: i64 = 315_964_784;

/// Converts a Unix timestamp to GPS seconds, saturating at the `i64` bounds.
#[must_use]
pub const fn unix_to_gps(unix_secs: i64) -> i64 {
    unix_secs.saturating_sub(GPS_EPOCH_OFFSET_SECS)
}

/// Converts GPS seconds to a Unix timestamp.
#[must_use]
pub const fn gps_to_unix(gps_secs: i64) -> i64 {
    gps_secs.saturating_add(GPS_EPOCH_OFFSET_SECS)
}

/// Returns the current time in GPS seconds.
#[must_use]
pub fn gps_now() -> i64 {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    unix_to_gps(unix_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_to_gps_known_observation() {
        // 1401856338 is the time tag of a recombined file from obs 1070978272.
        assert_eq!(unix_to_gps(1_401_856_338), 1_085_891_554);
    }

    #[test]
    fn test_gps_to_unix_inverts_unix_to_gps() {
        assert_eq!(gps_to_unix(unix_to_gps(1_386_943_943)), 1_386_943_943);
    }

    #[test]
    fn test_conversions_saturate_at_bounds() {
        assert_eq!(unix_to_gps(i64::MIN), i64::MIN);
        assert_eq!(gps_to_unix(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_gps_now_is_after_2020() {
        // 2020-01-01T00:00:00Z in GPS seconds.
        assert!(gps_now() > 1_261_872_016);
    }
}
