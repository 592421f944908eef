//! Wall-clock source for flag timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ErrorKind, FlagError};

/// Supplies the issuance timestamp.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Microseconds since the Unix epoch.
    fn now_micros(&self) -> Result<u64, FlagError>;
}

/// Reads [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> Result<u64, FlagError> {
        micros_since_epoch(SystemTime::now())
    }
}

fn micros_since_epoch(now: SystemTime) -> Result<u64, FlagError> {
    let elapsed = now
        .duration_since(UNIX_EPOCH)
        .map_err(|e| FlagError::new(ErrorKind::ClockBeforeEpoch(e)))?;
    u64::try_from(elapsed.as_micros()).map_err(|_| FlagError::new(ErrorKind::ClockOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn converts_to_microseconds() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        assert_eq!(micros_since_epoch(t).unwrap(), 1_700_000_000_123_456);
    }

    #[test]
    fn epoch_is_zero() {
        assert_eq!(micros_since_epoch(UNIX_EPOCH).unwrap(), 0);
    }

    #[test]
    fn before_epoch_is_an_error() {
        let err = micros_since_epoch(UNIX_EPOCH - Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ClockBeforeEpoch(_)));
    }

    #[test]
    fn far_future_overflows() {
        let far = UNIX_EPOCH.checked_add(Duration::from_secs(u64::MAX / 1_000_000 + 1));
        if let Some(far) = far {
            let err = micros_since_epoch(far).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ClockOverflow));
        }
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_micros().unwrap() > 1_577_836_800_000_000);
    }
}
