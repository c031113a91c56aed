//! Time utilities and constants for EstateFX.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Rate refresh timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate stays valid (15 minutes).
    pub fn cache_duration() -> Duration {
        Duration::minutes(15)
    }

    /// Upper bound on a single provider request (5 seconds).
    pub fn request_timeout() -> Duration {
        Duration::seconds(5)
    }

    /// Background refresh tick (60 seconds).
    pub fn refresh_interval() -> Duration {
        Duration::seconds(60)
    }

    /// Hardcoded USD to AED rate used until the provider answers.
    ///
    /// The dirham has been pegged at this value since 1997.
    pub const FALLBACK_USD_TO_AED: f64 = 3.6725;
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// The Unix epoch, used as "never refreshed".
pub fn epoch() -> Timestamp {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

/// Elapsed time from `since` until `now`, clamped at zero.
pub fn age(since: Timestamp, now: Timestamp) -> Duration {
    let elapsed = now - since;
    if elapsed < Duration::zero() {
        Duration::zero()
    } else {
        elapsed
    }
}

/// Check whether `since` is still inside a validity window.
pub fn is_within(since: Timestamp, window: Duration, now: Timestamp) -> bool {
    age(since, now) < window
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_within() {
        let recent = now() - Duration::minutes(10);
        assert!(is_within(recent, constants::cache_duration(), now()));

        let old = now() - Duration::minutes(20);
        assert!(!is_within(old, constants::cache_duration(), now()));
    }

    #[test]
    fn test_epoch_is_always_stale() {
        assert!(!is_within(epoch(), constants::cache_duration(), now()));
    }

    #[test]
    fn test_age_clamps_future_timestamps() {
        let future = now() + Duration::seconds(30);
        assert_eq!(age(future, now()), Duration::zero());
    }

    #[test]
    fn test_as_std() {
        assert_eq!(
            constants::request_timeout().as_std(),
            std::time::Duration::from_secs(5)
        );
        assert_eq!(Duration::seconds(-1).as_std(), std::time::Duration::ZERO);
    }
}
