use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub user_id: u64,
    pub reason: String,
    pub expires_at: DateTime<Utc>,
    /// Missing for entries written before creation times were tracked.
    pub created_at: Option<DateTime<Utc>>,
}

impl BlacklistEntry {
    /// An entry stays active up to and including `expires_at`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left on the entry, `None` once it has run out.
    #[inline]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let left = self.expires_at.signed_duration_since(now);
        if left > Duration::zero() {
            Some(left)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(expires_at: DateTime<Utc>) -> BlacklistEntry {
        BlacklistEntry {
            user_id: 1,
            reason: String::from("spam"),
            expires_at,
            created_at: Some(expires_at - Duration::days(1)),
        }
    }

    #[test]
    fn test_not_expired_at_exact_end() {
        let end = Utc::now();
        let e = entry(end);
        assert!(!e.is_expired(end));
        assert!(e.is_expired(end + Duration::seconds(1)));
    }

    #[test]
    fn test_remaining() {
        let now = Utc::now();
        let e = entry(now + Duration::hours(30));
        assert_eq!(e.remaining(now), Some(Duration::hours(30)));
        assert_eq!(e.remaining(now + Duration::hours(31)), None);
    }
}
