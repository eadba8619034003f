//! Time-window gates in front of every point award.
//!
//! The chat, anti-spam and salary gates persist their timestamps through the
//! store. The daily gate is kept in memory and resets when the bot restarts.

use crate::config::Cooldowns;
use crate::errors::{Error, Result};

use chrono::{DateTime, Duration, Utc};
use db::{ReadOnlyDb, Store, WriteableDb};
use log::trace;
use rand::Rng;
use serenity::model::id::UserId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// True when nothing was recorded yet or at least `window` has passed.
#[inline]
pub fn is_allowed(last: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) -> bool {
    last.map_or(true, |last| now.signed_duration_since(last) >= window)
}

/// Time left before the gate opens again, `None` if it is already open.
pub fn remaining(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<Duration> {
    let last = last?;
    let left = window - now.signed_duration_since(last);
    if left > Duration::zero() {
        Some(left)
    } else {
        None
    }
}

/// Formats a duration the way users see it, rounded to whole seconds.
pub fn humanize(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0) as u64;
    humantime::format_duration(std::time::Duration::from_secs(secs)).to_string()
}

/// Daily reward: 1% pay 200, 10% pay 120 to 180, the rest pay 20 to 80.
pub fn roll_daily_reward<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    match rng.gen_range(1..=100) {
        100 => 200,
        90..=99 => rng.gen_range(120..=180),
        _ => rng.gen_range(20..=80),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Granted,
    Wait(Duration),
}

/// Daily claims, in memory only.
pub struct DailyGate {
    window: Duration,
    claims: RwLock<HashMap<UserId, DateTime<Utc>>>,
}

impl DailyGate {
    pub fn new(window: Duration) -> DailyGate {
        DailyGate {
            window,
            claims: RwLock::new(HashMap::new()),
        }
    }

    /// Records the claim if the window allows it. Check and record happen
    /// under one write lock so a double click can't claim twice.
    pub fn claim(&self, user: UserId, now: DateTime<Utc>) -> Result<Claim> {
        let mut claims = self
            .claims
            .write()
            .map_err(|_why| Error::ConstStr("Failed to acquire write lock on daily claims"))?;

        let last = claims.get(&user).copied();
        match remaining(last, now, self.window) {
            Some(left) => Ok(Claim::Wait(left)),
            None => {
                claims.insert(user, now);
                Ok(Claim::Granted)
            }
        }
    }

    /// Forgets a claim whose reward could not be paid.
    pub fn release(&self, user: UserId) -> Result<()> {
        match self.claims.write() {
            Ok(mut claims) => {
                claims.remove(&user);
                Ok(())
            }
            Err(_why) => Err(Error::ConstStr("Failed to acquire write lock on daily claims")),
        }
    }
}

/// The persisted gates plus the daily one.
pub struct Gates {
    store: Arc<Store>,
    chat: Duration,
    spam: Duration,
    salary: Duration,
    pub daily: DailyGate,
}

impl Gates {
    pub fn new(store: Arc<Store>, cooldowns: &Cooldowns) -> Gates {
        Gates {
            store,
            chat: cooldowns.chat(),
            spam: cooldowns.spam(),
            salary: cooldowns.salary(),
            daily: DailyGate::new(cooldowns.daily()),
        }
    }

    /// Passes unless `text` repeats the last accepted message or arrives
    /// inside the spam window. Only passing messages are recorded.
    pub fn pass_spam(&self, user: UserId, text: &str, now: DateTime<Utc>) -> Result<bool> {
        let window = self.spam;
        let passed = self.store.call(|db| {
            let suppressed = match db.get_spam_record(user)? {
                Some(record) => {
                    record.is_repeat(text) || !is_allowed(Some(record.last_time), now, window)
                }
                None => false,
            };
            if !suppressed {
                db.record_spam(user, text, now)?;
            }
            Ok(!suppressed)
        })?;
        trace!("spam gate for {user}: {passed}");
        Ok(passed)
    }

    pub fn pass_chat(&self, user: UserId, now: DateTime<Utc>) -> Result<bool> {
        let window = self.chat;
        Ok(self.store.call(|db| {
            let allowed = is_allowed(db.get_chat_cooldown(user)?, now, window);
            if allowed {
                db.record_chat(user, now)?;
            }
            Ok(allowed)
        })?)
    }

    pub fn pass_salary(&self, user: UserId, now: DateTime<Utc>) -> Result<bool> {
        let window = self.salary;
        Ok(self.store.call(|db| {
            let allowed = is_allowed(db.get_salary_cooldown(user)?, now, window);
            if allowed {
                db.record_salary(user, now)?;
            }
            Ok(allowed)
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn gates() -> Gates {
        let store = Arc::new(Store::open_in_memory().unwrap());
        Gates::new(store, &Cooldowns::default())
    }

    #[test]
    fn test_window_boundary() {
        let window = Duration::seconds(30);
        let t = t0();
        assert!(is_allowed(None, t, window));
        assert!(!is_allowed(Some(t), t + window - Duration::seconds(1), window));
        assert!(is_allowed(Some(t), t + window, window));
    }

    #[test]
    fn test_remaining() {
        let window = Duration::hours(24);
        let t = t0();
        assert_eq!(remaining(None, t, window), None);
        assert_eq!(
            remaining(Some(t), t + Duration::hours(20), window),
            Some(Duration::hours(4))
        );
        assert_eq!(remaining(Some(t), t + window, window), None);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Duration::seconds(3 * 3600 + 120)), "3h 2m");
        assert_eq!(humanize(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_chat_gate() -> Result<()> {
        let gates = gates();
        let user = UserId(1);
        let t = t0();
        assert!(gates.pass_chat(user, t)?);
        assert!(!gates.pass_chat(user, t + Duration::seconds(29))?);
        assert!(gates.pass_chat(user, t + Duration::seconds(30))?);
        Ok(())
    }

    #[test]
    fn test_identical_messages_suppressed() -> Result<()> {
        let gates = gates();
        let user = UserId(2);
        let t = t0();
        assert!(gates.pass_spam(user, "hello", t)?);
        assert!(!gates.pass_spam(user, "hello", t + Duration::minutes(10))?);
        Ok(())
    }

    #[test]
    fn test_different_messages_earn() -> Result<()> {
        let gates = gates();
        let user = UserId(3);
        let mut t = t0();
        for text in ["one", "two", "three"] {
            assert!(gates.pass_spam(user, text, t)?);
            assert!(gates.pass_chat(user, t)?);
            t = t + Duration::seconds(30);
        }
        Ok(())
    }

    #[test]
    fn test_fast_messages_suppressed_without_recording() -> Result<()> {
        let gates = gates();
        let user = UserId(4);
        let t = t0();
        assert!(gates.pass_spam(user, "first", t)?);
        assert!(!gates.pass_spam(user, "second", t + Duration::seconds(1))?);
        // "second" was never recorded, so it is not a repeat later on
        assert!(gates.pass_spam(user, "second", t + Duration::seconds(5))?);
        Ok(())
    }

    #[test]
    fn test_salary_gate() -> Result<()> {
        let gates = gates();
        let user = UserId(5);
        let t = t0();
        assert!(gates.pass_salary(user, t)?);
        let window = Duration::hours(24);
        assert!(!gates.pass_salary(user, t + window - Duration::seconds(1))?);
        assert!(gates.pass_salary(user, t + window)?);
        Ok(())
    }

    #[test]
    fn test_daily_gate() -> Result<()> {
        let gate = DailyGate::new(Duration::hours(24));
        let user = UserId(6);
        let t = t0();
        assert_eq!(gate.claim(user, t)?, Claim::Granted);
        assert_eq!(
            gate.claim(user, t + Duration::hours(1))?,
            Claim::Wait(Duration::hours(23))
        );
        gate.release(user)?;
        assert_eq!(gate.claim(user, t + Duration::hours(1))?, Claim::Granted);
        Ok(())
    }

    #[test]
    fn test_daily_gate_boundary() -> Result<()> {
        let window = Duration::hours(24);
        let gate = DailyGate::new(window);
        let user = UserId(7);
        let t = t0();
        assert_eq!(gate.claim(user, t)?, Claim::Granted);
        assert_eq!(
            gate.claim(user, t + window - Duration::seconds(1))?,
            Claim::Wait(Duration::seconds(1))
        );
        assert_eq!(gate.claim(user, t + window)?, Claim::Granted);
        Ok(())
    }

    #[test]
    fn test_daily_reward_distribution() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let (mut jackpot, mut high, mut low) = (0, 0, 0);
        for _ in 0..10_000 {
            match roll_daily_reward(&mut rng) {
                200 => jackpot += 1,
                120..=180 => high += 1,
                20..=80 => low += 1,
                other => panic!("reward {other} out of range"),
            }
        }
        assert!((50..=150).contains(&jackpot), "jackpot {jackpot}");
        assert!((800..=1200).contains(&high), "high {high}");
        assert_eq!(jackpot + high + low, 10_000);
    }
}
