use crate::connections::GetConnectionMutable;
use crate::queries;
use crate::structs::BlacklistEntry;
use crate::ReadOnlyDb;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::Result;
use serenity::model::id::{ChannelId, GuildId, UserId};

pub trait WriteableDb: GetConnectionMutable + ReadOnlyDb {
    #[inline]
    fn set_points(&self, user_id: UserId, points: i64) -> Result<()> {
        self.execute(
            "INSERT INTO accounts (user_id, points) VALUES ( ?1, ?2 )
            ON CONFLICT(user_id) DO UPDATE SET points=excluded.points",
            (*user_id.as_u64(), points),
        )
    }

    /// Applies `delta` in a single statement and returns the new balance, so
    /// two concurrent adds can never lose one another.
    #[inline]
    fn add_points(&self, user_id: UserId, delta: i64) -> Result<i64> {
        let points = self.get_connection().query_row(
            "INSERT INTO accounts (user_id, points) VALUES ( ?1, ?2 )
            ON CONFLICT(user_id) DO UPDATE SET points=accounts.points + excluded.points
            RETURNING points",
            (*user_id.as_u64(), delta),
            |row| row.get(0),
        )?;
        debug!("user {user_id} balance moved by {delta} to {points}");
        Ok(points)
    }

    #[inline]
    fn reset_points(&self) -> Result<usize> {
        let count = self.get_connection().execute("DELETE FROM accounts", [])?;
        info!("Reset {count} accounts");
        Ok(count)
    }

    #[inline]
    fn set_points_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<()> {
        self.execute(
            "INSERT INTO guild_config (guild_id, points_channel) VALUES ( ?1, ?2 )
            ON CONFLICT(guild_id) DO UPDATE SET points_channel=excluded.points_channel",
            (*guild_id.as_u64(), *channel_id.as_u64()),
        )
    }

    /// Returns true if the guild had a channel configured.
    #[inline]
    fn remove_points_channel(&self, guild_id: GuildId) -> Result<bool> {
        let count = self.get_connection().execute(
            "DELETE FROM guild_config WHERE guild_id=(?1)",
            [*guild_id.as_u64()],
        )?;
        Ok(count > 0)
    }

    #[inline]
    fn record_chat(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        self.execute(
            "INSERT INTO chat_cooldown (user_id, last_message_at) VALUES ( ?1, ?2 )
            ON CONFLICT(user_id) DO UPDATE SET last_message_at=excluded.last_message_at",
            (*user_id.as_u64(), at),
        )
    }

    #[inline]
    fn record_salary(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        self.execute(
            "INSERT INTO salary_cooldown (user_id, last_paid_at) VALUES ( ?1, ?2 )
            ON CONFLICT(user_id) DO UPDATE SET last_paid_at=excluded.last_paid_at",
            (*user_id.as_u64(), at),
        )
    }

    #[inline]
    fn record_spam(&self, user_id: UserId, text: &str, at: DateTime<Utc>) -> Result<()> {
        self.execute(
            "INSERT INTO antispam (user_id, last_text, last_time) VALUES ( ?1, ?2, ?3 )
            ON CONFLICT(user_id) DO UPDATE SET
                last_text=excluded.last_text,
                last_time=excluded.last_time",
            (*user_id.as_u64(), text, at),
        )
    }

    #[inline]
    fn add_blacklist(
        &self,
        user_id: UserId,
        reason: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.execute(
            "INSERT INTO blacklist (user_id, reason, expires_at, created_at)
            VALUES ( ?1, ?2, ?3, ?4 )
            ON CONFLICT(user_id) DO UPDATE SET
                reason=excluded.reason,
                expires_at=excluded.expires_at,
                created_at=excluded.created_at",
            (*user_id.as_u64(), reason, expires_at, created_at),
        )
    }

    /// Returns true if an entry was deleted.
    #[inline]
    fn remove_blacklist(&self, user_id: UserId) -> Result<bool> {
        let count = self
            .get_connection()
            .execute("DELETE FROM blacklist WHERE user_id=(?1)", [*user_id.as_u64()])?;
        Ok(count > 0)
    }

    /// Deletes every entry that ran out before `now` and hands them back, so
    /// each expiry is observed by exactly one caller.
    #[inline]
    fn take_expired_blacklist(&mut self, now: DateTime<Utc>) -> Result<Vec<BlacklistEntry>> {
        let tx = self.get_mutable_connection().transaction()?;
        let mut expired = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT user_id, reason, expires_at, created_at FROM blacklist",
            )?;
            let rows = stmt.query_map([], queries::blacklist_from_row)?;
            for row in rows {
                let entry = row?;
                if entry.is_expired(now) {
                    expired.push(entry);
                }
            }
        }

        for entry in &expired {
            tx.execute("DELETE FROM blacklist WHERE user_id=(?1)", [entry.user_id])?;
        }
        tx.commit()?;

        if !expired.is_empty() {
            info!("Removed {} expired blacklist entries", expired.len());
        }
        Ok(expired)
    }
}
