use crate::connections::GetConnectionImmutable;
use crate::queries;
use crate::structs::{Account, BlacklistEntry, GuildConfig, SpamRecord};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result};
use serenity::model::id::{ChannelId, GuildId, UserId};

pub trait ReadOnlyDb: GetConnectionImmutable {
    /// Balance for the user, 0 when they have never been credited.
    #[inline]
    fn get_points(&self, user_id: UserId) -> Result<i64> {
        Ok(queries::get_points(self.get_connection(), *user_id.as_u64())?.unwrap_or(0))
    }

    #[inline]
    fn get_top_accounts(&self, limit: usize) -> Result<Vec<Account>> {
        let mut stmt = self.get_connection().prepare(
            "SELECT user_id, points FROM accounts
            ORDER BY points desc, user_id asc
            LIMIT (?1)",
        )?;

        let rows = stmt.query_map([limit], |row| {
            Ok(Account {
                user_id: row.get(0)?,
                points: row.get(1)?,
            })
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?)
        }
        Ok(accounts)
    }

    #[inline]
    fn count_accounts(&self) -> Result<u64> {
        self.get_connection()
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
    }

    #[inline]
    fn get_points_channel(&self, guild_id: GuildId) -> Result<Option<ChannelId>> {
        self.get_connection()
            .query_row(
                "SELECT points_channel FROM guild_config WHERE guild_id=(?1)",
                [*guild_id.as_u64()],
                |row| Ok(ChannelId(row.get(0)?)),
            )
            .optional()
    }

    /// Every guild that has run setup.
    #[inline]
    fn get_guild_configs(&self) -> Result<Vec<GuildConfig>> {
        let mut stmt = self
            .get_connection()
            .prepare("SELECT guild_id, points_channel FROM guild_config")?;

        let rows = stmt.query_map([], |row| {
            Ok(GuildConfig {
                guild_id: row.get(0)?,
                points_channel: row.get(1)?,
            })
        })?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?)
        }
        Ok(configs)
    }

    #[inline]
    fn get_chat_cooldown(&self, user_id: UserId) -> Result<Option<DateTime<Utc>>> {
        self.get_connection()
            .query_row(
                "SELECT last_message_at FROM chat_cooldown WHERE user_id=(?1)",
                [*user_id.as_u64()],
                |row| row.get(0),
            )
            .optional()
    }

    #[inline]
    fn get_salary_cooldown(&self, user_id: UserId) -> Result<Option<DateTime<Utc>>> {
        self.get_connection()
            .query_row(
                "SELECT last_paid_at FROM salary_cooldown WHERE user_id=(?1)",
                [*user_id.as_u64()],
                |row| row.get(0),
            )
            .optional()
    }

    #[inline]
    fn get_spam_record(&self, user_id: UserId) -> Result<Option<SpamRecord>> {
        self.get_connection()
            .query_row(
                "SELECT user_id, last_text, last_time FROM antispam WHERE user_id=(?1)",
                [*user_id.as_u64()],
                |row| {
                    Ok(SpamRecord {
                        user_id: row.get(0)?,
                        last_text: row.get(1)?,
                        last_time: row.get(2)?,
                    })
                },
            )
            .optional()
    }

    #[inline]
    fn get_blacklist_entry(&self, user_id: UserId) -> Result<Option<BlacklistEntry>> {
        self.get_connection()
            .query_row(
                "SELECT user_id, reason, expires_at, created_at
                FROM blacklist WHERE user_id=(?1)",
                [*user_id.as_u64()],
                queries::blacklist_from_row,
            )
            .optional()
    }

    #[inline]
    fn get_blacklist(&self) -> Result<Vec<BlacklistEntry>> {
        let mut stmt = self.get_connection().prepare(
            "SELECT user_id, reason, expires_at, created_at
            FROM blacklist ORDER BY user_id",
        )?;

        let rows = stmt.query_map([], queries::blacklist_from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?)
        }
        Ok(entries)
    }
}
