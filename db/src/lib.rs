mod errors;
mod migrations;
mod queries;
mod read_only_db;
pub mod structs;
mod writeable_db;

pub use errors::{Error, Result};
pub use read_only_db::ReadOnlyDb;
pub use writeable_db::WriteableDb;

use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

pub(crate) mod connections {
    use rusqlite::{Connection, Params, Result};

    pub trait GetConnectionImmutable {
        fn get_connection(&self) -> &Connection;

        #[inline(always)]
        fn execute<P: Params>(&self, sql: &str, params: P) -> Result<()> {
            self.get_connection().execute(sql, params)?;
            Ok(())
        }
    }

    pub trait GetConnectionMutable {
        fn get_mutable_connection(&mut self) -> &mut Connection;
    }
}

pub struct WriteableConn {
    conn: Connection,
}

impl connections::GetConnectionImmutable for WriteableConn {
    #[inline]
    fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl connections::GetConnectionMutable for WriteableConn {
    #[inline]
    fn get_mutable_connection(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl ReadOnlyDb for WriteableConn {}

impl WriteableDb for WriteableConn {}

impl WriteableConn {
    #[inline]
    fn migrated(mut conn: Connection) -> Result<WriteableConn> {
        migrations::migrate(&mut conn)?;
        Ok(WriteableConn { conn })
    }
}

/// The one handle to the database. Opened at startup, shared by reference
/// (usually behind an `Arc`) and closed at shutdown. Every call takes the
/// connection lock for the duration of the closure, so each closure sees a
/// consistent connection and no two statements interleave.
pub struct Store {
    conn: Mutex<Option<WriteableConn>>,
}

impl Store {
    /// Opens (creating if needed) and migrates the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Store> {
        let path = path.as_ref();
        let conn = WriteableConn::migrated(Connection::open(path)?)?;
        info!("opened database at {}", path.display());
        Ok(Store::from_conn(conn))
    }

    pub fn open_in_memory() -> Result<Store> {
        let conn = WriteableConn::migrated(Connection::open_in_memory()?)?;
        Ok(Store::from_conn(conn))
    }

    /// A store with no connection, every call fails with
    /// [`Error::Unavailable`].
    pub const fn unavailable() -> Store {
        Store {
            conn: Mutex::new(None),
        }
    }

    fn from_conn(conn: WriteableConn) -> Store {
        Store {
            conn: Mutex::new(Some(conn)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.conn.lock().map_or(false, |conn| conn.is_some())
    }

    /// Drops the connection. Later calls fail with [`Error::Unavailable`].
    pub fn close(&self) {
        match self.conn.lock() {
            Ok(mut conn) => {
                if conn.take().is_some() {
                    info!("database connection closed");
                }
            }
            Err(_why) => warn!("Failed to acquire lock on db to close it"),
        }
    }

    #[inline]
    pub fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteableConn) -> rusqlite::Result<T>,
    {
        let mut guard = self.conn.lock().map_err(|_why| Error::Poisoned)?;
        match guard.as_mut() {
            Some(conn) => Ok(f(conn)?),
            None => Err(Error::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::connections::GetConnectionImmutable;
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serenity::model::id::{ChannelId, GuildId, UserId};

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_missing_account_is_zero() -> Result<()> {
        let store = store();
        assert_eq!(store.call(|db| db.get_points(UserId(42)))?, 0);
        Ok(())
    }

    #[test]
    fn test_add_points_applies_once() -> Result<()> {
        let store = store();
        let user = UserId(7);
        store.call(|db| db.set_points(user, 10))?;
        let new = store.call(|db| db.add_points(user, 5))?;
        assert_eq!(new, 15);
        assert_eq!(store.call(|db| db.get_points(user))?, 15);
        Ok(())
    }

    #[test]
    fn test_add_points_can_go_negative() -> Result<()> {
        let store = store();
        let user = UserId(7);
        assert_eq!(store.call(|db| db.add_points(user, -30))?, -30);
        Ok(())
    }

    #[test]
    fn test_overflowing_add_is_rejected() -> Result<()> {
        let store = store();
        let (rich, other) = (UserId(8), UserId(9));
        assert_eq!(store.call(|db| db.add_points(rich, i64::MAX))?, i64::MAX);
        assert!(store.call(|db| db.add_points(rich, 1)).is_err());

        // nothing was written, the row still reads back as an integer
        assert_eq!(store.call(|db| db.get_points(rich))?, i64::MAX);
        let kind: String = store.call(|db| {
            db.get_connection().query_row(
                "SELECT typeof(points) FROM accounts WHERE user_id=?1",
                [*rich.as_u64()],
                |row| row.get(0),
            )
        })?;
        assert_eq!(kind, "integer");

        assert_eq!(store.call(|db| db.add_points(rich, -1))?, i64::MAX - 1);
        store.call(|db| db.add_points(other, 5))?;
        assert_eq!(store.call(|db| db.get_top_accounts(5))?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_set_points_overwrites() -> Result<()> {
        let store = store();
        let user = UserId(1);
        store.call(|db| db.add_points(user, 100))?;
        store.call(|db| db.set_points(user, 3))?;
        assert_eq!(store.call(|db| db.get_points(user))?, 3);
        Ok(())
    }

    #[test]
    fn test_top_accounts_order_and_limit() -> Result<()> {
        let store = store();
        for (id, pts) in [(1, 5), (2, 50), (3, 20), (4, 50)] {
            store.call(|db| db.set_points(UserId(id), pts))?;
        }

        let top = store.call(|db| db.get_top_accounts(3))?;
        let ids: Vec<u64> = top.iter().map(|a| a.user_id).collect();
        assert_eq!(ids, vec![2, 4, 3]);
        assert_eq!(store.call(|db| db.count_accounts())?, 4);
        Ok(())
    }

    #[test]
    fn test_reset_points() -> Result<()> {
        let store = store();
        store.call(|db| db.set_points(UserId(1), 5))?;
        store.call(|db| db.set_points(UserId(2), 5))?;
        assert_eq!(store.call(|db| db.reset_points())?, 2);
        assert_eq!(store.call(|db| db.get_points(UserId(1)))?, 0);
        Ok(())
    }

    #[test]
    fn test_points_channel() -> Result<()> {
        let store = store();
        let guild = GuildId(9);
        assert_eq!(store.call(|db| db.get_points_channel(guild))?, None);
        store.call(|db| db.set_points_channel(guild, ChannelId(3)))?;
        store.call(|db| db.set_points_channel(guild, ChannelId(4)))?;
        assert_eq!(
            store.call(|db| db.get_points_channel(guild))?,
            Some(ChannelId(4))
        );
        assert_eq!(store.call(|db| db.get_guild_configs())?.len(), 1);
        assert!(store.call(|db| db.remove_points_channel(guild))?);
        assert!(!store.call(|db| db.remove_points_channel(guild))?);
        Ok(())
    }

    #[test]
    fn test_cooldown_timestamps_roundtrip() -> Result<()> {
        let store = store();
        let user = UserId(11);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        store.call(|db| db.record_chat(user, at))?;
        store.call(|db| db.record_salary(user, at + Duration::hours(1)))?;
        store.call(|db| db.record_spam(user, "hello", at))?;

        assert_eq!(store.call(|db| db.get_chat_cooldown(user))?, Some(at));
        assert_eq!(
            store.call(|db| db.get_salary_cooldown(user))?,
            Some(at + Duration::hours(1))
        );
        let spam = store.call(|db| db.get_spam_record(user))?.unwrap();
        assert_eq!(spam.last_text, "hello");
        assert_eq!(spam.last_time, at);
        Ok(())
    }

    #[test]
    fn test_blacklist_expiry_taken_once() -> Result<()> {
        let store = store();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store.call(|db| db.add_blacklist(UserId(5), "spam", start + Duration::days(1), start))?;
        store.call(|db| {
            db.add_blacklist(UserId(6), "alts", start + Duration::days(10), start)
        })?;

        let sweep_at = start + Duration::hours(25);
        let expired = store.call(|db| db.take_expired_blacklist(sweep_at))?;
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].user_id, 5);
        assert_eq!(expired[0].created_at, Some(start));

        assert!(store.call(|db| db.take_expired_blacklist(sweep_at))?.is_empty());
        assert_eq!(store.call(|db| db.get_blacklist())?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_blacklist_manual_removal() -> Result<()> {
        let store = store();
        let now = Utc::now();
        store.call(|db| db.add_blacklist(UserId(5), "spam", now + Duration::days(2), now))?;
        assert!(store.call(|db| db.get_blacklist_entry(UserId(5)))?.is_some());
        assert!(store.call(|db| db.remove_blacklist(UserId(5)))?);
        assert!(store.call(|db| db.get_blacklist_entry(UserId(5)))?.is_none());
        Ok(())
    }

    #[test]
    fn test_unavailable_store() {
        let store = Store::unavailable();
        assert!(!store.is_available());
        assert!(matches!(
            store.call(|db| db.get_points(UserId(1))),
            Err(Error::Unavailable)
        ));
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let store = store();
        assert!(store.is_available());
        store.close();
        assert!(matches!(
            store.call(|db| db.add_points(UserId(1), 1)),
            Err(Error::Unavailable)
        ));
    }
}
