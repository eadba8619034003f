use super::queries;
use crate::errors::Error;
use log::{info, trace};

use rusqlite::{Connection, Result};

macro_rules! migration {
    ( $n:literal, $( $x:literal ),* ) => {
        paste::item! {
            fn [< migration_$n >] (conn: &Connection) -> Result<()> {
                trace!("running migration {}", $n);

                $(
                    conn.execute($x, [])?;
                )*
                queries::set_version(conn, $n)?;
                trace!("finished migration {}", $n);
                Ok(())
            }
        }
    };
}

migration![
    1,
    "CREATE TABLE accounts (
        user_id INTEGER PRIMARY KEY,
        points INTEGER NOT NULL DEFAULT 0
    );",
    "CREATE TABLE guild_config (
        guild_id INTEGER PRIMARY KEY,
        points_channel INTEGER NOT NULL
    );",
    "CREATE TABLE chat_cooldown (
        user_id INTEGER PRIMARY KEY,
        last_message_at NUMERIC NOT NULL
    );",
    "CREATE TABLE antispam (
        user_id INTEGER PRIMARY KEY,
        last_text TEXT NOT NULL,
        last_time NUMERIC NOT NULL
    );",
    "CREATE TABLE salary_cooldown (
        user_id INTEGER PRIMARY KEY,
        last_paid_at NUMERIC NOT NULL
    );",
    "CREATE TABLE blacklist (
        user_id INTEGER PRIMARY KEY,
        reason TEXT NOT NULL,
        expires_at NUMERIC NOT NULL
    );"
];

migration![
    2,
    // leaderboard queries order by points
    "CREATE INDEX idx_accounts_points ON accounts (points);",
    "ALTER TABLE blacklist ADD COLUMN created_at NUMERIC DEFAULT NULL;"
];

migration![
    3,
    // sqlite turns an overflowing integer sum into a REAL, reject it instead
    "CREATE TABLE accounts_checked (
        user_id INTEGER PRIMARY KEY,
        points INTEGER NOT NULL DEFAULT 0 CHECK (typeof(points) = 'integer')
    );",
    "INSERT INTO accounts_checked (user_id, points)
        SELECT user_id, CAST(points AS INTEGER) FROM accounts;",
    "DROP TABLE accounts;",
    "ALTER TABLE accounts_checked RENAME TO accounts;",
    "CREATE INDEX idx_accounts_points ON accounts (points);"
];

// be sure to increment this everytime a new migration is added
const FINAL_VER: u32 = 3;

pub fn migrate(conn: &mut Connection) -> crate::Result<()> {
    let ver = queries::get_version(conn)?;
    info!("database version is currently: {ver} with target ver {FINAL_VER}");
    if ver == FINAL_VER {
        return Ok(());
    }
    if ver > FINAL_VER {
        return Err(Error::UnsupportedVersion {
            found: ver,
            supported: FINAL_VER,
        });
    }

    let tx = conn.transaction()?;
    trace!("starting migration transaction");

    if ver < 1 {
        migration_1(&tx)?;
    }

    if ver < 2 {
        migration_2(&tx)?;
    }

    if ver < 3 {
        migration_3(&tx)?;
    }

    trace!("commiting migration transaction");
    tx.commit()?;
    info!("migration successful");
    Ok(())
}
