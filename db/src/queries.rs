use crate::structs::BlacklistEntry;
use rusqlite::{Connection, OptionalExtension, Result, Row};

#[inline(always)]
pub fn get_version(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT user_version FROM pragma_user_version;", [], |row| {
        row.get(0)
    })
}

#[inline(always)]
pub fn set_version(conn: &Connection, version: u32) -> Result<()> {
    conn.pragma_update(None, "user_version", version)
}

#[inline(always)]
pub fn get_points(conn: &Connection, user_id: u64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT points FROM accounts WHERE user_id=(?1)",
        [user_id],
        |row| row.get(0),
    )
    .optional()
}

#[inline(always)]
pub fn blacklist_from_row(row: &Row<'_>) -> Result<BlacklistEntry> {
    Ok(BlacklistEntry {
        user_id: row.get(0)?,
        reason: row.get(1)?,
        expires_at: row.get(2)?,
        created_at: row.get(3)?,
    })
}
