mod blacklist;
mod spam;

pub use blacklist::BlacklistEntry;
pub use spam::SpamRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub user_id: u64,
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildConfig {
    pub guild_id: u64,
    pub points_channel: u64,
}
