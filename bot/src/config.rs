//! Bot configuration, loaded from a TOML file at startup.
//!
//! Every table the bot works from (role thresholds, salaries, admin roles,
//! protected accounts) lives here rather than in code. The file is validated
//! once after loading, anything later can assume the invariants hold.

use crate::errors::{Error, Result};

use chrono::Duration;
use log::{info, warn};
use serde::Deserialize;
use serenity::model::id::{RoleId, UserId};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub channels: ChannelNames,
    #[serde(default)]
    pub cooldowns: Cooldowns,
    #[serde(default)]
    pub sweeps: Sweeps,
    /// Automatic roles, one per points threshold.
    #[serde(default)]
    pub roles: Vec<RoleThreshold>,
    /// Daily salary per staff role. When a member holds several the highest
    /// amount is paid.
    #[serde(default)]
    pub salaries: Vec<Salary>,
    #[serde(default)]
    pub admin_roles: Vec<u64>,
    /// Accounts whose points can never be changed.
    #[serde(default)]
    pub protected_users: Vec<u64>,
}

/// Channels are looked up by name in every guild.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelNames {
    #[serde(default = "default_log_channel")]
    pub log: String,
    #[serde(default = "default_blacklist_channel")]
    pub blacklist: String,
    #[serde(default = "default_alerts_channel")]
    pub alerts: String,
    #[serde(default = "default_promotions_channel")]
    pub promotions: String,
    #[serde(default = "default_news_channel")]
    pub news: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cooldowns {
    #[serde(default = "default_points_per_message")]
    pub points_per_message: i64,
    #[serde(default = "default_chat_secs")]
    pub chat_secs: i64,
    #[serde(default = "default_spam_secs")]
    pub spam_secs: i64,
    #[serde(default = "default_day_secs")]
    pub daily_secs: i64,
    #[serde(default = "default_day_secs")]
    pub salary_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sweeps {
    #[serde(default = "default_hour_secs")]
    pub salary_secs: u64,
    #[serde(default = "default_hour_secs")]
    pub blacklist_secs: u64,
    /// 0 disables the leaderboard broadcast.
    #[serde(default = "default_leaderboard_secs")]
    pub leaderboard_secs: u64,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleThreshold {
    pub points: i64,
    pub role: u64,
    /// Description shown by the ranks command.
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Salary {
    pub role: u64,
    pub amount: i64,
}

fn default_prefix() -> String {
    String::from("-")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./points.db3")
}

fn default_log_channel() -> String {
    String::from("staff-logs")
}

fn default_blacklist_channel() -> String {
    String::from("dismissal-and-blacklist")
}

fn default_alerts_channel() -> String {
    String::from("alerts")
}

fn default_promotions_channel() -> String {
    String::from("promotions")
}

fn default_news_channel() -> String {
    String::from("news")
}

const fn default_points_per_message() -> i64 {
    1
}

const fn default_chat_secs() -> i64 {
    30
}

const fn default_spam_secs() -> i64 {
    2
}

const fn default_day_secs() -> i64 {
    60 * 60 * 24
}

const fn default_hour_secs() -> u64 {
    60 * 60
}

const fn default_leaderboard_secs() -> u64 {
    180
}

const fn default_leaderboard_size() -> usize {
    5
}

impl Default for ChannelNames {
    fn default() -> Self {
        ChannelNames {
            log: default_log_channel(),
            blacklist: default_blacklist_channel(),
            alerts: default_alerts_channel(),
            promotions: default_promotions_channel(),
            news: default_news_channel(),
        }
    }
}

impl Default for Cooldowns {
    fn default() -> Self {
        Cooldowns {
            points_per_message: default_points_per_message(),
            chat_secs: default_chat_secs(),
            spam_secs: default_spam_secs(),
            daily_secs: default_day_secs(),
            salary_secs: default_day_secs(),
        }
    }
}

impl Default for Sweeps {
    fn default() -> Self {
        Sweeps {
            salary_secs: default_hour_secs(),
            blacklist_secs: default_hour_secs(),
            leaderboard_secs: default_leaderboard_secs(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: default_prefix(),
            database_path: default_database_path(),
            channels: ChannelNames::default(),
            cooldowns: Cooldowns::default(),
            sweeps: Sweeps::default(),
            roles: Vec::new(),
            salaries: Vec::new(),
            admin_roles: Vec::new(),
            protected_users: Vec::new(),
        }
    }
}

impl Cooldowns {
    pub fn chat(&self) -> Duration {
        Duration::seconds(self.chat_secs)
    }

    pub fn spam(&self) -> Duration {
        Duration::seconds(self.spam_secs)
    }

    pub fn daily(&self) -> Duration {
        Duration::seconds(self.daily_secs)
    }

    pub fn salary(&self) -> Duration {
        Duration::seconds(self.salary_secs)
    }
}

impl Config {
    /// Reads and validates the config at `path`. A missing file is not an
    /// error, the defaults are used instead.
    pub fn load(path: &Path) -> Result<Config> {
        let config = match fs::read_to_string(path) {
            Ok(text) => {
                info!("loading config from {}", path.display());
                Config::parse(&text)?
            }
            Err(why) if why.kind() == ErrorKind::NotFound => {
                warn!(
                    "config file {} not found, running with defaults and no automatic roles",
                    path.display()
                );
                Config::default()
            }
            Err(why) => return Err(why.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            return Err(Error::InvalidConfig(String::from("prefix must not be empty")));
        }

        let mut thresholds = HashSet::new();
        let mut threshold_roles = HashSet::new();
        for threshold in &self.roles {
            if !thresholds.insert(threshold.points) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate role threshold {}",
                    threshold.points
                )));
            }
            if !threshold_roles.insert(threshold.role) {
                return Err(Error::InvalidConfig(format!(
                    "role {} appears under more than one threshold",
                    threshold.role
                )));
            }
        }

        let mut salaried = HashSet::new();
        for salary in &self.salaries {
            if salary.amount < 0 {
                return Err(Error::InvalidConfig(format!(
                    "salary for role {} is negative",
                    salary.role
                )));
            }
            if !salaried.insert(salary.role) {
                return Err(Error::InvalidConfig(format!(
                    "role {} has more than one salary",
                    salary.role
                )));
            }
        }

        let c = &self.cooldowns;
        if [c.chat_secs, c.spam_secs, c.daily_secs, c.salary_secs]
            .iter()
            .any(|secs| *secs <= 0)
        {
            return Err(Error::InvalidConfig(String::from(
                "cooldown windows must be positive",
            )));
        }

        if self.sweeps.salary_secs == 0 || self.sweeps.blacklist_secs == 0 {
            return Err(Error::InvalidConfig(String::from(
                "salary and blacklist sweep intervals must be positive",
            )));
        }

        Ok(())
    }

    pub fn admin_roles(&self) -> HashSet<RoleId> {
        self.admin_roles.iter().map(|id| RoleId(*id)).collect()
    }

    pub fn protected_users(&self) -> HashSet<UserId> {
        self.protected_users.iter().map(|id| UserId(*id)).collect()
    }

    /// Salary for a role, if it has one.
    pub fn salary_for(&self, role: RoleId) -> Option<i64> {
        self.salaries
            .iter()
            .find(|s| s.role == *role.as_u64())
            .map(|s| s.amount)
    }
}

/// Turns the `DATABASE_URL` value into a path for the embedded store. Only
/// SQLite files are supported.
pub fn database_path_from_url(url: &str) -> Result<PathBuf> {
    let url = url.trim();
    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    {
        return Ok(PathBuf::from(path));
    }
    if url.contains("://") {
        return Err(Error::InvalidConfig(format!(
            "unsupported DATABASE_URL scheme in {url}, only sqlite files are supported"
        )));
    }
    Ok(PathBuf::from(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        prefix = "!"
        admin_roles = [10, 11]
        protected_users = [99]

        [channels]
        log = "audit"

        [cooldowns]
        chat_secs = 45

        [[roles]]
        points = 50
        role = 1
        task = "answer tickets"

        [[roles]]
        points = 150
        role = 2

        [[salaries]]
        role = 2
        amount = 75
    "#;

    #[test]
    fn test_parse_sample() {
        let config = Config::parse(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.prefix, "!");
        assert_eq!(config.channels.log, "audit");
        assert_eq!(config.channels.news, "news");
        assert_eq!(config.cooldowns.chat_secs, 45);
        assert_eq!(config.cooldowns.spam_secs, 2);
        assert_eq!(config.roles.len(), 2);
        assert_eq!(config.roles[0].task.as_deref(), Some("answer tickets"));
        assert_eq!(config.salary_for(RoleId(2)), Some(75));
        assert_eq!(config.salary_for(RoleId(1)), None);
        assert!(config.admin_roles().contains(&RoleId(11)));
        assert!(config.protected_users().contains(&UserId(99)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.prefix, "-");
        assert_eq!(config.cooldowns.chat(), Duration::seconds(30));
        assert_eq!(config.cooldowns.daily(), Duration::hours(24));
        assert_eq!(config.cooldowns.salary(), Duration::hours(24));
        assert_eq!(config.sweeps.leaderboard_secs, 180);
        assert_eq!(config.sweeps.leaderboard_size, 5);
    }

    #[test]
    fn test_duplicate_threshold_rejected() {
        let config = Config::parse(
            r#"
            [[roles]]
            points = 50
            role = 1
            [[roles]]
            points = 50
            role = 2
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_salary_rejected() {
        let config = Config::parse(
            r#"
            [[salaries]]
            role = 1
            amount = -5
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = Config::parse("[cooldowns]\nspam_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_url() {
        assert_eq!(
            database_path_from_url("sqlite://data/points.db3").unwrap(),
            PathBuf::from("data/points.db3")
        );
        assert_eq!(
            database_path_from_url("sqlite:points.db3").unwrap(),
            PathBuf::from("points.db3")
        );
        assert_eq!(
            database_path_from_url("/var/lib/points.db3").unwrap(),
            PathBuf::from("/var/lib/points.db3")
        );
        assert!(database_path_from_url("postgres://user@host/db").is_err());
    }
}
