use chrono::{DateTime, Utc};

/// Last message a user sent that made it past the spam filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamRecord {
    pub user_id: u64,
    pub last_text: String,
    pub last_time: DateTime<Utc>,
}

impl SpamRecord {
    #[inline]
    pub fn is_repeat(&self, text: &str) -> bool {
        self.last_text == text
    }
}
