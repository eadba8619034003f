use lazy_static::lazy_static;
use regex::Regex;
use serenity::model::id::{ChannelId, RoleId, UserId};

lazy_static! {
    static ref COMMAND: Regex = Regex::new(r"(?s)^([A-Za-z]+)(?:\s+(.*))?$").unwrap();
    static ref USER: Regex = Regex::new(r"^(?:<@!?(\d+)>|(\d{15,20}))$").unwrap();
    static ref ROLE: Regex = Regex::new(r"^(?:<@&(\d+)>|(\d{15,20}))$").unwrap();
    static ref CHANNEL: Regex = Regex::new(r"^(?:<#(\d+)>|(\d{15,20}))$").unwrap();
}

/// Splits `content` into a lowercased command name and the rest of the line,
/// if it starts with `prefix`.
pub fn split_command<'a>(prefix: &str, content: &'a str) -> Option<(String, &'a str)> {
    let body = content.strip_prefix(prefix)?;
    let caps = COMMAND.captures(body)?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let rest = caps.get(2).map_or("", |m| m.as_str().trim());
    Some((name, rest))
}

/// First argument and whatever follows it. A double-quoted argument may hold
/// spaces.
pub fn next_arg(input: &str) -> (Option<&str>, &str) {
    let input = input.trim_start();
    if input.is_empty() {
        return (None, "");
    }

    if let Some(quoted) = input.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            return (Some(&quoted[..end]), quoted[end + 1..].trim_start());
        }
    }

    match input.find(char::is_whitespace) {
        Some(end) => (Some(&input[..end]), input[end..].trim_start()),
        None => (Some(input), ""),
    }
}

fn parse_id(re: &Regex, arg: &str) -> Option<u64> {
    let caps = re.captures(arg.trim())?;
    caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
}

pub fn parse_user(arg: &str) -> Option<UserId> {
    parse_id(&USER, arg).map(UserId)
}

pub fn parse_role(arg: &str) -> Option<RoleId> {
    parse_id(&ROLE, arg).map(RoleId)
}

pub fn parse_channel(arg: &str) -> Option<ChannelId> {
    parse_id(&CHANNEL, arg).map(ChannelId)
}

/// Whole number, positive or not. The caller decides what it accepts.
pub fn parse_amount(arg: &str) -> Option<i64> {
    arg.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("-", "-addpoints <@1> 5"),
            Some((String::from("addpoints"), "<@1> 5"))
        );
        assert_eq!(split_command("-", "-TOP"), Some((String::from("top"), "")));
        assert_eq!(
            split_command("-", "-news line one\nline two"),
            Some((String::from("news"), "line one\nline two"))
        );
    }

    #[test]
    fn test_split_command_rejects() {
        assert_eq!(split_command("-", "hello -top"), None);
        assert_eq!(split_command("-", "-"), None);
        assert_eq!(split_command("-", "- top"), None);
        assert_eq!(split_command("-", "-123"), None);
        assert_eq!(split_command("!", "-top"), None);
    }

    #[test]
    fn test_next_arg() {
        assert_eq!(next_arg("  one two  three"), (Some("one"), "two  three"));
        assert_eq!(next_arg("last"), (Some("last"), ""));
        assert_eq!(next_arg("   "), (None, ""));
        assert_eq!(
            next_arg("\"Server update\" we moved"),
            (Some("Server update"), "we moved")
        );
        assert_eq!(next_arg("\"unterminated title"), (Some("\"unterminated"), "title"));
    }

    #[test]
    fn test_parse_user() {
        assert_eq!(parse_user("<@123>"), Some(UserId(123)));
        assert_eq!(parse_user("<@!123>"), Some(UserId(123)));
        assert_eq!(
            parse_user("739749692308586526"),
            Some(UserId(739749692308586526))
        );
        assert_eq!(parse_user("<@&123>"), None);
        assert_eq!(parse_user("bob"), None);
        assert_eq!(parse_user("42"), None);
    }

    #[test]
    fn test_parse_role_and_channel() {
        assert_eq!(parse_role("<@&77>"), Some(RoleId(77)));
        assert_eq!(parse_role("<@77>"), None);
        assert_eq!(parse_channel("<#88>"), Some(ChannelId(88)));
        assert_eq!(parse_channel("#general"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50"), Some(50));
        assert_eq!(parse_amount("-5"), Some(-5));
        assert_eq!(parse_amount("ten"), None);
    }
}
