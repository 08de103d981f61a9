//! Date buckets for the conversation sidebar

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use serde::Serialize;
use std::fmt;

use crate::types::Conversation;

/// Header a conversation is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DateGroup {
    Today,
    Yesterday,
    /// Two to six days ago
    Weekday(Weekday),
    /// Anything older
    Date(NaiveDate),
}

impl DateGroup {
    /// Bucket `timestamp` relative to `now`, using `now`'s time zone for
    /// calendar days. Timestamps in the future count as today.
    pub fn classify<Tz: TimeZone>(timestamp: &DateTime<Utc>, now: &DateTime<Tz>) -> Self {
        let today = now.date_naive();
        let day = timestamp.with_timezone(&now.timezone()).date_naive();
        match (today - day).num_days() {
            i64::MIN..=0 => DateGroup::Today,
            1 => DateGroup::Yesterday,
            2..=6 => DateGroup::Weekday(day.weekday()),
            _ => DateGroup::Date(day),
        }
    }
}

impl fmt::Display for DateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateGroup::Today => f.write_str("Today"),
            DateGroup::Yesterday => f.write_str("Yesterday"),
            DateGroup::Weekday(day) => f.write_str(weekday_name(*day)),
            DateGroup::Date(date) => write!(f, "{}", date.format("%B %-d, %Y")),
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A sidebar section: header plus its conversations in list order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationGroup {
    pub group: DateGroup,
    pub conversations: Vec<Conversation>,
}

/// Partition an ordered conversation list into date sections.
///
/// Input order is preserved; a bucket that reappears later in the list
/// (only possible for an unsorted input) is merged into its first section.
pub fn group_conversations<Tz: TimeZone>(
    conversations: &[Conversation],
    now: &DateTime<Tz>,
) -> Vec<ConversationGroup> {
    let mut groups: Vec<ConversationGroup> = Vec::new();
    for conv in conversations {
        let group = DateGroup::classify(&conv.timestamp, now);
        match groups.iter_mut().find(|g| g.group == group) {
            Some(existing) => existing.conversations.push(conv.clone()),
            None => groups.push(ConversationGroup {
                group,
                conversations: vec![conv.clone()],
            }),
        }
    }
    groups
}
