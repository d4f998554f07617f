//! Domain types for todos.
//!
//! A todo is a short piece of text tagged with a [`Mood`]. It is created open
//! and may be completed exactly once; nothing else about it ever changes.
//!
//! Ids are assigned by the store, grow strictly with creation order, and double
//! as the pagination cursor: a page is "the newest [`PAGE_SIZE`] todos with an
//! id below the cursor".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of todos returned by one list call.
///
/// Fixed on the server; clients only ever send a cursor.
pub const PAGE_SIZE: usize = 10;

/// Store-assigned todo identifier
///
/// Serialized as a bare integer so the JSON shape stays `{"id": 42, ...}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    /// Wraps a raw id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TodoId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A mood label outside the closed [`Mood`] set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown mood: {0}")]
pub struct UnknownMood(pub String);

/// Weather-flavoured mood attached to every todo
///
/// The set is closed. Adding a value is a schema migration because the
/// database stores it as an enum type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    /// Clear sky
    Clear,
    /// Overcast
    Clouds,
    /// Light rain
    Drizzle,
    /// Rain
    Rain,
    /// Thunderstorm
    Thunder,
    /// Snow
    Snow,
    /// Windy
    Windy,
}

impl Mood {
    /// Every mood, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Clear,
        Self::Clouds,
        Self::Drizzle,
        Self::Rain,
        Self::Thunder,
        Self::Snow,
        Self::Windy,
    ];

    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Thunder => "Thunder",
            Self::Snow => "Snow",
            Self::Windy => "Windy",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// A single todo
///
/// Timestamps are whole seconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Store-assigned identifier (also the sort key)
    pub id: TodoId,
    /// Mood tag
    pub mood: Mood,
    /// Free-form, non-empty text
    pub text: String,
    /// When the todo was created
    pub created_at: i64,
    /// When the todo was completed, `None` while open
    pub completed_at: Option<i64>,
}

impl Todo {
    /// Creates an open todo
    #[must_use]
    pub const fn new(id: TodoId, mood: Mood, text: String, created_at: i64) -> Self {
        Self {
            id,
            mood,
            text,
            created_at,
            completed_at: None,
        }
    }

    /// Whether the todo has been completed
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Marks the todo as completed.
    ///
    /// A todo that is already completed keeps its original timestamp; the
    /// return value tells whether this call changed anything.
    pub fn complete(&mut self, completed_at: i64) -> bool {
        if self.completed_at.is_some() {
            return false;
        }
        self.completed_at = Some(completed_at);
        true
    }
}

/// Filter and cursor for one list call
///
/// Every part is optional and they combine with AND:
///
/// - `unaccomplished_only`: only todos with no `completed_at`
/// - `search_text`: case-insensitive substring of `text`; empty means no filter
/// - `cursor`: only ids strictly below this one
///
/// # Example
///
/// ```
/// use mood_todos_core::todo::{ListQuery, TodoId};
///
/// let query = ListQuery::new()
///     .unaccomplished_only(true)
///     .search("milk")
///     .before(Some(TodoId::new(40)));
///
/// assert!(query.has_search());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only open todos
    pub unaccomplished_only: bool,
    /// Substring to look for; empty disables the filter
    pub search_text: String,
    /// Exclusive upper bound on `id`
    pub cursor: Option<TodoId>,
}

impl ListQuery {
    /// First page, no filters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion filter
    #[must_use]
    pub const fn unaccomplished_only(mut self, only: bool) -> Self {
        self.unaccomplished_only = only;
        self
    }

    /// Sets the substring filter
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Sets the cursor
    #[must_use]
    pub const fn before(mut self, cursor: Option<TodoId>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Whether the substring filter is active
    #[must_use]
    pub fn has_search(&self) -> bool {
        !self.search_text.is_empty()
    }

    /// Whether `todo` passes every active filter
    ///
    /// This is the reference semantics for the list operation; the SQL built
    /// by the Postgres store must select exactly the same rows.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        if self.unaccomplished_only && todo.is_completed() {
            return false;
        }
        if self.cursor.is_some_and(|cursor| todo.id >= cursor) {
            return false;
        }
        if self.has_search() {
            let needle = self.search_text.to_lowercase();
            if !todo.text.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn todo(id: i64, text: &str) -> Todo {
        Todo::new(TodoId::new(id), Mood::Clear, text.to_string(), 1_700_000_000)
    }

    #[test]
    fn mood_round_trips_through_str() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
        }
    }

    #[test]
    fn unknown_mood_is_rejected() {
        let err = "Sunny".parse::<Mood>().unwrap_err();
        assert_eq!(err, UnknownMood("Sunny".to_string()));
        assert!("rain".parse::<Mood>().is_err());
    }

    #[test]
    fn todo_json_shape() {
        let mut item = Todo::new(TodoId::new(7), Mood::Rain, "bring umbrella".to_string(), 100);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "mood": "Rain",
                "text": "bring umbrella",
                "createdAt": 100,
                "completedAt": null
            })
        );

        item.complete(200);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["completedAt"], 200);
    }

    #[test]
    fn complete_keeps_first_timestamp() {
        let mut item = todo(1, "water plants");
        assert!(item.complete(10));
        assert!(!item.complete(20));
        assert_eq!(item.completed_at, Some(10));
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = ListQuery::new();
        assert!(query.matches(&todo(1, "")));
        assert!(query.matches(&todo(2, "anything")));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let query = ListQuery::new().search("WORD2");
        assert!(query.matches(&todo(1, "word1 word2 word3")));
        assert!(!query.matches(&todo(2, "word3 word4 word5")));
    }

    #[test]
    fn cursor_is_exclusive() {
        let query = ListQuery::new().before(Some(TodoId::new(6)));
        assert!(query.matches(&todo(5, "a")));
        assert!(!query.matches(&todo(6, "a")));
        assert!(!query.matches(&todo(7, "a")));
    }

    #[test]
    fn unaccomplished_only_skips_completed() {
        let query = ListQuery::new().unaccomplished_only(true);
        let mut done = todo(1, "done");
        done.complete(5);
        assert!(!query.matches(&done));
        assert!(query.matches(&todo(2, "open")));
    }

    #[test]
    fn filters_combine_with_and() {
        let query = ListQuery::new()
            .unaccomplished_only(true)
            .search("milk")
            .before(Some(TodoId::new(10)));

        assert!(query.matches(&todo(3, "Buy MILK")));
        assert!(!query.matches(&todo(11, "Buy milk")));
        assert!(!query.matches(&todo(3, "Buy bread")));
    }
}
