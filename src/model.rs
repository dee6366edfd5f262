use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::BTreeSet;

pub const DB_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Db {
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub completions: Vec<HabitCompletion>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    /// Any value this build does not recognise. Never due.
    #[serde(other)]
    Unknown,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,
    /// Sunday = 0 .. Saturday = 6. Only meaningful for weekly habits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_days: Option<BTreeSet<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_message: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Local calendar day the habit was created on.
    pub fn created_date(&self) -> NaiveDate {
        self.created_date_in(&Local)
    }

    pub fn created_date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.created_at.with_timezone(tz).date_naive()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HabitCompletion {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

pub fn default_db() -> Db {
    Db {
        version: DB_VERSION,
        users: Vec::new(),
        session: None,
        habits: Vec::new(),
        completions: Vec::new(),
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
