use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Every date-valued task field is an instant in UTC.
pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "iso8601")]
    pub created_at: Timestamp,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub due_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>, // HH:MM, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_integer"
    )]
    pub recurrence_interval: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_goal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub goal_start_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub goal_end_date: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_timer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_duration: Option<u32>, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub timer_started: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub timer_ended: Option<Timestamp>,
}

impl Task {
    /// Create an incomplete plain task owned by `user_id`
    pub fn new(user_id: impl Into<String>, text: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: Self::generate_id(),
            text: text.into(),
            completed: false,
            created_at: now,
            user_id: user_id.into(),
            due_date: None,
            due_time: None,
            category: None,
            priority: None,
            is_recurring: None,
            recurrence_pattern: None,
            recurrence_interval: None,
            is_goal: None,
            goal_start_date: None,
            goal_end_date: None,
            has_timer: None,
            timer_duration: None,
            timer_started: None,
            timer_ended: None,
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn with_due_date(mut self, due: Option<Timestamp>) -> Self {
        self.due_date = due;
        self
    }

    pub fn recurring(mut self, pattern: RecurrencePattern, interval: u32) -> Self {
        self.is_recurring = Some(true);
        self.recurrence_pattern = Some(pattern);
        self.recurrence_interval = Some(i64::from(interval));
        self
    }

    pub fn goal(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.is_goal = Some(true);
        self.goal_start_date = Some(start);
        self.goal_end_date = Some(end);
        self
    }

    pub fn timer(mut self, minutes: u32) -> Self {
        self.has_timer = Some(true);
        self.timer_duration = Some(minutes);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring == Some(true)
    }

    pub fn is_goal(&self) -> bool {
        self.is_goal == Some(true)
    }

    pub fn has_timer(&self) -> bool {
        self.has_timer == Some(true)
    }

    /// None of the goal, recurring or timer flags are set
    pub fn is_regular(&self) -> bool {
        !self.is_goal() && !self.is_recurring() && !self.has_timer()
    }

    /// The stored interval when it is a positive integer, otherwise 1
    pub fn effective_interval(&self) -> u32 {
        match self.recurrence_interval {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

/// How a recurring task repeats. Unknown names loaded from storage are kept
/// as `Other` so they survive a save, and recur weekly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Custom,
    Other(String),
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Custom => "custom",
            RecurrencePattern::Other(name) => name,
        }
    }

    /// Human readable schedule, e.g. "Every 2 weeks"
    pub fn describe(&self, interval: u32) -> String {
        let unit = match self {
            RecurrencePattern::Daily | RecurrencePattern::Custom => "day",
            RecurrencePattern::Weekly => "week",
            RecurrencePattern::Monthly => "month",
            RecurrencePattern::Other(_) => return "Every week".to_string(),
        };
        if interval <= 1 {
            format!("Every {}", unit)
        } else {
            format!("Every {} {}s", interval, unit)
        }
    }
}

impl From<String> for RecurrencePattern {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "daily" => RecurrencePattern::Daily,
            "weekly" => RecurrencePattern::Weekly,
            "monthly" => RecurrencePattern::Monthly,
            "custom" => RecurrencePattern::Custom,
            _ => RecurrencePattern::Other(value),
        }
    }
}

impl From<RecurrencePattern> for String {
    fn from(value: RecurrencePattern) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard summary counts, computed at read time and never persisted
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub upcoming_tasks: usize,
    pub completed_this_week: usize,
    pub completion_rate: f64,
}

impl TaskStats {
    pub fn completion_rate_label(&self) -> String {
        format!("{:.1}%", self.completion_rate)
    }
}

/// Accepts integers, integral strings and floats; anything else reads as unset.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// ISO-8601 timestamps at the storage boundary
pub(crate) mod iso8601 {
    use super::Timestamp;
    use chrono::SecondsFormat;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::utils::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use super::Timestamp;
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|raw| {
                crate::utils::parse_timestamp(&raw)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
            })
            .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn serializes_camel_case_and_skips_unset_fields() {
        let task = Task::new("u1", "Water plants", at(2024, 1, 1)).with_due_date(Some(at(2024, 1, 2)));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["dueDate"], "2024-01-02T00:00:00Z");
        assert!(json.get("isGoal").is_none());
    }

    #[test]
    fn reads_browser_style_timestamps_and_loose_intervals() {
        let raw = r#"{
            "id": "1700000000000",
            "text": "Stretch",
            "completed": false,
            "createdAt": "2024-01-01T08:30:00.000Z",
            "userId": "abc",
            "dueDate": "2024-01-05",
            "isRecurring": true,
            "recurrencePattern": "fortnightly",
            "recurrenceInterval": "oops"
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap());
        assert_eq!(task.due_date, Some(at(2024, 1, 5)));
        assert_eq!(
            task.recurrence_pattern,
            Some(RecurrencePattern::Other("fortnightly".to_string()))
        );
        assert_eq!(task.recurrence_interval, None);
        assert_eq!(task.effective_interval(), 1);
    }

    #[test]
    fn rejects_malformed_timestamps() {
        let raw = r#"{"id":"1","text":"x","createdAt":"yesterday","userId":"u"}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
    }

    #[test]
    fn non_positive_interval_falls_back_to_one() {
        let mut task = Task::new("u", "t", at(2024, 1, 1)).recurring(RecurrencePattern::Daily, 3);
        assert_eq!(task.effective_interval(), 3);
        task.recurrence_interval = Some(0);
        assert_eq!(task.effective_interval(), 1);
        task.recurrence_interval = Some(-4);
        assert_eq!(task.effective_interval(), 1);
    }

    #[test]
    fn describes_schedules() {
        assert_eq!(RecurrencePattern::Daily.describe(1), "Every day");
        assert_eq!(RecurrencePattern::Weekly.describe(2), "Every 2 weeks");
        assert_eq!(RecurrencePattern::Custom.describe(10), "Every 10 days");
    }
}
