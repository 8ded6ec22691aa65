use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The persisted document exactly as the editor last saved it. Entries are
/// kept in their original JSON form; [`StoredDocument::view`] reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredDocument(Map<String, Value>);

impl Default for StoredDocument {
    fn default() -> Self {
        let sections = ["hours", "notes", "highlights", "misc"]
            .into_iter()
            .map(|name| (name.to_string(), Value::Object(Map::new())))
            .collect();
        Self(sections)
    }
}

impl StoredDocument {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn view(&self) -> TrackerDocument {
        let mut document = TrackerDocument::default();
        for (key, value) in self.section("hours") {
            document.hours.insert(key.clone(), hours_from_json(value));
        }
        for (key, value) in self.section("notes") {
            if let Some(text) = value.as_str() {
                document.notes.insert(key.clone(), text.to_string());
            }
        }
        for (key, value) in self.section("highlights") {
            if let (Ok(day), Some(text)) = (key.parse::<u32>(), value.as_str()) {
                document.highlights.insert(day, text.to_string());
            }
        }
        for (key, value) in self.section("misc") {
            let (Ok(day), Some(entry)) = (key.parse::<u32>(), value.as_object()) else {
                continue;
            };
            let time = match entry.get("time") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Number(number)) => number.to_string(),
                _ => String::new(),
            };
            let comment = entry
                .get("comment")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            document.misc.insert(day, MiscEntry { time, comment });
        }
        document
    }

    pub fn set_entry(&mut self, section: &str, key: String, value: Option<Value>) {
        let slot = self
            .0
            .entry(section)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(entries) = slot {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
    }

    fn section(&self, name: &str) -> impl Iterator<Item = (&String, &Value)> {
        self.0.get(name).and_then(Value::as_object).into_iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerDocument {
    pub hours: BTreeMap<String, f64>,
    pub notes: BTreeMap<String, String>,
    pub highlights: BTreeMap<u32, String>,
    pub misc: BTreeMap<u32, MiscEntry>,
}

impl TrackerDocument {
    pub fn logged_hours(&self, track_id: &str, day: u32) -> f64 {
        self.hours
            .get(&hour_key(track_id, day))
            .copied()
            .unwrap_or_default()
    }

    pub fn misc_hours(&self, day: u32) -> f64 {
        self.misc
            .get(&day)
            .map(|entry| parse_hours(&entry.time))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MiscEntry {
    pub time: String,
    pub comment: String,
}

pub fn hour_key(track_id: &str, day: u32) -> String {
    format!("{track_id}-{day}")
}

pub fn parse_hours(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

// anything that isn't a finite number, or text holding one, counts as zero
fn hours_from_json(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().filter(|hours| hours.is_finite()).unwrap_or_default(),
        Value::String(text) => parse_hours(text),
        _ => 0.0,
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    pub total_target: f64,
    pub total_logged: f64,
    pub percentage: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackSummary {
    pub track_id: String,
    pub name: String,
    #[serde(flatten)]
    pub stats: TrackStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub day: u32,
    pub target: f64,
    pub logged: f64,
    pub misc_hours: f64,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub day: u32,
    pub ideal: f64,
    pub actual: f64,
    pub ideal_80: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub tracks: Vec<TrackSummary>,
    pub totals: TrackStats,
    pub today: Option<DailyStats>,
    pub cumulative: Vec<CumulativePoint>,
    pub avoidance_debt: Option<f64>,
}
