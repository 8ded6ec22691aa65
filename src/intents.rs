use crate::config::TrackerConfig;
use crate::errors::AppError;
use crate::models::{hour_key, StoredDocument};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    IncrementHours {
        track_id: String,
        day: u32,
    },
    EditNote {
        track_id: String,
        day: u32,
        text: String,
    },
    EditHighlight {
        day: u32,
        text: String,
    },
    EditMisc {
        day: u32,
        #[serde(default)]
        time: String,
        #[serde(default)]
        comment: String,
    },
}

impl Intent {
    pub fn apply(&self, config: &TrackerConfig, document: &mut StoredDocument) -> Result<(), AppError> {
        match self {
            Self::IncrementHours { track_id, day } => {
                let track = config
                    .track(track_id)
                    .ok_or_else(|| AppError::invalid_intent(format!("unknown track {track_id}")))?;
                ensure_day(config, *day)?;
                if !track.is_active(*day) {
                    return Err(AppError::invalid_intent(format!(
                        "track {track_id} is not active on day {day}"
                    )));
                }

                let current = document.view().logged_hours(track_id, *day);
                let next = if current >= track.hours_per_day {
                    0.0
                } else {
                    current + config.features.increment_amount
                };
                document.set_entry("hours", hour_key(track_id, *day), Some(json!(next)));
            }
            Self::EditNote { track_id, day, text } => {
                if config.track(track_id).is_none() {
                    return Err(AppError::invalid_intent(format!("unknown track {track_id}")));
                }
                ensure_day(config, *day)?;
                document.set_entry("notes", hour_key(track_id, *day), non_blank(text).map(Value::from));
            }
            Self::EditHighlight { day, text } => {
                ensure_day(config, *day)?;
                document.set_entry("highlights", day.to_string(), non_blank(text).map(Value::from));
            }
            Self::EditMisc { day, time, comment } => {
                ensure_day(config, *day)?;
                let entry = (non_blank(time).is_some() || non_blank(comment).is_some())
                    .then(|| json!({ "time": time.trim(), "comment": comment }));
                document.set_entry("misc", day.to_string(), entry);
            }
        }
        Ok(())
    }
}

fn non_blank(text: &str) -> Option<&str> {
    (!text.trim().is_empty()).then_some(text)
}

fn ensure_day(config: &TrackerConfig, day: u32) -> Result<(), AppError> {
    if config.contains_day(day) {
        Ok(())
    } else {
        Err(AppError::invalid_intent(format!("day {day} is outside the tracked range")))
    }
}
