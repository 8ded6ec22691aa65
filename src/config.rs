use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    env,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub features: Features,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_track_color")]
    pub color: String,
    #[serde(default)]
    pub hours_per_day: f64,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_end_day: Option<u32>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub accent: String,
    pub background: String,
    pub background_secondary: String,
    pub background_tertiary: String,
    pub border: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub text_muted: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: "#ff1493".into(),
            background: "#08090a".into(),
            background_secondary: "#0f1012".into(),
            background_tertiary: "#161719".into(),
            border: "#232527".into(),
            text_primary: "#f4f4f5".into(),
            text_secondary: "#a1a1aa".into(),
            text_muted: "#52525b".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub show_summary_cards: bool,
    pub show_total_progress: bool,
    pub increment_amount: f64,
    pub show_priority: bool,
    pub show_notes: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            show_summary_cards: true,
            show_total_progress: true,
            increment_amount: 0.5,
            show_priority: false,
            show_notes: true,
        }
    }
}

const MAX_DAY: u32 = 31;

fn default_track_color() -> String {
    "#a1a1aa".into()
}

impl Track {
    /// Inside `[start_day, start_day + duration)`; open-ended bounds are ignored.
    pub fn in_window(&self, day: u32) -> bool {
        let Some(start) = self.start_day else {
            return true;
        };
        day >= start
            && self
                .duration
                .is_none_or(|duration| start.checked_add(duration).is_none_or(|end| day < end))
    }

    pub fn is_active(&self, day: u32) -> bool {
        self.hours_per_day > 0.0 && self.in_window(day)
    }

    pub fn accrues_target(&self, day: u32) -> bool {
        self.in_window(day) && self.target_end_day.is_none_or(|end| day <= end)
    }
}

impl TrackerConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }

        let mut seen_days = HashSet::new();
        for day in self.day_numbers() {
            if !seen_days.insert(day) {
                return Err(ConfigError::Invalid(format!(
                    "day {day} appears twice in the date range"
                )));
            }
        }

        let mut seen_ids = HashSet::new();
        for track in &self.tracks {
            if track.id.is_empty() || track.id.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!("bad track id {:?}", track.id)));
            }
            if !seen_ids.insert(track.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate track id {}", track.id)));
            }
            if track.hours_per_day.is_nan() || track.hours_per_day < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "track {} has a negative hours_per_day",
                    track.id
                )));
            }
            let bounded = [
                ("start_day", track.start_day),
                ("target_end_day", track.target_end_day),
            ];
            for (field, value) in bounded {
                if value.is_some_and(|day| !(1..=MAX_DAY).contains(&day)) {
                    return Err(ConfigError::Invalid(format!(
                        "track {} has {field} outside 1..={MAX_DAY}",
                        track.id
                    )));
                }
            }
            if track.duration.is_some_and(|duration| duration > MAX_DAY) {
                return Err(ConfigError::Invalid(format!(
                    "track {} has a duration longer than {MAX_DAY} days",
                    track.id
                )));
            }
        }

        if self.features.increment_amount.is_nan() || self.features.increment_amount <= 0.0 {
            return Err(ConfigError::Invalid("increment_amount must be positive".into()));
        }

        Ok(())
    }

    pub fn day_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
            .map(|date| date.day())
    }

    pub fn contains_day(&self, day: u32) -> bool {
        self.day_numbers().any(|candidate| candidate == day)
    }

    pub fn day_of(&self, date: NaiveDate) -> Option<u32> {
        (self.start_date..=self.end_date)
            .contains(&date)
            .then(|| date.day())
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let track = |id: &str, name: &str, icon: &str, color: &str, hours_per_day: f64, priority: u8| Track {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
            hours_per_day,
            priority,
            notes: String::new(),
            start_day: None,
            duration: None,
            target_end_day: None,
            resources: Vec::new(),
        };
        let resource = |name: &str, url: &str| Resource {
            name: name.into(),
            url: url.into(),
        };

        let tracks = vec![
            Track {
                notes: "Complete the full neural networks series".into(),
                start_day: Some(6),
                duration: Some(26),
                target_end_day: Some(19),
                resources: vec![resource(
                    "YouTube Playlist",
                    "https://www.youtube.com/playlist?list=PLAqhIrjkxbuWI23v9cThsA9GvCAUhRvKZ",
                )],
                ..track("karpathy", "Karpathy's 0\u{2192}Hero", "\u{1f9e0}", "#10b981", 4.0, 1)
            },
            track("apply", "Research Outreach", "\u{1f4dd}", "#f97316", 2.0, 1),
            Track {
                notes: "Research project collaboration".into(),
                resources: vec![resource("Airtable", "https://airtable.com")],
                ..track("collab", "Project collaboration", "\u{1f91d}", "#eab308", 2.0, 2)
            },
            Track {
                notes: "Stay updated with AI research content".into(),
                resources: vec![
                    resource(
                        "Shaily99 Research",
                        "https://github.com/shaily99/advice?tab=readme-ov-file#research",
                    ),
                    resource("Neel Nanda", "https://x.com/NeelNanda5"),
                    resource("No Priors Podcast", "https://www.youtube.com/@NoPriorsPodcast"),
                    resource("Dwarkesh Patel", "https://www.youtube.com/@DwarkeshPatel"),
                    resource("Noam Brown", "https://www.youtube.com/watch?v=3PT82ivnc9Y"),
                ],
                ..track("ytresources", "Learning from Curated Content", "\u{1f4fa}", "#06b6d4", 2.0, 3)
            },
            Track {
                notes: "Build in public, share learnings".into(),
                ..track("posts", "Share Work & Updates", "\u{2728}", "#a855f7", 1.0, 4)
            },
            Track {
                notes: "RL and deep learning fundamentals".into(),
                resources: vec![
                    resource(
                        "RL Playlist",
                        "https://www.youtube.com/playlist?list=PLir0BWtR5vRp5dqaouyMU-oTSzaU5LK9r",
                    ),
                    resource(
                        "Berkeley CS",
                        "https://www.youtube.com/playlist?list=PLS01nW3RtgogGkm4UeqNeZLccW-OGc1fJ",
                    ),
                    resource(
                        "PyTorch Deep Learning",
                        "https://www.coursera.org/professional-certificates/pytorch-for-deep-learning",
                    ),
                    resource(
                        "LM from Scratch",
                        "https://www.youtube.com/playlist?list=PLoROMvodv4rOY23Y0BoGoBGgQ1zmU_MT_",
                    ),
                ],
                ..track("courses", "Courses", "\u{1f4da}", "#ec4899", 2.0, 2)
            },
            Track {
                notes: "Classic papers to read when time permits".into(),
                resources: vec![resource(
                    "Top 30 Papers",
                    "https://aman.ai/primers/ai/top-30-papers/",
                )],
                ..track("ilya", "Ilya's Reading List (to start later)", "\u{1f4c4}", "#6366f1", 0.0, 5)
            },
        ];

        Self {
            title: "Winter *Deep* Work".into(),
            subtitle: "January 6\u{2013}31, 2026 // Building foundations".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap_or(NaiveDate::MIN),
            tracks,
            theme: Theme::default(),
            features: Features::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub edit_password: Option<String>,
    pub secure_cookies: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);
        let data_path = env::var("TRACKER_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/tracker-data.json"));
        let config_path = env::var("TRACKER_CONFIG").ok().map(PathBuf::from);
        let edit_password = env::var("EDIT_PASSWORD")
            .ok()
            .filter(|value| !value.is_empty());
        let secure_cookies = env::var("APP_ENV").is_ok_and(|value| value == "production");

        Self {
            port,
            data_path,
            config_path,
            edit_password,
            secure_cookies,
        }
    }
}
