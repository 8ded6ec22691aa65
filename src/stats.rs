use crate::config::{Track, TrackerConfig};
use crate::models::{
    CumulativePoint, DailyStats, StatsResponse, TrackStats, TrackSummary, TrackerDocument,
};
use chrono::{Datelike, Local, NaiveDate};

const IDEAL_80_RATIO: f64 = 0.8;

pub fn recompute_stats_now(config: &TrackerConfig, document: &TrackerDocument) -> StatsResponse {
    recompute_stats(config, document, Local::now().date_naive())
}

pub fn recompute_stats(
    config: &TrackerConfig,
    document: &TrackerDocument,
    today: NaiveDate,
) -> StatsResponse {
    let tracks = config
        .tracks
        .iter()
        .filter(|track| track.hours_per_day > 0.0)
        .map(|track| TrackSummary {
            track_id: track.id.clone(),
            name: track.name.clone(),
            stats: track_stats(config, track, document),
        })
        .collect();

    let today_day = config.day_of(today);

    StatsResponse {
        tracks,
        totals: total_stats(config, document),
        today: today_day.map(|day| daily_stats(config, document, day)),
        cumulative: cumulative_series(config, document).collect(),
        avoidance_debt: today_day.and_then(|day| avoidance_debt(config, document, day)),
    }
}

/// Target accrues on in-window days up to `target_end_day`; logged hours are
/// summed over the whole window.
pub fn track_stats(config: &TrackerConfig, track: &Track, document: &TrackerDocument) -> TrackStats {
    let mut total_target = 0.0;
    let mut total_logged = 0.0;

    for day in config.day_numbers() {
        if !track.in_window(day) {
            continue;
        }
        if track.accrues_target(day) {
            total_target += track.hours_per_day;
        }
        total_logged += document.logged_hours(&track.id, day);
    }

    TrackStats {
        total_target,
        total_logged,
        percentage: percentage(total_logged, total_target),
    }
}

pub fn total_stats(config: &TrackerConfig, document: &TrackerDocument) -> TrackStats {
    let (total_target, total_logged) = config
        .tracks
        .iter()
        .map(|track| track_stats(config, track, document))
        .fold((0.0, 0.0), |(target, logged), stats| {
            (target + stats.total_target, logged + stats.total_logged)
        });

    TrackStats {
        total_target,
        total_logged,
        percentage: percentage(total_logged, total_target),
    }
}

pub fn daily_stats(config: &TrackerConfig, document: &TrackerDocument, day: u32) -> DailyStats {
    let target = ideal_increment(config, day);
    let misc_hours = document.misc_hours(day);
    let logged = tracked_hours(config, document, day) + misc_hours;

    DailyStats {
        day,
        target,
        logged,
        misc_hours,
        percentage: percentage(logged, target),
    }
}

pub fn cumulative_series<'a>(
    config: &'a TrackerConfig,
    document: &'a TrackerDocument,
) -> CumulativeSeries<'a> {
    CumulativeSeries {
        config,
        document,
        next: Some(config.start_date),
        ideal: 0.0,
        actual: 0.0,
    }
}

/// Cumulative shortfall as of `day`; `None` when on or ahead of pace.
pub fn avoidance_debt(config: &TrackerConfig, document: &TrackerDocument, day: u32) -> Option<f64> {
    cumulative_series(config, document)
        .find(|point| point.day == day)
        .map(|point| point.ideal - point.actual)
        .filter(|debt| *debt > 0.0)
}

pub fn percentage(logged: f64, target: f64) -> u32 {
    if target <= 0.0 {
        return 0;
    }
    (logged / target * 100.0).round().max(0.0) as u32
}

#[derive(Debug, Clone)]
pub struct CumulativeSeries<'a> {
    config: &'a TrackerConfig,
    document: &'a TrackerDocument,
    next: Option<NaiveDate>,
    ideal: f64,
    actual: f64,
}

impl Iterator for CumulativeSeries<'_> {
    type Item = CumulativePoint;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.next.filter(|date| *date <= self.config.end_date)?;
        self.next = date.succ_opt();

        let day = date.day();
        self.ideal += ideal_increment(self.config, day);
        self.actual += tracked_hours(self.config, self.document, day) + self.document.misc_hours(day);

        Some(CumulativePoint {
            day,
            ideal: self.ideal,
            actual: self.actual,
            ideal_80: self.ideal * IDEAL_80_RATIO,
        })
    }
}

fn ideal_increment(config: &TrackerConfig, day: u32) -> f64 {
    config
        .tracks
        .iter()
        .filter(|track| track.accrues_target(day))
        .map(|track| track.hours_per_day)
        .sum()
}

fn tracked_hours(config: &TrackerConfig, document: &TrackerDocument, day: u32) -> f64 {
    config
        .tracks
        .iter()
        .map(|track| document.logged_hours(&track.id, day))
        .sum()
}
