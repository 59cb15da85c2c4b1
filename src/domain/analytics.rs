//! Read-side projection of a session's links into dashboard statistics.
//!
//! Aggregation is a pure function over already-loaded data. It never mutates
//! storage and is recomputed on every call.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{Click, DeviceType, Link, LinkStatus};

/// Number of links shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;

/// Country codes that carry no location and are left out of `countryStats`.
const UNLOCATED_COUNTRIES: [&str; 3] = ["", "Unknown", "LOCAL"];

/// One owned link with its click log and visitor fingerprint set.
#[derive(Debug, Clone)]
pub struct LinkActivity {
    pub link: Link,
    pub clicks: Vec<Click>,
    pub visitors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStat {
    pub country_code: String,
    pub clicks: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStat {
    pub device: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: i64,
    pub short_url: String,
    pub full_short_url: String,
    pub original_url: String,
    pub total_clicks: i64,
    pub last_clicked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyClicks {
    pub date: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub daily: Vec<DailyClicks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_links: i64,
    pub total_clicks: i64,
    pub active_links: i64,
    pub unique_visitors: i64,
    pub country_stats: Vec<CountryStat>,
    pub device_stats: Vec<DeviceStat>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub timeline: Timeline,
}

/// Aggregates the activity of every link owned by one session.
///
/// - `activeLinks` counts the cached `status == active` flag.
/// - `uniqueVisitors` is the size of the union of all fingerprint sets.
/// - Country and device buckets are sorted by volume, then by key.
pub fn summarize(activity: &[LinkActivity]) -> AnalyticsSummary {
    let total_links = activity.len() as i64;
    let total_clicks = activity.iter().map(|a| a.link.total_clicks).sum();
    let active_links = activity
        .iter()
        .filter(|a| a.link.status == LinkStatus::Active)
        .count() as i64;

    let unique_visitors = activity
        .iter()
        .flat_map(|a| a.visitors.iter().map(String::as_str))
        .collect::<HashSet<_>>()
        .len() as i64;

    let clicks = || activity.iter().flat_map(|a| a.clicks.iter());

    AnalyticsSummary {
        total_links,
        total_clicks,
        active_links,
        unique_visitors,
        country_stats: country_stats(clicks()),
        device_stats: device_stats(clicks()),
        leaderboard: leaderboard(activity),
        timeline: Timeline {
            daily: daily_timeline(clicks()),
        },
    }
}

fn country_stats<'a>(clicks: impl Iterator<Item = &'a Click>) -> Vec<CountryStat> {
    let mut buckets: HashMap<&str, (i64, HashSet<&str>)> = HashMap::new();

    for click in clicks {
        let code = click.country_code.as_str();
        if UNLOCATED_COUNTRIES.contains(&code) {
            continue;
        }
        let entry = buckets.entry(code).or_default();
        entry.0 += 1;
        entry.1.insert(click.visitor_hash.as_str());
    }

    let mut stats: Vec<CountryStat> = buckets
        .into_iter()
        .map(|(code, (clicks, visitors))| CountryStat {
            country_code: code.to_string(),
            clicks,
            unique_visitors: visitors.len() as i64,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.clicks
            .cmp(&a.clicks)
            .then_with(|| a.country_code.cmp(&b.country_code))
    });
    stats
}

fn device_stats<'a>(clicks: impl Iterator<Item = &'a Click>) -> Vec<DeviceStat> {
    let mut buckets: HashMap<DeviceType, i64> = HashMap::new();

    for click in clicks {
        *buckets
            .entry(DeviceType::from_label(&click.device_type))
            .or_default() += 1;
    }

    let mut stats: Vec<DeviceStat> = buckets
        .into_iter()
        .map(|(device, count)| DeviceStat {
            device: device.display_name(),
            count,
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.device.cmp(b.device)));
    stats
}

fn leaderboard(activity: &[LinkActivity]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&LinkActivity> = activity.iter().collect();
    ranked.sort_by(|a, b| b.link.total_clicks.cmp(&a.link.total_clicks));

    ranked
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .map(|a| LeaderboardEntry {
            id: a.link.id,
            short_url: a.link.short_code.clone(),
            full_short_url: a.link.full_short_url.clone(),
            original_url: a.link.original_url.clone(),
            total_clicks: a.link.total_clicks,
            last_clicked: a.clicks.iter().map(|c| c.clicked_at).max(),
        })
        .collect()
}

fn daily_timeline<'a>(clicks: impl Iterator<Item = &'a Click>) -> Vec<DailyClicks> {
    let mut days: BTreeMap<String, i64> = BTreeMap::new();

    for click in clicks {
        *days
            .entry(click.clicked_at.format("%Y-%m-%d").to_string())
            .or_default() += 1;
    }

    days.into_iter()
        .map(|(date, clicks)| DailyClicks { date, clicks })
        .collect()
}
