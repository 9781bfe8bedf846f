//! Participation badges.
//!
//! A badge unlocks once a user's participation count reaches its threshold.
//! The server uses [`award_badges`] when recording a vote; clients use
//! [`BadgeProgress::for_count`] to render what comes next.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub required_participation: u32,
}

/// Badge catalogue, ordered by threshold
pub const BADGES: [Badge; 5] = [
    Badge {
        id: "rookie",
        name: "Rookie",
        description: "Participated in your first badminton event",
        icon: "🏸",
        required_participation: 1,
    },
    Badge {
        id: "regular",
        name: "Regular Player",
        description: "Participated in 5 badminton events",
        icon: "🏆",
        required_participation: 5,
    },
    Badge {
        id: "enthusiast",
        name: "Badminton Enthusiast",
        description: "Participated in 10 badminton events",
        icon: "⭐",
        required_participation: 10,
    },
    Badge {
        id: "pro",
        name: "Badminton Pro",
        description: "Participated in 20 badminton events",
        icon: "🥇",
        required_participation: 20,
    },
    Badge {
        id: "legend",
        name: "Badminton Legend",
        description: "Participated in 50 badminton events",
        icon: "👑",
        required_participation: 50,
    },
];

pub fn find_badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|badge| badge.id == id)
}

/// Badges whose threshold is at or below `participation_count`, in catalogue order
pub fn earned_badges(participation_count: u32) -> Vec<&'static Badge> {
    BADGES
        .iter()
        .filter(|badge| participation_count >= badge.required_participation)
        .collect()
}

/// First badge not yet reached, or `None` once everything is earned
pub fn next_badge(participation_count: u32) -> Option<&'static Badge> {
    BADGES
        .iter()
        .find(|badge| participation_count < badge.required_participation)
}

/// Percentage of the way from the previous threshold to the next one.
///
/// Only reports 100 once every badge is earned; otherwise the value is
/// clamped to `0.0..=99.0`.
pub fn progress(participation_count: u32) -> f64 {
    let Some(next) = next_badge(participation_count) else {
        return 100.0;
    };

    let prev_requirement = BADGES
        .iter()
        .take_while(|badge| badge.id != next.id)
        .last()
        .map(|badge| badge.required_participation)
        .unwrap_or(0);

    let done = participation_count.saturating_sub(prev_requirement) as f64;
    let span = (next.required_participation - prev_requirement) as f64;

    (done / span * 100.0).clamp(0.0, 99.0)
}

/// Extend `current` with any badge ids unlocked at `participation_count`.
///
/// Existing ids are kept as they are, including ids that are not in the
/// catalogue. Badges are never taken away.
pub fn award_badges(current: &[String], participation_count: u32) -> Vec<String> {
    let mut badges = current.to_vec();

    for badge in earned_badges(participation_count) {
        if !badges.iter().any(|id| id == badge.id) {
            badges.push(badge.id.to_string());
        }
    }

    badges
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    pub participation_count: u32,
    pub earned: Vec<&'static Badge>,
    pub next: Option<&'static Badge>,
    pub progress: f64,
}

impl BadgeProgress {
    pub fn for_count(participation_count: u32) -> Self {
        Self {
            participation_count,
            earned: earned_badges(participation_count),
            next: next_badge(participation_count),
            progress: progress(participation_count),
        }
    }
}
