//! Plain-text views of the board: event cards, member summaries with badge
//! progress, vote sheets and the audit log.

use crate::badges::rules::{find_badge, BadgeProgress};
use crate::models::event::Event;
use crate::models::log::LogEntry;
use crate::models::registration::VoteDetail;
use crate::models::user::User;
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Player names with their guest counts, e.g. `Kim +2, Lee`
pub fn render_players(voters: &[VoteDetail]) -> String {
    if voters.is_empty() {
        return "No players signed up yet".to_string();
    }

    voters
        .iter()
        .map(|voter| match voter.additional_players {
            0 => voter.user_name.clone(),
            n => format!("{} +{}", voter.user_name, n),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_event(event: &Event, voters: &[VoteDetail], signed_up: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", event.title);
    let _ = writeln!(out, "  {}", event.description);
    let _ = writeln!(out, "  When: {}", event.date);
    let _ = writeln!(out, "  Players ({}): {}", event.votes, render_players(voters));
    if signed_up {
        let _ = writeln!(out, "  [Signed Up]");
    }

    out
}

/// One line per event, with a marker for the ones `user` is signed up for
pub fn render_event_list(events: &[Event], user: Option<&User>) -> String {
    if events.is_empty() {
        return "No upcoming events\n".to_string();
    }

    let mut out = String::new();
    for event in events {
        let marker = match user {
            Some(user) if user.has_voted_for(event.id) => "*",
            _ => " ",
        };
        let _ = writeln!(
            out,
            "{} #{:<3} {:<32} {:<34} {:>3} players",
            marker, event.id, event.title, event.date, event.votes
        );
    }

    out
}

pub fn render_badge_progress(progress: &BadgeProgress) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Badges ({} participations)", progress.participation_count);

    if progress.earned.is_empty() {
        let _ = writeln!(out, "  No badges yet. Join events to earn your first badge!");
    }
    for badge in &progress.earned {
        let _ = writeln!(out, "  {} {}: {}", badge.icon, badge.name, badge.description);
    }

    match progress.next {
        Some(next) => {
            let _ = writeln!(
                out,
                "  Next badge: {} ({:.0}% complete, needs {} participations)",
                next.name, progress.progress, next.required_participation
            );
        }
        None => {
            let _ = writeln!(out, "  Every badge earned");
        }
    }

    out
}

/// Compact badge strip: at most three icons, then `+N`
pub fn render_badge_icons(user: &User) -> String {
    let icons: Vec<&str> = user
        .badges
        .iter()
        .filter_map(|id| find_badge(id))
        .map(|badge| badge.icon)
        .collect();

    match icons.len() {
        0 => "No badges yet".to_string(),
        n if n > 3 => format!("{} +{}", icons[..3].join(""), n - 3),
        _ => icons.join(""),
    }
}

pub fn render_user(user: &User) -> String {
    let mut out = String::new();

    let role = if user.is_admin { " (admin)" } else { "" };
    let _ = writeln!(out, "{}{} #{}", user.name, role, user.id);
    let _ = writeln!(out, "  Balance: {} points", user.balance);
    let _ = writeln!(out, "  Signed up for {} event(s)", user.votes.len());
    out.push_str(&render_badge_progress(&BadgeProgress::for_count(
        user.participation_count,
    )));

    out
}

/// Admin roster: id, name, participation, balance, badges
pub fn render_user_table(users: &[User]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:<4} {:<20} {:>6} {:>8}  Badges", "ID", "Name", "Games", "Balance");
    for user in users {
        let _ = writeln!(
            out,
            "{:<4} {:<20} {:>6} {:>8}  {}",
            user.id,
            user.name,
            user.participation_count,
            user.balance,
            render_badge_icons(user)
        );
    }

    out
}

pub fn render_vote_details(details: &[VoteDetail]) -> String {
    if details.is_empty() {
        return "No sign-ups\n".to_string();
    }

    let mut out = String::new();
    for detail in details {
        let paid = if detail.paid { "paid" } else { "unpaid" };
        let _ = writeln!(
            out,
            "{}  {:<20} {:<32} +{:<2} {}",
            detail.voted_at.format(TIMESTAMP_FORMAT),
            detail.user_name,
            detail.event_title,
            detail.additional_players,
            paid
        );
    }

    out
}

pub fn render_logs(logs: &[LogEntry]) -> String {
    let mut out = String::new();

    for entry in logs {
        let _ = writeln!(
            out,
            "[{}] {:<16} {:<18} {}",
            entry.timestamp.format(TIMESTAMP_FORMAT),
            entry.user,
            entry.action,
            entry.details
        );
    }

    out
}
