/// Milestone classification for presentation
///
/// Pure mappings from streak lengths and completion percentages to the tiers,
/// messages and growth stages shown to the user.

use serde::{Deserialize, Serialize};

/// Named streak thresholds used in user-facing messaging
pub const WEEK_MILESTONE: u32 = 7;
pub const MONTH_MILESTONE: u32 = 30;
pub const LEGEND_MILESTONE: u32 = 100;

/// Message tier for a streak length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneTier {
    /// Fewer than 7 days: just the count
    DayCount,
    /// 7 to 29 days
    Week,
    /// 30 to 99 days
    Month,
    /// 100 days or more
    Legend,
}

impl MilestoneTier {
    /// Motivational message for a streak of `streak_days` in this tier
    pub fn message(&self, streak_days: u32) -> String {
        match self {
            MilestoneTier::DayCount => match streak_days {
                0 => "Ready to start your streak! Every journey begins with a single step.".to_string(),
                1 => "Great start! One day down, keep the momentum going.".to_string(),
                n => format!("Nice work! {} days in a row. You're building a strong habit.", n),
            },
            MilestoneTier::Week => format!("Excellent! {} days strong. You're in the groove now!", streak_days),
            MilestoneTier::Month => format!("Incredible! {} days of consistency. You're a habit master!", streak_days),
            MilestoneTier::Legend => format!("Legendary! {} days of unwavering commitment. You're an inspiration!", streak_days),
        }
    }
}

/// Classify a streak length into its message tier
pub fn classify(streak_days: u32) -> MilestoneTier {
    match streak_days {
        0..=6 => MilestoneTier::DayCount,
        7..=29 => MilestoneTier::Week,
        30..=99 => MilestoneTier::Month,
        _ => MilestoneTier::Legend,
    }
}

/// Growth stage 1..=5 for a completion percentage
///
/// Bands are `<20, <40, <60, <80, >=80`. Values outside 0-100 are clamped and
/// NaN is treated as 0.
pub fn growth_stage(percentage: f64) -> u8 {
    let pct = if percentage.is_nan() { 0.0 } else { percentage.clamp(0.0, 100.0) };

    if pct < 20.0 {
        1
    } else if pct < 40.0 {
        2
    } else if pct < 60.0 {
        3
    } else if pct < 80.0 {
        4
    } else {
        5
    }
}

pub fn is_milestone(streak_days: u32, threshold: u32) -> bool {
    streak_days >= threshold
}

/// The highest named threshold reached, if any
pub fn highest_milestone(streak_days: u32) -> Option<u32> {
    [LEGEND_MILESTONE, MONTH_MILESTONE, WEEK_MILESTONE]
        .into_iter()
        .find(|threshold| is_milestone(streak_days, *threshold))
}
