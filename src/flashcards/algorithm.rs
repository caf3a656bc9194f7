//! Review scheduling
//!
//! A fixed, deterministic policy: every correct answer extends the streak
//! and schedules the card `streak²` days out, every incorrect answer resets
//! the streak and schedules the card for tomorrow. Intervals never exceed
//! [`MAX_INTERVAL_DAYS`].

use chrono::{DateTime, Duration, Utc};

use super::models::Card;

/// Hard cap on the review interval
pub const MAX_INTERVAL_DAYS: i64 = 60;

/// Scheduling fields after an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewResult {
    pub next_review: DateTime<Utc>,
    pub consecutive_correct: u32,
    pub seen: bool,
}

/// Interval in days for a streak of `consecutive_correct` answers
pub fn interval_days(consecutive_correct: u32) -> i64 {
    let streak = i64::from(consecutive_correct);
    streak.saturating_mul(streak).clamp(1, MAX_INTERVAL_DAYS)
}

/// Calculate the next review for a card answered at `now`
pub fn calculate_next_review(card: &Card, is_correct: bool, now: DateTime<Utc>) -> ReviewResult {
    let (consecutive_correct, interval) = if is_correct {
        let streak = card.consecutive_correct.saturating_add(1);
        (streak, interval_days(streak))
    } else {
        (0, 1)
    };

    ReviewResult {
        next_review: now + Duration::days(interval),
        consecutive_correct,
        seen: true,
    }
}

/// Apply an answer to a card, returning the updated card
pub fn update_performance(card: &Card, is_correct: bool, now: DateTime<Utc>) -> Card {
    let ReviewResult {
        next_review,
        consecutive_correct,
        seen,
    } = calculate_next_review(card, is_correct, now);

    Card {
        next_review,
        consecutive_correct,
        seen,
        ..card.clone()
    }
}

/// Map a textual correctness flag to a boolean.
///
/// Returns `None` for anything that is not a recognized truthy or falsy form.
pub fn parse_correctness(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}
