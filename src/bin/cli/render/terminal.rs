use chrono::{DateTime, Local, Utc};

use hanzi_srs::flashcards::{Card, CollectionStats};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in a color code when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// "[####------] 40%"
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (usize::from(progress.min(100)) * width) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress
    )
}

pub fn stats_line(stats: &CollectionStats, use_color: bool) -> String {
    let due = format!("{} due", stats.due_cards);
    let due = if stats.due_cards > 0 {
        paint(&due, Color::YELLOW, use_color)
    } else {
        due
    };
    format!(
        "{} cards, {}, {}",
        stats.total_cards,
        due,
        progress_bar(stats.progress, 20)
    )
}

/// Front of a card: the character alone
pub fn card_front(card: &Card, use_color: bool) -> String {
    paint(&card.character, Color::BOLD, use_color)
}

/// Back of a card: pronunciation and, when present, translation
pub fn card_back(card: &Card, use_color: bool) -> String {
    let pronunciation = paint(&card.pronunciation, Color::CYAN, use_color);
    if card.translation.is_empty() {
        pronunciation
    } else {
        format!("{}  {}", pronunciation, card.translation)
    }
}
