use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;

use hanzi_srs::commands::{answer_card, begin_session, AnswerInput, AnswerOutcome, CommandError, StudyStep};
use hanzi_srs::flashcards::SessionLimits;

use crate::app::App;
use crate::render::terminal::{card_back, card_front, paint, Color};

enum Reply {
    Answer(AnswerInput),
    Quit,
}

/// Print `text` and read one trimmed line; `None` on end of input
fn prompt(input: &mut impl BufRead, text: &str) -> Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read from stdin")? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn read_reply(input: &mut impl BufRead) -> Result<Reply> {
    loop {
        let Some(line) = prompt(&mut *input, "Correct? [y/n, q to quit] ")? else {
            return Ok(Reply::Quit);
        };
        if line.eq_ignore_ascii_case("q") {
            return Ok(Reply::Quit);
        }
        let answer = AnswerInput::Text(line);
        if answer.is_correct().is_ok() {
            return Ok(Reply::Answer(answer));
        }
        println!("Please answer y or n.");
    }
}

pub fn run(
    app: &App,
    deck: &str,
    max_new: Option<usize>,
    max_review: Option<usize>,
    use_color: bool,
) -> Result<()> {
    let collection = app.find_collection(deck)?;
    let defaults = app.config().session;
    let limits = SessionLimits {
        max_new: max_new.unwrap_or(defaults.max_new),
        max_review: max_review.unwrap_or(defaults.max_review),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut restarts = 0;

    let mut step = begin(app, collection.id, limits)?;
    loop {
        let (session, card, progress) = match step {
            StudyStep::Card {
                session,
                card,
                progress,
            } => (session, card, progress),
            StudyStep::Finished => {
                println!("Nothing left to study in '{}'.", collection.name);
                return Ok(());
            }
        };

        println!(
            "\n{} {}",
            paint(&format!("[{}/{}]", progress.done + 1, progress.total), Color::DIM, use_color),
            card_front(&card, use_color)
        );
        if prompt(&mut input, "Press Enter to reveal ")?.is_none() {
            return Ok(());
        }
        println!("    {}", card_back(&card, use_color));

        let answer = match read_reply(&mut input)? {
            Reply::Answer(answer) => answer,
            Reply::Quit => {
                println!("Stopped after {} of {} cards.", progress.done, progress.total);
                return Ok(());
            }
        };

        let outcome = {
            let storage = app.storage()?;
            answer_card(&storage, Some(session), &app.owner, card.id, Some(&answer), Utc::now())?
        };

        step = match outcome {
            AnswerOutcome::Next {
                answered,
                session,
                card,
                progress,
            } => {
                print_result(answered.consecutive_correct, use_color);
                StudyStep::Card {
                    session,
                    card,
                    progress,
                }
            }
            AnswerOutcome::Completed { answered } => {
                print_result(answered.consecutive_correct, use_color);
                println!("\n{}", paint("Session complete.", Color::GREEN, use_color));
                return Ok(());
            }
            AnswerOutcome::Restart { .. } => {
                restarts += 1;
                if restarts > 3 {
                    anyhow::bail!("Session keeps going out of sync; try again later");
                }
                log::warn!("Session out of sync, replanning");
                begin(app, collection.id, limits)?
            }
        };
    }
}

fn begin(app: &App, collection_id: uuid::Uuid, limits: SessionLimits) -> Result<StudyStep> {
    let storage = app.storage()?;
    begin_session(&storage, None, &app.owner, collection_id, limits, Utc::now())
        .map_err(|e: CommandError| anyhow::Error::new(e).context("Failed to start session"))
}

fn print_result(streak: u32, use_color: bool) {
    if streak == 0 {
        println!("{}", paint("Again tomorrow.", Color::RED, use_color));
    } else {
        println!(
            "{}",
            paint(&format!("Streak {}", streak), Color::GREEN, use_color)
        );
    }
}
