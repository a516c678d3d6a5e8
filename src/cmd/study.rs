// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::BufRead;
use std::io::Write;

use crate::collection::Collection;
use crate::engine::ReviewEngine;
use crate::error::Fallible;
use crate::session::Session;
use crate::session::SessionSummary;
use crate::store::CardStore;
use crate::types::category::Category;
use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

pub fn study(directory: Option<String>, category: Option<Category>) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();
    run_session(
        &mut coll.engine,
        category,
        &mut input,
        &mut output,
        Timestamp::now,
    )?;
    Ok(())
}

enum Command {
    Reveal,
    Grade(Grade),
    Undo,
    Quit,
}

fn parse_command(line: &str, revealed: bool) -> Option<Command> {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "" if !revealed => Some(Command::Reveal),
        "u" | "undo" => Some(Command::Undo),
        "q" | "quit" => Some(Command::Quit),
        "1" | "e" | "easy" if revealed => Some(Command::Grade(Grade::Easy)),
        "2" | "m" | "medium" if revealed => Some(Command::Grade(Grade::Medium)),
        "3" | "h" | "hard" if revealed => Some(Command::Grade(Grade::Hard)),
        _ => None,
    }
}

/// Runs a study session over the given input and output. Ends when the
/// queue is empty, the user quits, or the input is exhausted.
pub fn run_session<S, R, W, C>(
    engine: &mut ReviewEngine<S>,
    category: Option<Category>,
    input: &mut R,
    output: &mut W,
    clock: C,
) -> Fallible<SessionSummary>
where
    S: CardStore,
    R: BufRead,
    W: Write,
    C: Fn() -> Timestamp,
{
    let mut session = Session::start(engine, category, clock())?;
    if session.is_finished() {
        writeln!(output, "No cards due for review!")?;
        return Ok(session.summary());
    }
    let mut shown = false;
    loop {
        let card = match session.current() {
            Some(card) => card.clone(),
            None => break,
        };
        let revealed = session.is_revealed();
        if !shown {
            writeln!(output)?;
            writeln!(
                output,
                "[{}/{}] {} · {}",
                session.reviewed() + 1,
                session.total(),
                card.category().label(),
                card.difficulty().as_str()
            )?;
            writeln!(output, "Q: {}", card.term())?;
            shown = true;
        }
        if revealed {
            write!(output, "grade: [1] easy  [2] medium  [3] hard  [u] undo  [q] quit > ")?;
        } else {
            write!(output, "[enter] reveal  [u] undo  [q] quit > ")?;
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            session.end(clock());
            break;
        }
        match parse_command(&line, revealed) {
            Some(Command::Reveal) => {
                session.reveal()?;
                writeln!(output, "A: {}", card.definition())?;
                if !card.example().is_empty() {
                    writeln!(output, "e.g. {}", card.example())?;
                }
            }
            Some(Command::Grade(grade)) => match session.grade(engine, grade, clock()) {
                Ok(outcome) => {
                    writeln!(output, "+{} XP", outcome.xp)?;
                    if outcome.leveled_up {
                        let level = engine.store().load_progress()?.level();
                        writeln!(output, "Level up! You are now level {level}.")?;
                    }
                    for achievement in outcome.unlocked {
                        writeln!(
                            output,
                            "Achievement unlocked: {} (+{} XP)",
                            achievement.name(),
                            achievement.xp_reward()
                        )?;
                    }
                    shown = false;
                }
                Err(e) if e.validation().is_some() => {
                    writeln!(output, "{e}")?;
                }
                Err(e) => return Err(e),
            },
            Some(Command::Undo) => {
                if session.undo(engine)? {
                    writeln!(output, "Undid last grade.")?;
                    shown = false;
                } else {
                    writeln!(output, "Nothing to undo.")?;
                }
            }
            Some(Command::Quit) => {
                session.end(clock());
                break;
            }
            None => {
                writeln!(output, "Unrecognized input.")?;
            }
        }
    }
    let summary = session.summary();
    write_summary(&summary, session.remaining(), output)?;
    Ok(summary)
}

fn write_summary<W: Write>(summary: &SessionSummary, remaining: usize, output: &mut W) -> Fallible<()> {
    writeln!(output)?;
    writeln!(output, "Session complete!")?;
    writeln!(
        output,
        "Reviewed {} cards: {} easy, {} medium, {} hard.",
        summary.reviewed, summary.easy, summary.medium, summary.hard
    )?;
    writeln!(output, "+{} XP this session.", summary.xp_earned)?;
    if remaining > 0 {
        writeln!(output, "{remaining} cards left for later.")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryStore;
    use crate::types::card::NewCard;
    use crate::types::difficulty::Difficulty;

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    fn engine() -> Fallible<ReviewEngine<MemoryStore>> {
        let mut engine = ReviewEngine::new(MemoryStore::new());
        engine.create_card(
            NewCard::new(
                "Return on Ad Spend (ROAS)",
                "Revenue generated for every dollar spent on advertising.",
                Category::Marketing,
                Difficulty::Easy,
            )
            .with_example("Spend $1,000 on ads, generate $4,000 revenue = 4:1 ROAS"),
            t0(),
        )?;
        engine.create_card(
            NewCard::new("Burn Rate", "Cash spent per month.", Category::Finance, Difficulty::Medium),
            t0(),
        )?;
        Ok(engine)
    }

    fn run(engine: &mut ReviewEngine<MemoryStore>, input: &str) -> Fallible<(SessionSummary, String)> {
        let mut input = Cursor::new(input.as_bytes().to_vec());
        let mut output: Vec<u8> = Vec::new();
        let summary = run_session(engine, None, &mut input, &mut output, t0)?;
        Ok((summary, String::from_utf8_lossy(&output).to_string()))
    }

    #[test]
    fn test_nothing_due() -> Fallible<()> {
        let mut engine = ReviewEngine::new(MemoryStore::new());
        let (summary, output) = run(&mut engine, "")?;
        assert_eq!(summary.reviewed, 0);
        assert!(output.contains("No cards due for review!"));
        Ok(())
    }

    #[test]
    fn test_review_all() -> Fallible<()> {
        let mut engine = engine()?;
        let (summary, output) = run(&mut engine, "\n1\n\nh\n")?;
        assert_eq!(summary.reviewed, 2);
        assert_eq!(summary.easy, 1);
        assert_eq!(summary.hard, 1);
        assert_eq!(summary.xp_earned, 30);
        assert!(output.contains("[1/2] "));
        assert!(output.contains("Marketing · easy"));
        assert!(output.contains("e.g. Spend $1,000"));
        assert!(output.contains("Session complete!"));
        assert!(engine.study_queue(None, t0())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_grade_before_reveal_is_rejected() -> Fallible<()> {
        let mut engine = engine()?;
        let (summary, output) = run(&mut engine, "1\nq\n")?;
        assert_eq!(summary.reviewed, 0);
        assert!(output.contains("Unrecognized input."));
        Ok(())
    }

    #[test]
    fn test_quit_leaves_cards_due() -> Fallible<()> {
        let mut engine = engine()?;
        let (summary, output) = run(&mut engine, "\nmedium\nq\n")?;
        assert_eq!(summary.reviewed, 1);
        assert!(output.contains("1 cards left for later."));
        assert_eq!(engine.study_queue(None, t0())?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_undo() -> Fallible<()> {
        let mut engine = engine()?;
        let (summary, output) = run(&mut engine, "\ne\nu\n")?;
        assert!(output.contains("Undid last grade."));
        assert_eq!(summary.reviewed, 0);
        assert_eq!(summary.xp_earned, 0);
        assert_eq!(engine.study_queue(None, t0())?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_eof_ends_session() -> Fallible<()> {
        let mut engine = engine()?;
        let (summary, _) = run(&mut engine, "\n")?;
        assert_eq!(summary.reviewed, 0);
        assert!(summary.finished_at.is_some());
        Ok(())
    }
}
