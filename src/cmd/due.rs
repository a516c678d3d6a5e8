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

use std::io::Write;
use std::io::stdout;

use crate::collection::Collection;
use crate::engine::ReviewEngine;
use crate::error::Fallible;
use crate::store::CardStore;
use crate::types::category::Category;
use crate::types::timestamp::Timestamp;

/// Lists the cards due at `at` (an RFC 3339 timestamp), or now.
pub fn list_due(
    directory: Option<String>,
    category: Option<Category>,
    at: Option<String>,
) -> Fallible<()> {
    let now = match at {
        Some(at) => Timestamp::parse(&at)?,
        None => Timestamp::now(),
    };
    let coll = Collection::new(directory)?;
    let mut out = stdout().lock();
    write_due(&coll.engine, category, now, &mut out)
}

/// Prints the study queue, one card per line, in study order.
pub fn write_due<S: CardStore, W: Write>(
    engine: &ReviewEngine<S>,
    category: Option<Category>,
    now: Timestamp,
    out: &mut W,
) -> Fallible<()> {
    let queue = engine.study_queue(category, now)?;
    if queue.is_empty() {
        writeln!(out, "No cards due for review!")?;
        return Ok(());
    }
    for card in queue {
        writeln!(
            out,
            "{}  {}  {:<8}  {:<9}  {}",
            card.id().short(),
            card.confidence(),
            card.state().as_str(),
            card.category().as_str(),
            card.term()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::store::MemoryStore;
    use crate::types::card::NewCard;
    use crate::types::difficulty::Difficulty;
    use crate::types::grade::Grade;

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_nothing_due() -> Fallible<()> {
        let engine = ReviewEngine::new(MemoryStore::new());
        let mut out = Vec::new();
        write_due(&engine, None, t0(), &mut out)?;
        assert_eq!(String::from_utf8(out).unwrap(), "No cards due for review!\n");
        Ok(())
    }

    #[test]
    fn test_weakest_first() -> Fallible<()> {
        let mut engine = ReviewEngine::new(MemoryStore::new());
        let strong = engine.create_card(
            NewCard::new("Strong", "d", Category::Finance, Difficulty::Easy),
            t0(),
        )?;
        engine.create_card(
            NewCard::new("Weak", "d", Category::Marketing, Difficulty::Hard),
            t0(),
        )?;
        engine.grade(strong.id(), Grade::Easy, t0())?;
        let later = t0() + chrono::TimeDelta::days(3);
        let mut out = Vec::new();
        write_due(&engine, None, later, &mut out)?;
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Weak"));
        assert!(lines[0].contains("  new  "));
        assert!(lines[1].ends_with("Strong"));
        assert!(lines[1].contains("0.10  learning"));
        Ok(())
    }

    #[test]
    fn test_list_due_rejects_bad_time() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = Some(dir.path().display().to_string());
        let err = list_due(directory, None, Some("next tuesday".to_string())).unwrap_err();
        assert!(err.to_string().starts_with("error: invalid timestamp"));
        Ok(())
    }

    #[test]
    fn test_list_due_at_time() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = Some(dir.path().display().to_string());
        list_due(directory, None, Some("2025-06-01T12:00:00+02:00".to_string()))?;
        Ok(())
    }
}
