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

use std::collections::BTreeMap;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::Fallible;
use crate::error::fail;
use crate::progress::Achievement;
use crate::progress::Progress;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card::NewCard;
use crate::types::card_id::CardId;
use crate::types::review::ReviewRecord;
use crate::types::timestamp::Timestamp;

/// SQLite-backed card store.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let conn = Connection::open(database_path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Fallible<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }
}

impl CardStore for Database {
    fn insert_card(&mut self, card: &Card) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        let exists: bool = tx.query_row(
            "select exists(select 1 from cards where card_id = ?);",
            [card.id()],
            |row| row.get(0),
        )?;
        if exists {
            return fail(format!("duplicate card id {}.", card.id()));
        }
        let sql = "insert into cards (card_id, term, definition, example, category, difficulty, confidence, last_reviewed, next_review, times_reviewed) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
        tx.execute(
            sql,
            (
                card.id(),
                card.term(),
                card.definition(),
                card.example(),
                card.category(),
                card.difficulty(),
                card.confidence(),
                card.last_reviewed(),
                card.next_review(),
                card.times_reviewed() as i64,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_card(&self, id: CardId) -> Fallible<Card> {
        let sql = format!("select {CARD_COLUMNS} from cards where card_id = ?;");
        let card: Option<Card> = self
            .conn
            .query_row(&sql, [id], read_card)
            .optional()?;
        match card {
            Some(card) => Ok(card),
            None => fail(format!("no card with id {id}.")),
        }
    }

    fn all_cards(&self) -> Fallible<Vec<Card>> {
        let sql = format!("select {CARD_COLUMNS} from cards order by rowid;");
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map([], read_card)?
            .collect::<rusqlite::Result<Vec<Card>>>()?;
        Ok(cards)
    }

    fn card_count(&self) -> Fallible<usize> {
        let count: i64 = self
            .conn
            .query_row("select count(*) from cards;", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn record_review(
        &mut self,
        previous: &Card,
        card: &Card,
        review: &ReviewRecord,
    ) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        write_card_state(&tx, previous, card)?;
        let sql = "insert into reviews (card_id, reviewed_at, grade, confidence, next_review) values (?, ?, ?, ?, ?);";
        tx.execute(
            sql,
            (
                review.card_id,
                review.reviewed_at,
                review.grade,
                review.confidence,
                review.next_review,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn revert_review(
        &mut self,
        current: &Card,
        previous: &Card,
        review: &ReviewRecord,
    ) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        write_card_state(&tx, current, previous)?;
        let sql = "delete from reviews where review_id = (select max(review_id) from reviews where card_id = ? and reviewed_at = ?);";
        let deleted = tx.execute(sql, (review.card_id, review.reviewed_at))?;
        if deleted != 1 {
            return fail("no such review to revert.");
        }
        tx.commit()?;
        Ok(())
    }

    fn reviews(&self) -> Fallible<Vec<ReviewRecord>> {
        let sql = "select card_id, reviewed_at, grade, confidence, next_review from reviews order by review_id;";
        let mut stmt = self.conn.prepare(sql)?;
        let reviews = stmt
            .query_map([], |row| {
                Ok(ReviewRecord {
                    card_id: row.get(0)?,
                    reviewed_at: row.get(1)?,
                    grade: row.get(2)?,
                    confidence: row.get(3)?,
                    next_review: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<ReviewRecord>>>()?;
        Ok(reviews)
    }

    fn review_count(&self) -> Fallible<usize> {
        let count: i64 = self
            .conn
            .query_row("select count(*) from reviews;", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_progress(&self) -> Fallible<Progress> {
        let total_xp: Option<i64> = self
            .conn
            .query_row(
                "select total_xp from progress where progress_id = 0;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let mut achievements: BTreeMap<Achievement, Timestamp> = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("select achievement, unlocked_at from achievements;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            achievements.insert(row.get(0)?, row.get(1)?);
        }
        Ok(Progress::new(
            total_xp.unwrap_or(0) as u64,
            achievements,
        ))
    }

    fn save_progress(&mut self, progress: &Progress) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "insert into progress (progress_id, total_xp) values (0, ?) on conflict (progress_id) do update set total_xp = excluded.total_xp;",
            [progress.total_xp() as i64],
        )?;
        tx.execute("delete from achievements;", [])?;
        for (achievement, unlocked_at) in progress.achievements() {
            tx.execute(
                "insert into achievements (achievement, unlocked_at) values (?, ?);",
                (achievement, unlocked_at),
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

const CARD_COLUMNS: &str = "card_id, term, definition, example, category, difficulty, confidence, last_reviewed, next_review, times_reviewed";

fn read_card(row: &Row) -> rusqlite::Result<Card> {
    let times_reviewed: i64 = row.get(9)?;
    let times_reviewed = usize::try_from(times_reviewed)
        .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(9, times_reviewed))?;
    let content = NewCard {
        term: row.get(1)?,
        definition: row.get(2)?,
        example: row.get(3)?,
        category: row.get(4)?,
        difficulty: row.get(5)?,
    };
    Ok(Card::restore(
        row.get(0)?,
        content,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        times_reviewed,
    ))
}

/// Replaces the scheduling state of `expected` with that of `card`. The update
/// only matches if the row still holds `expected`, so a grade computed from a
/// stale read fails instead of overwriting a newer one.
fn write_card_state(tx: &Transaction, expected: &Card, card: &Card) -> Fallible<()> {
    let sql = "update cards set confidence = ?, last_reviewed = ?, next_review = ?, times_reviewed = ? where card_id = ? and confidence = ? and last_reviewed = ? and next_review = ? and times_reviewed = ?;";
    let updated = tx.execute(
        sql,
        (
            card.confidence(),
            card.last_reviewed(),
            card.next_review(),
            card.times_reviewed() as i64,
            expected.id(),
            expected.confidence(),
            expected.last_reviewed(),
            expected.next_review(),
            expected.times_reviewed() as i64,
        ),
    )?;
    if updated != 1 {
        return fail(format!("card {} has changed since it was read.", expected.id()));
    }
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
