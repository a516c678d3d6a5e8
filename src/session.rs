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

use std::collections::VecDeque;

use crate::engine::Graded;
use crate::engine::ReviewEngine;
use crate::error::Fallible;
use crate::error::fail;
use crate::progress::Achievement;
use crate::progress::grade_xp;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::category::Category;
use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

/// One pass over a study queue. The queue is computed once when the session
/// starts and consumed from the front as cards are graded.
pub struct Session {
    started_at: Timestamp,
    queue: VecDeque<Card>,
    total: usize,
    reveal: bool,
    reviews: Vec<SessionReview>,
    xp_earned: u64,
    finished_at: Option<Timestamp>,
}

struct SessionReview {
    graded: Graded,
    /// XP credited for the grade itself, excluding achievements.
    xp: u64,
}

pub struct GradeOutcome {
    pub card: Card,
    pub xp: u64,
    pub leveled_up: bool,
    pub unlocked: Vec<Achievement>,
}

pub struct SessionSummary {
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub reviewed: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub xp_earned: u64,
}

impl Session {
    pub fn start<S: CardStore>(
        engine: &ReviewEngine<S>,
        category: Option<Category>,
        now: Timestamp,
    ) -> Fallible<Self> {
        let queue: VecDeque<Card> = engine.study_queue(category, now)?.into();
        let total = queue.len();
        log::debug!("Session started with {total} cards due.");
        Ok(Self {
            started_at: now,
            queue,
            total,
            reveal: false,
            reviews: Vec::new(),
            xp_earned: 0,
            finished_at: if total == 0 { Some(now) } else { None },
        })
    }

    pub fn current(&self) -> Option<&Card> {
        if self.is_finished() {
            None
        } else {
            self.queue.front()
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal
    }

    pub fn reveal(&mut self) -> Fallible<()> {
        if self.current().is_none() {
            return fail("session is finished.");
        }
        self.reveal = true;
        Ok(())
    }

    /// Grades the current card. The card must have been revealed first.
    pub fn grade<S: CardStore>(
        &mut self,
        engine: &mut ReviewEngine<S>,
        grade: Grade,
        now: Timestamp,
    ) -> Fallible<GradeOutcome> {
        let id = match self.current() {
            Some(card) => card.id(),
            None => return fail("session is finished."),
        };
        if !self.reveal {
            return fail("reveal the card before grading it.");
        }
        let graded = engine.grade(id, grade, now)?;
        self.queue.pop_front();
        self.reveal = false;
        let card = graded.card.clone();
        // The review is committed, so it is undoable from here on even if
        // the XP below cannot be saved.
        self.reviews.push(SessionReview { graded, xp: 0 });
        if self.queue.is_empty() {
            self.end(now);
        }

        let xp = grade_xp(grade);
        let store = engine.store_mut();
        let mut progress = store.load_progress()?;
        let leveled_up = progress.add_xp(xp);
        let unlocked = progress.check_achievements(store.review_count()?, now);
        store.save_progress(&progress)?;
        if let Some(last) = self.reviews.last_mut() {
            last.xp = xp;
        }
        let bonus: u64 = unlocked.iter().map(|a| a.xp_reward()).sum();
        self.xp_earned += xp + bonus;
        Ok(GradeOutcome {
            card,
            xp,
            leveled_up,
            unlocked,
        })
    }

    /// Takes back the last grade of this session and puts the card back at
    /// the front of the queue. Returns false if there is nothing to undo.
    /// XP from achievements is kept.
    pub fn undo<S: CardStore>(&mut self, engine: &mut ReviewEngine<S>) -> Fallible<bool> {
        let last = match self.reviews.last() {
            Some(last) => last,
            None => return Ok(false),
        };
        engine.undo(&last.graded)?;
        if last.xp > 0 {
            let store = engine.store_mut();
            let mut progress = store.load_progress()?;
            progress.remove_xp(last.xp);
            store.save_progress(&progress)?;
        }

        if let Some(last) = self.reviews.pop() {
            self.xp_earned = self.xp_earned.saturating_sub(last.xp);
            self.queue.push_front(last.graded.previous);
        }
        self.reveal = false;
        self.finished_at = None;
        Ok(true)
    }

    /// Ends the session early. Cards not yet graded stay due.
    pub fn end(&mut self, now: Timestamp) {
        if self.finished_at.is_none() {
            log::debug!("Session completed");
            self.finished_at = Some(now);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn reviewed(&self) -> usize {
        self.reviews.len()
    }

    pub fn summary(&self) -> SessionSummary {
        let count = |g: Grade| {
            self.reviews
                .iter()
                .filter(|r| r.graded.review.grade == g)
                .count()
        };
        SessionSummary {
            started_at: self.started_at,
            finished_at: self.finished_at,
            reviewed: self.reviews.len(),
            easy: count(Grade::Easy),
            medium: count(Grade::Medium),
            hard: count(Grade::Hard),
            xp_earned: self.xp_earned,
        }
    }
}
