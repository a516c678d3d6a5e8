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

use std::collections::HashMap;

use crate::error::Fallible;
use crate::error::fail;
use crate::progress::Progress;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::review::ReviewRecord;

/// Where the card collection lives. The review engine only ever talks to
/// this trait, so the same engine runs over an in-memory map in tests and
/// over SQLite in the binary.
pub trait CardStore {
    /// Insert a new card. If a card with the same id exists, returns an
    /// error.
    fn insert_card(&mut self, card: &Card) -> Fallible<()>;

    /// Get a card by id. If no such card exists, returns an error.
    fn get_card(&self, id: CardId) -> Fallible<Card>;

    /// All cards, in insertion order.
    fn all_cards(&self) -> Fallible<Vec<Card>>;

    fn card_count(&self) -> Fallible<usize>;

    /// Write a graded card and its review record as one unit. Fails, writing
    /// nothing, if the stored card no longer equals `previous`.
    fn record_review(
        &mut self,
        previous: &Card,
        card: &Card,
        review: &ReviewRecord,
    ) -> Fallible<()>;

    /// Undo a review: put the card back from `current` to `previous` and
    /// delete the most recent matching review record, as one unit. Fails,
    /// writing nothing, if the stored card no longer equals `current`.
    fn revert_review(
        &mut self,
        current: &Card,
        previous: &Card,
        review: &ReviewRecord,
    ) -> Fallible<()>;

    /// The review history, oldest first.
    fn reviews(&self) -> Fallible<Vec<ReviewRecord>>;

    fn review_count(&self) -> Fallible<usize>;

    fn load_progress(&self) -> Fallible<Progress>;

    fn save_progress(&mut self, progress: &Progress) -> Fallible<()>;
}

/// A store that lives and dies with the process.
#[derive(Default)]
pub struct MemoryStore {
    cards: Vec<Card>,
    index: HashMap<CardId, usize>,
    reviews: Vec<ReviewRecord>,
    progress: Progress,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: CardId) -> Fallible<usize> {
        match self.index.get(&id) {
            Some(slot) => Ok(*slot),
            None => fail(format!("no card with id {id}.")),
        }
    }

    /// The slot of `expected`, provided the stored card still equals it.
    fn slot_of(&self, expected: &Card) -> Fallible<usize> {
        let slot = self.slot(expected.id())?;
        if self.cards[slot] != *expected {
            return fail(format!("card {} has changed since it was read.", expected.id()));
        }
        Ok(slot)
    }
}

impl CardStore for MemoryStore {
    fn insert_card(&mut self, card: &Card) -> Fallible<()> {
        if self.index.contains_key(&card.id()) {
            return fail(format!("duplicate card id {}.", card.id()));
        }
        self.index.insert(card.id(), self.cards.len());
        self.cards.push(card.clone());
        Ok(())
    }

    fn get_card(&self, id: CardId) -> Fallible<Card> {
        let slot = self.slot(id)?;
        Ok(self.cards[slot].clone())
    }

    fn all_cards(&self) -> Fallible<Vec<Card>> {
        Ok(self.cards.clone())
    }

    fn card_count(&self) -> Fallible<usize> {
        Ok(self.cards.len())
    }

    fn record_review(
        &mut self,
        previous: &Card,
        card: &Card,
        review: &ReviewRecord,
    ) -> Fallible<()> {
        let slot = self.slot_of(previous)?;
        self.cards[slot] = card.clone();
        self.reviews.push(review.clone());
        Ok(())
    }

    fn revert_review(
        &mut self,
        current: &Card,
        previous: &Card,
        review: &ReviewRecord,
    ) -> Fallible<()> {
        let slot = self.slot_of(current)?;
        let position = self.reviews.iter().rposition(|r| {
            r.card_id == review.card_id && r.reviewed_at == review.reviewed_at
        });
        match position {
            Some(position) => {
                self.reviews.remove(position);
            }
            None => return fail("no such review to revert."),
        }
        self.cards[slot] = previous.clone();
        Ok(())
    }

    fn reviews(&self) -> Fallible<Vec<ReviewRecord>> {
        Ok(self.reviews.clone())
    }

    fn review_count(&self) -> Fallible<usize> {
        Ok(self.reviews.len())
    }

    fn load_progress(&self) -> Fallible<Progress> {
        Ok(self.progress.clone())
    }

    fn save_progress(&mut self, progress: &Progress) -> Fallible<()> {
        self.progress = progress.clone();
        Ok(())
    }
}
