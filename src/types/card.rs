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

use crate::types::card_id::CardId;
use crate::types::category::Category;
use crate::types::confidence::Confidence;
use crate::types::difficulty::Difficulty;
use crate::types::timestamp::Timestamp;

/// The user-supplied part of a card.
#[derive(Clone, PartialEq, Debug)]
pub struct NewCard {
    pub term: String,
    pub definition: String,
    pub example: String,
    pub category: Category,
    pub difficulty: Difficulty,
}

impl NewCard {
    pub fn new(
        term: impl Into<String>,
        definition: impl Into<String>,
        category: Category,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
            example: String::new(),
            category,
            difficulty,
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Card {
    id: CardId,
    /// The prompt.
    term: String,
    /// Shown after the card is flipped.
    definition: String,
    /// Optional illustration; empty when absent.
    example: String,
    category: Category,
    difficulty: Difficulty,
    confidence: Confidence,
    /// The most recent grading event, or creation time.
    last_reviewed: Timestamp,
    /// The card is not due before this instant.
    next_review: Timestamp,
    times_reviewed: usize,
}

/// Where a card is on its way to mastery.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardState {
    New,
    Learning,
    Mastered,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Mastered => "mastered",
        }
    }
}

impl Card {
    /// A fresh card, due immediately. The content is expected to be
    /// validated already.
    pub(crate) fn create(id: CardId, content: NewCard, now: Timestamp) -> Self {
        Self {
            id,
            term: content.term.trim().to_string(),
            definition: content.definition.trim().to_string(),
            example: content.example.trim().to_string(),
            category: content.category,
            difficulty: content.difficulty,
            confidence: Confidence::ZERO,
            last_reviewed: now,
            next_review: now,
            times_reviewed: 0,
        }
    }

    /// Rebuilds a card from storage.
    pub(crate) fn restore(
        id: CardId,
        content: NewCard,
        confidence: Confidence,
        last_reviewed: Timestamp,
        next_review: Timestamp,
        times_reviewed: usize,
    ) -> Self {
        Self {
            id,
            term: content.term,
            definition: content.definition,
            example: content.example,
            category: content.category,
            difficulty: content.difficulty,
            confidence,
            last_reviewed,
            next_review,
            times_reviewed,
        }
    }

    /// Records one grading event.
    pub(crate) fn record_grade(
        &mut self,
        confidence: Confidence,
        reviewed_at: Timestamp,
        next_review: Timestamp,
    ) {
        self.confidence = confidence;
        self.last_reviewed = reviewed_at;
        self.next_review = next_review;
        self.times_reviewed += 1;
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn last_reviewed(&self) -> Timestamp {
        self.last_reviewed
    }

    pub fn next_review(&self) -> Timestamp {
        self.next_review
    }

    pub fn times_reviewed(&self) -> usize {
        self.times_reviewed
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }

    pub fn state(&self) -> CardState {
        if self.times_reviewed == 0 {
            CardState::New
        } else if self.confidence.is_mastered() {
            CardState::Mastered
        } else {
            CardState::Learning
        }
    }

    #[cfg(test)]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Confidence::from_f64(confidence);
        self
    }
}
