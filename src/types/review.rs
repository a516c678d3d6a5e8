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

use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::confidence::Confidence;
use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

/// One grading event, as kept in the review history.
#[derive(Clone, PartialEq, Debug)]
pub struct ReviewRecord {
    pub card_id: CardId,
    pub reviewed_at: Timestamp,
    pub grade: Grade,
    /// Confidence after the grade was applied.
    pub confidence: Confidence,
    pub next_review: Timestamp,
}

impl ReviewRecord {
    /// Builds the record for a card that has just been graded.
    pub fn of(card: &Card, grade: Grade) -> Self {
        Self {
            card_id: card.id(),
            reviewed_at: card.last_reviewed(),
            grade,
            confidence: card.confidence(),
            next_review: card.next_review(),
        }
    }
}
