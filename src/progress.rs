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

//! Experience points, levels and achievements. These ride alongside the
//! review engine: the command layer awards XP after the engine has done its
//! work, and the engine never looks at any of it.

use std::collections::BTreeMap;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;
use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

/// XP for creating a card.
pub const CARD_CREATED_XP: u64 = 25;

/// XP per level.
const LEVEL_SIZE: u64 = 1_000;

/// XP for reviewing a card. Harder recalls are worth more.
pub fn grade_xp(grade: Grade) -> u64 {
    match grade {
        Grade::Easy => 10,
        Grade::Medium => 15,
        Grade::Hard => 20,
    }
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum Achievement {
    FlashcardHero,
}

impl Achievement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Achievement::FlashcardHero => "flashcard-hero",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FlashcardHero => "Flashcard Hero",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FlashcardHero => "Review 50 flashcards",
        }
    }

    pub fn xp_reward(&self) -> u64 {
        match self {
            Achievement::FlashcardHero => 150,
        }
    }

    /// Whether the achievement is earned, given the number of grading
    /// events in the whole collection.
    fn earned(&self, total_reviews: usize) -> bool {
        match self {
            Achievement::FlashcardHero => total_reviews >= 50,
        }
    }
}

impl TryFrom<String> for Achievement {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "flashcard-hero" => Ok(Achievement::FlashcardHero),
            _ => fail(format!("invalid achievement: {value}")),
        }
    }
}

impl ToSql for Achievement {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Achievement {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Achievement::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct Progress {
    total_xp: u64,
    /// Unlocked achievements and when they were unlocked.
    achievements: BTreeMap<Achievement, Timestamp>,
}

impl Progress {
    pub fn new(total_xp: u64, achievements: BTreeMap<Achievement, Timestamp>) -> Self {
        Self {
            total_xp,
            achievements,
        }
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn level(&self) -> u64 {
        self.total_xp / LEVEL_SIZE + 1
    }

    pub fn achievements(&self) -> &BTreeMap<Achievement, Timestamp> {
        &self.achievements
    }

    /// Adds XP. Returns true if this crossed into a new level.
    pub fn add_xp(&mut self, amount: u64) -> bool {
        let before = self.level();
        self.total_xp += amount;
        let after = self.level();
        if after > before {
            log::debug!("Level up: {before} -> {after}");
        }
        after > before
    }

    pub fn remove_xp(&mut self, amount: u64) {
        self.total_xp = self.total_xp.saturating_sub(amount);
    }

    /// Unlocks every achievement earned at this review total and not held
    /// yet, crediting its reward. Returns the newly unlocked ones.
    pub fn check_achievements(&mut self, total_reviews: usize, now: Timestamp) -> Vec<Achievement> {
        let mut unlocked = Vec::new();
        for achievement in [Achievement::FlashcardHero] {
            if achievement.earned(total_reviews) && !self.achievements.contains_key(&achievement) {
                self.achievements.insert(achievement, now);
                self.add_xp(achievement.xp_reward());
                log::debug!("Achievement unlocked: {}", achievement.name());
                unlocked.push(achievement);
            }
        }
        unlocked
    }
}
