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

use serde::Serialize;

use crate::collection::Collection;
use crate::engine::ReviewEngine;
use crate::error::Fallible;
use crate::store::CardStore;
use crate::types::card_id::CardId;
use crate::types::category::Category;
use crate::types::confidence::Confidence;
use crate::types::difficulty::Difficulty;
use crate::types::grade::Grade;
use crate::types::timestamp::Timestamp;

pub fn export_collection(directory: Option<String>) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let export: Export = get_export(&coll.engine)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    cards: Vec<CardExport>,
    reviews: Vec<ReviewExport>,
    progress: ProgressExport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardExport {
    id: CardId,
    term: String,
    definition: String,
    example: String,
    category: Category,
    difficulty: Difficulty,
    confidence: Confidence,
    last_reviewed: Timestamp,
    next_review: Timestamp,
    times_reviewed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewExport {
    card_id: CardId,
    reviewed_at: Timestamp,
    grade: Grade,
    confidence: Confidence,
    next_review: Timestamp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressExport {
    total_xp: u64,
    level: u64,
    achievements: Vec<AchievementExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementExport {
    id: &'static str,
    name: &'static str,
    unlocked_at: Timestamp,
}

fn get_export<S: CardStore>(engine: &ReviewEngine<S>) -> Fallible<Export> {
    let cards: Vec<CardExport> = engine
        .cards()?
        .into_iter()
        .map(|card| CardExport {
            id: card.id(),
            term: card.term().to_string(),
            definition: card.definition().to_string(),
            example: card.example().to_string(),
            category: card.category(),
            difficulty: card.difficulty(),
            confidence: card.confidence(),
            last_reviewed: card.last_reviewed(),
            next_review: card.next_review(),
            times_reviewed: card.times_reviewed(),
        })
        .collect();
    let reviews: Vec<ReviewExport> = engine
        .store()
        .reviews()?
        .into_iter()
        .map(|review| ReviewExport {
            card_id: review.card_id,
            reviewed_at: review.reviewed_at,
            grade: review.grade,
            confidence: review.confidence,
            next_review: review.next_review,
        })
        .collect();
    let progress = engine.store().load_progress()?;
    let progress = ProgressExport {
        total_xp: progress.total_xp(),
        level: progress.level(),
        achievements: progress
            .achievements()
            .iter()
            .map(|(achievement, unlocked_at)| AchievementExport {
                id: achievement.as_str(),
                name: achievement.name(),
                unlocked_at: *unlocked_at,
            })
            .collect(),
    };
    Ok(Export {
        cards,
        reviews,
        progress,
    })
}
