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

//! Deck files: TOML documents holding a list of cards to import.
//!
//! ```toml
//! [[cards]]
//! term = "Monthly Recurring Revenue (MRR)"
//! definition = "Predictable revenue expected every month from subscriptions."
//! example = "100 customers paying $50/month = $5,000 MRR"
//! category = "saas"
//! difficulty = "easy"
//! ```

use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Instant;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::engine::ReviewEngine;
use crate::engine::validate;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card::NewCard;
use crate::types::category::Category;
use crate::types::difficulty::Difficulty;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeckFile {
    cards: Vec<DeckCard>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeckCard {
    term: String,
    definition: String,
    #[serde(default)]
    example: String,
    category: Category,
    #[serde(default)]
    difficulty: Difficulty,
}

pub fn parse_deck(content: &str) -> Fallible<Vec<NewCard>> {
    let file: DeckFile = toml::from_str(content)?;
    let cards = file
        .cards
        .into_iter()
        .map(|card| NewCard {
            term: card.term,
            definition: card.definition,
            example: card.example,
            category: card.category,
            difficulty: card.difficulty,
        })
        .collect();
    Ok(cards)
}

/// Loads a deck file, or every `.toml` file under a directory in file name
/// order.
pub fn load_decks(path: &Path) -> Fallible<Vec<NewCard>> {
    if !path.exists() {
        return fail(format!("deck path does not exist: {}", path.display()));
    }
    log::debug!("Loading decks from {}...", path.display());
    let start = Instant::now();
    let mut cards = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            let content = read_to_string(path)?;
            let parsed = parse_deck(&content)
                .map_err(|e| ErrorReport::new(format!("{}: {}", path.display(), e.message())))?;
            cards.extend(parsed);
        }
    }
    let duration = start.elapsed().as_millis();
    log::debug!("Loaded {} cards in {duration}ms.", cards.len());
    Ok(cards)
}

pub struct ImportSummary {
    pub added: Vec<Card>,
    pub skipped: usize,
}

/// Creates the given cards, skipping any whose term already exists in the
/// same category. Every card is validated before anything is written.
pub fn import_cards<S: CardStore>(
    engine: &mut ReviewEngine<S>,
    cards: Vec<NewCard>,
    now: Timestamp,
) -> Fallible<ImportSummary> {
    for (index, card) in cards.iter().enumerate() {
        validate(card).map_err(|e| ErrorReport::new(format!("card #{}: {e}", index + 1)))?;
    }
    let mut seen: HashSet<(Category, String)> = engine
        .cards()?
        .iter()
        .map(|card| (card.category(), card.term().to_string()))
        .collect();
    let mut added = Vec::new();
    let mut skipped = 0;
    for card in cards {
        let key = (card.category, card.term.trim().to_string());
        if seen.contains(&key) {
            log::debug!("Skipping existing card: {}", key.1);
            skipped += 1;
            continue;
        }
        seen.insert(key);
        added.push(engine.create_card(card, now)?);
    }
    Ok(ImportSummary { added, skipped })
}
