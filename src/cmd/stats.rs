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
use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::collection::Collection;
use crate::engine::ReviewEngine;
use crate::error::Fallible;
use crate::progress::Achievement;
use crate::store::CardStore;
use crate::types::category::Category;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(directory: Option<String>, format: StatsFormat) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let stats = get_stats(&coll.engine, Timestamp::now())?;
    match format {
        StatsFormat::Text => {
            print!("{}", render_text(&stats));
        }
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    total_cards: usize,
    mastered: usize,
    due_for_review: usize,
    /// Rounded to the nearest whole percent.
    average_confidence: u32,
    categories: BTreeMap<Category, usize>,
    total_xp: u64,
    level: u64,
    achievements: Vec<Achievement>,
}

pub fn get_stats<S: CardStore>(engine: &ReviewEngine<S>, now: Timestamp) -> Fallible<Stats> {
    let overview = engine.overview(now)?;
    let mut categories: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|c| (*c, 0)).collect();
    for card in engine.cards()? {
        *categories.entry(card.category()).or_insert(0) += 1;
    }
    let progress = engine.store().load_progress()?;
    Ok(Stats {
        total_cards: overview.total,
        mastered: overview.mastered,
        due_for_review: overview.due,
        average_confidence: (overview.average_confidence * 100.0).round() as u32,
        categories,
        total_xp: progress.total_xp(),
        level: progress.level(),
        achievements: progress.achievements().keys().copied().collect(),
    })
}

fn render_text(stats: &Stats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total Cards     {}\n", stats.total_cards));
    out.push_str(&format!("Mastered        {}\n", stats.mastered));
    out.push_str(&format!("Due for Review  {}\n", stats.due_for_review));
    out.push_str(&format!("Avg Confidence  {}%\n", stats.average_confidence));
    out.push('\n');
    for (category, count) in &stats.categories {
        out.push_str(&format!("{:<15} {}\n", category.label(), count));
    }
    out.push('\n');
    out.push_str(&format!("Level {} ({} XP)\n", stats.level, stats.total_xp));
    for achievement in &stats.achievements {
        out.push_str(&format!(
            "Achievement: {} ({})\n",
            achievement.name(),
            achievement.description()
        ));
    }
    out
}
