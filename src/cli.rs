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

use clap::Parser;

use crate::cmd::add::add_card;
use crate::cmd::due::list_due;
use crate::cmd::export::export_collection;
use crate::cmd::import::import_decks;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::cmd::study::study;
use crate::error::Fallible;
use crate::types::card::NewCard;
use crate::types::category::Category;
use crate::types::difficulty::Difficulty;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Create a flashcard.
    Add {
        #[arg(long)]
        term: String,
        #[arg(long)]
        definition: String,
        /// A worked example shown after the definition.
        #[arg(long, default_value = "")]
        example: String,
        #[arg(long)]
        category: Category,
        #[arg(long, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Import cards from TOML deck files.
    Import {
        /// A deck file or a directory of deck files. Defaults to the collection's decks directory.
        #[arg(long)]
        path: Option<String>,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// List the cards due for review, in study order.
    Due {
        /// Only list cards in this category.
        #[arg(long)]
        category: Option<Category>,
        /// List what is due at this RFC 3339 time instead of now.
        #[arg(long)]
        at: Option<String>,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Study the cards due for review.
    Study {
        /// Only study cards in this category.
        #[arg(long)]
        category: Option<Category>,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print collection statistics.
    Stats {
        /// Output format.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Export cards, review history, and progress as JSON.
    Export {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Add {
            term,
            definition,
            example,
            category,
            difficulty,
            directory,
        } => {
            let content = NewCard::new(term, definition, category, difficulty).with_example(example);
            add_card(directory, content)
        }
        Command::Import { path, directory } => import_decks(directory, path),
        Command::Due {
            category,
            at,
            directory,
        } => list_due(directory, category, at),
        Command::Study {
            category,
            directory,
        } => study(directory, category),
        Command::Stats { format, directory } => print_stats(directory, format),
        Command::Export { directory } => export_collection(directory),
    }
}
