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

use std::path::PathBuf;

use crate::collection::Collection;
use crate::deck::import_cards;
use crate::deck::load_decks;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

pub fn import_decks(directory: Option<String>, path: Option<String>) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let path: PathBuf = match path {
        Some(path) => PathBuf::from(path),
        None => coll.decks_dir(),
    };
    let cards = load_decks(&path)?;
    let summary = import_cards(&mut coll.engine, cards, Timestamp::now())?;
    println!(
        "Imported {} cards ({} already present).",
        summary.added.len(),
        summary.skipped
    );
    Ok(())
}
