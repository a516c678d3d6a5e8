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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::progress::CARD_CREATED_XP;
use crate::store::CardStore;
use crate::types::card::NewCard;
use crate::types::timestamp::Timestamp;

pub fn add_card(directory: Option<String>, content: NewCard) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let now = Timestamp::now();
    let card = coll.engine.create_card(content, now)?;
    let store = coll.engine.store_mut();
    let mut progress = store.load_progress()?;
    progress.add_xp(CARD_CREATED_XP);
    store.save_progress(&progress)?;
    println!("Flashcard created! +{CARD_CREATED_XP} XP");
    println!("{}", card.id());
    Ok(())
}
