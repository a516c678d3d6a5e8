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

//! The review engine: which cards are due, in what order to study them, and
//! how a grade changes a card. Nothing here reads the clock; every operation
//! takes `now` from the caller.

use crate::error::Fallible;
use crate::error::ValidationError;
use crate::error::fail;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card::NewCard;
use crate::types::card_id::CardId;
use crate::types::category::Category;
use crate::types::grade::Grade;
use crate::types::review::ReviewRecord;
use crate::types::timestamp::Timestamp;

/// Checks that a card has both a term and a definition.
pub fn validate(content: &NewCard) -> Result<(), ValidationError> {
    if content.term.trim().is_empty() {
        return Err(ValidationError::BlankTerm);
    }
    if content.definition.trim().is_empty() {
        return Err(ValidationError::BlankDefinition);
    }
    Ok(())
}

/// The cards due at `now`, optionally restricted to one category, weakest
/// first. Ties go to the card reviewed longest ago, then to the smaller id,
/// so the order depends only on the inputs.
pub fn select_due_queue(cards: &[Card], category: Option<Category>, now: Timestamp) -> Vec<&Card> {
    let mut queue: Vec<&Card> = cards
        .iter()
        .filter(|card| category.is_none_or(|c| card.category() == c))
        .filter(|card| card.is_due(now))
        .collect();
    queue.sort_by(|a, b| {
        a.confidence()
            .cmp(&b.confidence())
            .then(a.last_reviewed().cmp(&b.last_reviewed()))
            .then(a.id().cmp(&b.id()))
    });
    queue
}

/// Applies a grade to a card in place. On error the card is untouched.
pub fn grade_review(card: &mut Card, grade: Grade, now: Timestamp) -> Result<(), ValidationError> {
    if now < card.last_reviewed() {
        return Err(ValidationError::TimeTravel {
            last_reviewed: card.last_reviewed(),
            now,
        });
    }
    let next_review = match now.checked_add(grade.interval()) {
        Some(next_review) => next_review,
        None => return Err(ValidationError::ScheduleOverflow { now }),
    };
    let confidence = card.confidence().shift(grade.confidence_delta());
    card.record_grade(confidence, now, next_review);
    Ok(())
}

pub fn mastered_count(cards: &[Card]) -> usize {
    cards
        .iter()
        .filter(|card| card.confidence().is_mastered())
        .count()
}

pub fn due_count(cards: &[Card], now: Timestamp) -> usize {
    cards.iter().filter(|card| card.is_due(now)).count()
}

/// Mean confidence, or zero for an empty collection.
pub fn average_confidence(cards: &[Card]) -> f64 {
    if cards.is_empty() {
        return 0.0;
    }
    let sum: f64 = cards.iter().map(|card| card.confidence().value()).sum();
    sum / cards.len() as f64
}

/// The outcome of grading a card through the engine. Holds what is needed
/// to undo it.
#[derive(Clone, Debug)]
pub struct Graded {
    pub previous: Card,
    pub card: Card,
    pub review: ReviewRecord,
}

/// Headline numbers for the dashboard.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Overview {
    pub total: usize,
    pub mastered: usize,
    pub due: usize,
    pub average_confidence: f64,
}

pub struct ReviewEngine<S: CardStore> {
    store: S,
}

impl<S: CardStore> ReviewEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Validates and inserts a new card, due immediately.
    pub fn create_card(&mut self, content: NewCard, now: Timestamp) -> Fallible<Card> {
        validate(&content)?;
        let sequence = self.store.card_count()?;
        let id = CardId::derive(&content, now, sequence);
        let card = Card::create(id, content, now);
        self.store.insert_card(&card)?;
        log::debug!(
            "Created card {} ({}): {}",
            id.short(),
            card.category(),
            card.term()
        );
        Ok(card)
    }

    pub fn cards(&self) -> Fallible<Vec<Card>> {
        self.store.all_cards()
    }

    /// A fresh study queue. Calling this again with the same collection and
    /// arguments gives the same queue.
    pub fn study_queue(&self, category: Option<Category>, now: Timestamp) -> Fallible<Vec<Card>> {
        let cards = self.store.all_cards()?;
        let queue = select_due_queue(&cards, category, now)
            .into_iter()
            .cloned()
            .collect();
        Ok(queue)
    }

    /// Grades a card and persists the result.
    pub fn grade(&mut self, id: CardId, grade: Grade, now: Timestamp) -> Fallible<Graded> {
        let previous = self.store.get_card(id)?;
        let mut card = previous.clone();
        grade_review(&mut card, grade, now)?;
        let review = ReviewRecord::of(&card, grade);
        self.store.record_review(&previous, &card, &review)?;
        log::debug!(
            "{} {} C={} next={}",
            id.short(),
            grade.as_str(),
            card.confidence(),
            card.next_review()
        );
        Ok(Graded {
            previous,
            card,
            review,
        })
    }

    /// Reverts a grade. Fails if the card has been graded again since.
    pub fn undo(&mut self, graded: &Graded) -> Fallible<()> {
        let current = self.store.get_card(graded.card.id())?;
        if current != graded.card {
            return fail("card has changed since it was graded.");
        }
        self.store
            .revert_review(&graded.card, &graded.previous, &graded.review)?;
        log::debug!("Reverted review of {}", graded.card.id().short());
        Ok(())
    }

    pub fn overview(&self, now: Timestamp) -> Fallible<Overview> {
        let cards = self.store.all_cards()?;
        Ok(Overview {
            total: cards.len(),
            mastered: mastered_count(&cards),
            due: due_count(&cards, now),
            average_confidence: average_confidence(&cards),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryStore;
    use crate::types::card::CardState;
    use crate::types::confidence::Confidence;
    use crate::types::difficulty::Difficulty;

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    fn content(term: &str, category: Category) -> NewCard {
        NewCard::new(term, "a definition", category, Difficulty::Medium)
    }

    fn engine() -> ReviewEngine<MemoryStore> {
        ReviewEngine::new(MemoryStore::new())
    }

    fn card_at(term: &str, confidence: f64, at: Timestamp) -> Card {
        let id = CardId::derive(&content(term, Category::Finance), at, 0);
        Card::create(id, content(term, Category::Finance), at).with_confidence(confidence)
    }

    #[test]
    fn test_create_card() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(
            NewCard::new(
                "Customer Lifetime Value (CLV)",
                "The total revenue a business can expect from a customer.",
                Category::Finance,
                Difficulty::Medium,
            )
            .with_example("$50/month for 24 months = $1,200"),
            t0(),
        )?;
        assert_eq!(card.confidence(), Confidence::ZERO);
        assert_eq!(card.times_reviewed(), 0);
        assert_eq!(card.next_review(), t0());
        assert_eq!(card.last_reviewed(), t0());
        assert_eq!(card.state(), CardState::New);
        assert_eq!(card.example(), "$50/month for 24 months = $1,200");
        assert_eq!(engine.store().get_card(card.id())?, card);
        Ok(())
    }

    #[test]
    fn test_create_card_rejects_blank_fields() {
        let mut engine = engine();
        let err = engine
            .create_card(
                NewCard::new("  ", "x", Category::Saas, Difficulty::Easy),
                t0(),
            )
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::BlankTerm));
        let err = engine
            .create_card(
                NewCard::new("MRR", "\n\t", Category::Saas, Difficulty::Easy),
                t0(),
            )
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::BlankDefinition));
        assert_eq!(engine.store().card_count().unwrap(), 0);
    }

    #[test]
    fn test_identical_cards_get_distinct_ids() -> Fallible<()> {
        let mut engine = engine();
        let a = engine.create_card(content("ROAS", Category::Marketing), t0())?;
        let b = engine.create_card(content("ROAS", Category::Marketing), t0())?;
        assert_ne!(a.id(), b.id());
        assert_eq!(engine.cards()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_grade_easy_fresh_card() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("CAC", Category::Marketing), t0())?;
        let graded = engine.grade(card.id(), Grade::Easy, t0())?;
        assert_eq!(graded.card.confidence().value(), 0.10);
        assert_eq!(graded.card.next_review(), t0() + TimeDelta::days(3));
        assert_eq!(graded.card.times_reviewed(), 1);
        assert_eq!(graded.card.state(), CardState::Learning);
        assert_eq!(graded.previous, card);
        assert_eq!(engine.store().review_count()?, 1);
        Ok(())
    }

    #[test]
    fn test_grade_hard_from_high_confidence() {
        let mut card = card_at("PMF", 0.95, t0());
        grade_review(&mut card, Grade::Hard, t0()).unwrap();
        assert_eq!(card.confidence(), Confidence::from_f64(0.85));
        assert_eq!(card.next_review(), t0() + TimeDelta::hours(12));
    }

    #[test]
    fn test_grade_hard_clamps_at_zero() {
        let mut card = card_at("PMF", 0.05, t0());
        grade_review(&mut card, Grade::Hard, t0()).unwrap();
        assert_eq!(card.confidence(), Confidence::ZERO);
    }

    #[test]
    fn test_grade_medium() {
        let later = t0() + TimeDelta::minutes(5);
        let mut card = card_at("ARR", 0.5, t0());
        grade_review(&mut card, Grade::Medium, later).unwrap();
        assert_eq!(card.confidence(), Confidence::from_f64(0.55));
        assert_eq!(card.last_reviewed(), later);
        assert_eq!(card.next_review(), later + TimeDelta::days(1));
    }

    #[test]
    fn test_mastered_card_can_regress() {
        let mut card = card_at("LTV:CAC", 0.8, t0());
        grade_review(&mut card, Grade::Easy, t0()).unwrap();
        assert_eq!(card.state(), CardState::Mastered);
        grade_review(&mut card, Grade::Hard, t0()).unwrap();
        grade_review(&mut card, Grade::Hard, t0()).unwrap();
        assert_eq!(card.state(), CardState::Learning);
    }

    #[test]
    fn test_grade_at_the_end_of_time() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("Terminal Value", Category::Finance), t0())?;
        let end = Timestamp::new(chrono::DateTime::<Utc>::MAX_UTC);
        let err = engine.grade(card.id(), Grade::Easy, end).unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::ScheduleOverflow { now: end })
        );
        assert_eq!(engine.store().get_card(card.id())?, card);
        assert_eq!(engine.store().review_count()?, 0);

        let mut direct = card.clone();
        let result = grade_review(&mut direct, Grade::Hard, end);
        assert!(result.is_err());
        assert_eq!(direct, card);
        Ok(())
    }

    #[test]
    fn test_grade_rejects_time_travel() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("EBITDA", Category::Finance), t0())?;
        let earlier = t0() + TimeDelta::seconds(-1);
        let err = engine.grade(card.id(), Grade::Easy, earlier).unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::TimeTravel {
                last_reviewed: t0(),
                now: earlier,
            })
        );
        assert_eq!(engine.store().get_card(card.id())?, card);
        assert_eq!(engine.store().review_count()?, 0);
        Ok(())
    }

    #[test]
    fn test_grade_unknown_card() {
        let mut engine = engine();
        let id = CardId::derive(&content("ghost", Category::Finance), t0(), 0);
        assert!(engine.grade(id, Grade::Easy, t0()).is_err());
    }

    #[test]
    fn test_queue_orders_by_confidence() {
        let a = card_at("A", 0.2, t0());
        let b = card_at("B", 0.6, t0());
        let cards = vec![b.clone(), a.clone()];
        let queue = select_due_queue(&cards, None, t0());
        assert_eq!(queue, vec![&a, &b]);
    }

    #[test]
    fn test_queue_ties_go_to_staler_card() {
        let stale = card_at("stale", 0.3, t0());
        let fresh = card_at("fresh", 0.3, t0() + TimeDelta::hours(1));
        let cards = vec![fresh.clone(), stale.clone()];
        let queue = select_due_queue(&cards, None, t0() + TimeDelta::hours(2));
        assert_eq!(queue, vec![&stale, &fresh]);
    }

    #[test]
    fn test_queue_excludes_future_cards() {
        let mut later = card_at("later", 0.0, t0());
        grade_review(&mut later, Grade::Medium, t0()).unwrap();
        let now = card_at("now", 0.9, t0());
        let cards = vec![later.clone(), now.clone()];
        assert_eq!(select_due_queue(&cards, None, t0()), vec![&now]);
        // Exactly at the boundary the card is due.
        let boundary = t0() + TimeDelta::days(1);
        assert_eq!(select_due_queue(&cards, None, boundary).len(), 2);
    }

    #[test]
    fn test_queue_category_filter() -> Fallible<()> {
        let mut engine = engine();
        engine.create_card(content("CLV", Category::Finance), t0())?;
        engine.create_card(content("ROAS", Category::Marketing), t0())?;
        engine.create_card(content("MRR", Category::Saas), t0())?;
        let queue = engine.study_queue(Some(Category::Marketing), t0())?;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].term(), "ROAS");
        assert!(engine.study_queue(Some(Category::Strategy), t0())?.is_empty());
        assert_eq!(engine.study_queue(None, t0())?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_queue_is_restartable() -> Fallible<()> {
        let mut engine = engine();
        for term in ["a", "b", "c", "d", "e"] {
            engine.create_card(content(term, Category::Strategy), t0())?;
        }
        let first = engine.study_queue(None, t0())?;
        let second = engine.study_queue(None, t0())?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_empty_queue_is_not_an_error() -> Fallible<()> {
        let engine = engine();
        assert!(engine.study_queue(None, t0())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_read_queries() {
        let a = card_at("a", 0.8, t0());
        let b = card_at("b", 0.4, t0());
        let mut c = card_at("c", 0.0, t0());
        grade_review(&mut c, Grade::Easy, t0()).unwrap();
        let cards = vec![a, b, c];
        let snapshot = cards.clone();
        assert_eq!(mastered_count(&cards), 1);
        assert_eq!(due_count(&cards, t0()), 2);
        assert!((average_confidence(&cards) - (0.8 + 0.4 + 0.1) / 3.0).abs() < 1e-9);
        assert_eq!(cards, snapshot);
    }

    #[test]
    fn test_average_confidence_empty() {
        assert_eq!(average_confidence(&[]), 0.0);
    }

    #[test]
    fn test_overview() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("NPV", Category::Finance), t0())?;
        engine.create_card(content("IRR", Category::Finance), t0())?;
        engine.grade(card.id(), Grade::Easy, t0())?;
        let overview = engine.overview(t0())?;
        assert_eq!(overview.total, 2);
        assert_eq!(overview.mastered, 0);
        assert_eq!(overview.due, 1);
        assert!((overview.average_confidence - 0.05).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_undo_restores_previous_state() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("Burn Rate", Category::Saas), t0())?;
        let graded = engine.grade(card.id(), Grade::Hard, t0())?;
        engine.undo(&graded)?;
        assert_eq!(engine.store().get_card(card.id())?, card);
        assert_eq!(engine.store().review_count()?, 0);
        Ok(())
    }

    #[test]
    fn test_undo_refuses_stale_grade() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("Runway", Category::Saas), t0())?;
        let first = engine.grade(card.id(), Grade::Easy, t0())?;
        engine.grade(card.id(), Grade::Easy, t0())?;
        assert!(engine.undo(&first).is_err());
        assert_eq!(engine.store().review_count()?, 2);
        Ok(())
    }

    #[test]
    fn test_stale_record_is_rejected() -> Fallible<()> {
        let mut engine = engine();
        let card = engine.create_card(content("Payback Period", Category::Finance), t0())?;
        engine.grade(card.id(), Grade::Easy, t0())?;
        let mut regraded = card.clone();
        grade_review(&mut regraded, Grade::Hard, t0())?;
        let review = ReviewRecord::of(&regraded, Grade::Hard);
        let result = engine
            .store_mut()
            .record_review(&card, &regraded, &review);
        assert!(result.is_err());
        let stored = engine.store().get_card(card.id())?;
        assert_eq!(stored.times_reviewed(), 1);
        assert_eq!(stored.confidence().value(), 0.1);
        assert_eq!(engine.store().review_count()?, 1);
        Ok(())
    }

    /// Every grade sequence up to length six, applied at advancing times.
    fn all_sequences(len: usize) -> Vec<Vec<Grade>> {
        let grades = [Grade::Easy, Grade::Medium, Grade::Hard];
        let mut sequences: Vec<Vec<Grade>> = vec![vec![]];
        for _ in 0..len {
            sequences = sequences
                .into_iter()
                .flat_map(|seq| {
                    grades.iter().map(move |g| {
                        let mut next = seq.clone();
                        next.push(*g);
                        next
                    })
                })
                .collect();
        }
        sequences
    }

    #[test]
    fn test_grade_invariants_hold_for_all_sequences() {
        for start in [0.0, 0.05, 0.5, 0.95, 1.0] {
            for len in 0..=6 {
                for sequence in all_sequences(len) {
                    let mut card = card_at("prop", start, t0());
                    let mut now = t0();
                    for grade in &sequence {
                        now = now + TimeDelta::minutes(90);
                        grade_review(&mut card, *grade, now).unwrap();
                        let value = card.confidence().value();
                        assert!((0.0..=1.0).contains(&value));
                        assert!(card.next_review() >= now);
                        assert!(card.next_review() >= card.last_reviewed());
                        assert_eq!(card.last_reviewed(), now);
                    }
                    assert_eq!(card.times_reviewed(), sequence.len());
                }
            }
        }
    }

    #[test]
    fn test_due_set_matches_definition() {
        let mut cards = Vec::new();
        for (i, grade) in [Grade::Easy, Grade::Medium, Grade::Hard].iter().enumerate() {
            for category in Category::ALL {
                let term = format!("{i}-{category}");
                let id = CardId::derive(&content(&term, category), t0(), cards.len());
                let mut card = Card::create(id, content(&term, category), t0());
                grade_review(&mut card, *grade, t0()).unwrap();
                cards.push(card);
            }
        }
        for hours in [0, 11, 12, 13, 24, 48, 72, 100] {
            let now = t0() + TimeDelta::hours(hours);
            for filter in [None, Some(Category::Finance), Some(Category::Strategy)] {
                let queue = select_due_queue(&cards, filter, now);
                for card in &cards {
                    let expected =
                        card.next_review() <= now && filter.is_none_or(|c| c == card.category());
                    assert_eq!(queue.contains(&card), expected);
                }
            }
        }
    }
}
