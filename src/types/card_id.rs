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

use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::card::NewCard;
use crate::types::timestamp::Timestamp;

/// Opaque card identifier. A blake3 digest of the card's content, its
/// creation time, and its position in the collection, so two identical cards
/// created at the same instant still get distinct ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CardId {
    inner: blake3::Hash,
}

impl CardId {
    pub fn derive(content: &NewCard, created_at: Timestamp, sequence: usize) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(content.term.as_bytes());
        hasher.update(&[0]);
        hasher.update(content.definition.as_bytes());
        hasher.update(&[0]);
        hasher.update(content.category.as_str().as_bytes());
        hasher.update(created_at.to_string().as_bytes());
        hasher.update(&(sequence as u64).to_le_bytes());
        Self {
            inner: hasher.finalize(),
        }
    }

    pub fn to_hex(self) -> String {
        self.inner.to_hex().to_string()
    }

    /// The first eight hex digits, for log lines.
    pub fn short(self) -> String {
        self.to_hex()[..8].to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        let inner = blake3::Hash::from_hex(s)
            .map_err(|_| ErrorReport::new(format!("invalid card id: {s}")))?;
        Ok(Self { inner })
    }
}

impl PartialOrd for CardId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CardId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.as_bytes().cmp(other.inner.as_bytes())
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_hex()))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardId::from_hex(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for CardId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::types::category::Category;
    use crate::types::difficulty::Difficulty;

    fn content() -> NewCard {
        NewCard::new(
            "Churn Rate",
            "The share of customers lost in a period.",
            Category::Saas,
            Difficulty::Easy,
        )
    }

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_sequence_distinguishes_identical_cards() {
        let a = CardId::derive(&content(), t0(), 0);
        let b = CardId::derive(&content(), t0(), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_is_deterministic() {
        assert_eq!(
            CardId::derive(&content(), t0(), 3),
            CardId::derive(&content(), t0(), 3)
        );
    }

    #[test]
    fn test_hex_roundtrip() -> Fallible<()> {
        let id = CardId::derive(&content(), t0(), 0);
        assert_eq!(CardId::from_hex(&id.to_hex())?, id);
        assert_eq!(id.short().len(), 8);
        assert!(id.to_hex().starts_with(&id.short()));
        Ok(())
    }

    #[test]
    fn test_invalid_hex() {
        let err = CardId::from_hex("xyz").unwrap_err();
        assert_eq!(err.to_string(), "error: invalid card id: xyz");
    }
}
