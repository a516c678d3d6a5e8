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

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

/// Basis points in a confidence of 1.0.
const SCALE: u16 = 10_000;

/// Mastery strength in [0.0, 1.0], held as integer basis points so that
/// repeated +0.10 steps land exactly on 0.8 rather than 0.7999...
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Confidence(u16);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0);
    pub const MAX: Confidence = Confidence(SCALE);
    /// Cards at or above this confidence count as mastered.
    pub const MASTERED: Confidence = Confidence(8_000);

    /// Converts from a float, clamping to [0.0, 1.0] and rounding to the
    /// nearest basis point. NaN maps to zero.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        let bp = (value.clamp(0.0, 1.0) * SCALE as f64).round();
        Confidence(bp as u16)
    }

    pub fn from_basis_points(bp: u16) -> Option<Self> {
        if bp <= SCALE {
            Some(Confidence(bp))
        } else {
            None
        }
    }

    pub fn basis_points(self) -> u16 {
        self.0
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Applies a signed delta in basis points, clamping the result.
    pub fn shift(self, delta: i32) -> Self {
        let raw = (self.0 as i32 + delta).clamp(0, SCALE as i32);
        Confidence(raw as u16)
    }

    pub fn is_mastered(self) -> bool {
        self >= Self::MASTERED
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

impl Serialize for Confidence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.value())
    }
}

impl ToSql for Confidence {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0 as i64))
    }
}

impl FromSql for Confidence {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw: i64 = FromSql::column_result(value)?;
        u16::try_from(raw)
            .ok()
            .and_then(Confidence::from_basis_points)
            .ok_or(FromSqlError::OutOfRange(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_clamps_low() {
        let c = Confidence::from_f64(0.05).shift(-1_000);
        assert_eq!(c, Confidence::ZERO);
    }

    #[test]
    fn test_shift_clamps_high() {
        let c = Confidence::from_f64(0.95).shift(1_000);
        assert_eq!(c, Confidence::MAX);
        assert_eq!(c.value(), 1.0);
    }

    #[test]
    fn test_eight_easy_steps_reach_mastery() {
        let mut c = Confidence::ZERO;
        for _ in 0..8 {
            c = c.shift(1_000);
        }
        assert!(c.is_mastered());
        assert_eq!(c.value(), 0.8);
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Confidence::from_f64(0.7).basis_points(), 7_000);
        assert_eq!(Confidence::from_f64(-3.0), Confidence::ZERO);
        assert_eq!(Confidence::from_f64(7.0), Confidence::MAX);
        assert_eq!(Confidence::from_f64(f64::NAN), Confidence::ZERO);
    }

    #[test]
    fn test_from_basis_points_rejects_overflow() {
        assert!(Confidence::from_basis_points(10_001).is_none());
        assert!(Confidence::from_basis_points(10_000).is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(Confidence::from_f64(0.85).to_string(), "0.85");
    }
}
