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

use clap::ValueEnum;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// The subject area a card belongs to. Used for filtering only; it has no
/// effect on scheduling.
#[derive(
    ValueEnum, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Finance,
    Marketing,
    Saas,
    Strategy,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Finance,
        Category::Marketing,
        Category::Saas,
        Category::Strategy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Finance => "finance",
            Category::Marketing => "marketing",
            Category::Saas => "saas",
            Category::Strategy => "strategy",
        }
    }

    /// Display label used on dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Finance => "Finance",
            Category::Marketing => "Marketing",
            Category::Saas => "SaaS Metrics",
            Category::Strategy => "Strategy",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Category {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "finance" => Ok(Category::Finance),
            "marketing" => Ok(Category::Marketing),
            "saas" => Ok(Category::Saas),
            "strategy" => Ok(Category::Strategy),
            _ => fail(format!("invalid category: {value}")),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Category::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
