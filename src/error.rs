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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::types::timestamp::Timestamp;

/// The crate-wide error type. Carries a human-readable message, and, when the
/// error came from input validation, the validation error itself so callers
/// can tell a bad input apart from an I/O failure.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
    validation: Option<ValidationError>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            validation: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The validation error behind this report, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        self.validation.as_ref()
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

/// Bad input to a review engine operation. Always recoverable: the caller
/// should re-prompt rather than abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The card's term is empty or whitespace.
    BlankTerm,
    /// The card's definition is empty or whitespace.
    BlankDefinition,
    /// A grade was submitted with a timestamp earlier than the card's last
    /// review.
    TimeTravel {
        last_reviewed: Timestamp,
        now: Timestamp,
    },
    /// The next review would fall past the last representable instant.
    ScheduleOverflow { now: Timestamp },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::BlankTerm => write!(f, "term must not be blank."),
            ValidationError::BlankDefinition => write!(f, "definition must not be blank."),
            ValidationError::TimeTravel { last_reviewed, now } => write!(
                f,
                "review time {now} is earlier than the last review at {last_reviewed}."
            ),
            ValidationError::ScheduleOverflow { now } => {
                write!(f, "review time {now} is too late to schedule another review.")
            }
        }
    }
}

impl Error for ValidationError {}

impl From<ValidationError> for ErrorReport {
    fn from(value: ValidationError) -> Self {
        Self {
            message: value.to_string(),
            validation: Some(value),
        }
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value}"))
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport::new(format!("database error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport::new(format!("TOML error: {value}"))
    }
}

impl From<walkdir::Error> for ErrorReport {
    fn from(value: walkdir::Error) -> Self {
        ErrorReport::new(format!("directory traversal error: {value}"))
    }
}

impl From<chrono::ParseError> for ErrorReport {
    fn from(value: chrono::ParseError) -> Self {
        ErrorReport::new(format!("invalid timestamp: {value}"))
    }
}
