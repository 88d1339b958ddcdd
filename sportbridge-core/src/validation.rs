// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Presence checks and string sanitization for records pulled from the
//! JSON store before they are replayed into GraphQL.
//!
//! Validation is deliberately shallow: a record passes when its required
//! keys exist and are not `null`. Types of the remaining fields are not
//! inspected.

use crate::model::Record;
use serde_json::Value;

/// Required keys for a team record
pub const TEAM_REQUIRED_FIELDS: &[&str] = &["name"];

/// Required keys for a player record
pub const PLAYER_REQUIRED_FIELDS: &[&str] = &["name", "team_id"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} record is not a JSON object")]
    NotAnObject(&'static str),

    #[error("{kind} missing required field: {field}")]
    MissingField { kind: &'static str, field: &'static str },
}

/// Escape a string for embedding inside a double-quoted GraphQL literal.
///
/// Backslashes are doubled first, then double quotes are escaped, so an
/// existing `\"` becomes `\\\"`.
pub fn sanitize_string(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Apply [`sanitize_string`] to every string value of a record.
pub fn sanitize_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(sanitize_string(s)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn validate_record(
    value: &Value,
    kind: &'static str,
    required: &[&'static str],
) -> Result<Record, ValidationError> {
    let record = value.as_object().ok_or(ValidationError::NotAnObject(kind))?;

    for &field in required {
        if record.get(field).map_or(true, Value::is_null) {
            return Err(ValidationError::MissingField { kind, field });
        }
    }

    Ok(sanitize_record(record))
}

/// Validate and sanitize a team record.
pub fn validate_team(value: &Value) -> Result<Record, ValidationError> {
    validate_record(value, "Team", TEAM_REQUIRED_FIELDS)
}

/// Validate and sanitize a player record.
pub fn validate_player(value: &Value) -> Result<Record, ValidationError> {
    validate_record(value, "Player", PLAYER_REQUIRED_FIELDS)
}

/// Records that passed validation alongside the errors of those that did not,
/// both in input order.
#[derive(Debug, Default)]
pub struct Validated {
    pub records: Vec<Record>,
    pub rejected: Vec<ValidationError>,
}

pub fn validate_all<F>(values: &[Value], validate: F) -> Validated
where
    F: Fn(&Value) -> Result<Record, ValidationError>,
{
    let mut out = Validated::default();
    for value in values {
        match validate(value) {
            Ok(record) => out.records.push(record),
            Err(e) => out.rejected.push(e),
        }
    }
    out
}
