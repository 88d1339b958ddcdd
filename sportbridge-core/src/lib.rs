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

//! Sportbridge Core
//!
//! Team and player records, validation rules, and the GraphQL operations
//! the gateway replays into the GraphQL store.

pub mod model;
pub mod operations;
pub mod validation;

pub use model::{ClearReport, GraphQLBatchOperation, Player, Record, RestData, Team, TransferSummary};
pub use operations::{
    batch_count, build_operations, is_success, player_operation, team_operation,
    DEFAULT_BATCH_SIZE,
};
pub use validation::{
    sanitize_record, sanitize_string, validate_all, validate_player, validate_team, Validated,
    ValidationError,
};
