// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Request messages, one variant per verb.
//!
//! Discriminated by the `type` field in JSON. Verbs that carry nothing but a
//! handle share the [`ConnectionRequest`]/[`StatementRequest`] shapes instead
//! of repeating near-identical structs per verb.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::savepoint::Savepoint;

/// A request message. Each request has a unique `id` that clients use to
/// correlate responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	pub id: String,
	#[serde(flatten)]
	pub payload: RequestPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RequestPayload {
	OpenConnection(OpenConnectionRequest),
	CloseConnection(ConnectionRequest),
	AbortConnection(ConnectionRequest),
	SetAutoCommit(SetAutoCommitRequest),
	GetAutoCommit(ConnectionRequest),
	Commit(ConnectionRequest),
	Rollback(RollbackRequest),
	SetReadOnly(SetReadOnlyRequest),
	IsReadOnly(ConnectionRequest),
	SetCatalog(SetCatalogRequest),
	GetCatalog(ConnectionRequest),
	SetTransactionIsolation(SetTransactionIsolationRequest),
	GetTransactionIsolation(ConnectionRequest),
	GetWarnings(ConnectionRequest),
	ClearWarnings(ConnectionRequest),
	SetClientInfo(SetClientInfoRequest),
	GetClientInfo(ConnectionRequest),
	SetTypeMap(SetTypeMapRequest),
	GetTypeMap(ConnectionRequest),
	SetHoldability(SetHoldabilityRequest),
	GetHoldability(ConnectionRequest),
	SetSchema(SetSchemaRequest),
	GetSchema(ConnectionRequest),
	SetNetworkTimeout(SetNetworkTimeoutRequest),
	GetNetworkTimeout(ConnectionRequest),
	SetSavepoint(SetSavepointRequest),
	ReleaseSavepoint(ReleaseSavepointRequest),
	IsValid(IsValidRequest),
	NativeSql(NativeSqlRequest),
	CreateStatement(CreateStatementRequest),
	CloseStatement(StatementRequest),
	ExecuteQuery(ExecuteQueryRequest),
}

/// The shared shape for every verb that addresses a connection and carries
/// no further parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
	pub connection_id: String,
}

/// The shared shape for every verb that addresses a statement and carries no
/// further parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRequest {
	pub statement_id: String,
}

/// Open (or reconnect to) a connection.
///
/// A supplied `connection_id` reconnects to the pre-existing session with
/// that handle if one is live; otherwise the server registers the id as-is.
/// When absent the server mints a fresh handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenConnectionRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connection_id: Option<String>,
	#[serde(default)]
	pub configs: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAutoCommitRequest {
	pub connection_id: String,
	pub auto_commit: bool,
}

/// Rollback, optionally to a previously created savepoint. All rollback
/// overloads (no-arg, by id, by name, by id and name) reduce to this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRequest {
	pub connection_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub savepoint: Option<Savepoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetReadOnlyRequest {
	pub connection_id: String,
	pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCatalogRequest {
	pub connection_id: String,
	pub catalog: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTransactionIsolationRequest {
	pub connection_id: String,
	pub level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetClientInfoRequest {
	pub connection_id: String,
	#[serde(default)]
	pub configs: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTypeMapRequest {
	pub connection_id: String,
	#[serde(default)]
	pub type_to_class: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetHoldabilityRequest {
	pub connection_id: String,
	pub holdability: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSchemaRequest {
	pub connection_id: String,
	pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetNetworkTimeoutRequest {
	pub connection_id: String,
	pub milliseconds: u64,
}

/// Create a savepoint. Anonymous (no name) and named savepoints reduce to
/// this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSavepointRequest {
	pub connection_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSavepointRequest {
	pub connection_id: String,
	pub savepoint: Savepoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsValidRequest {
	pub connection_id: String,
	/// Seconds the driver may spend validating; forwarded, not enforced here.
	pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeSqlRequest {
	pub connection_id: String,
	pub sql: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatementRequest {
	pub connection_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub statement_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteQueryRequest {
	pub statement_id: String,
	pub sql: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tagged_wire_format() {
		let request = Request {
			id: "r1".to_string(),
			payload: RequestPayload::Commit(ConnectionRequest {
				connection_id: "c1".to_string(),
			}),
		};

		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["id"], "r1");
		assert_eq!(json["type"], "Commit");
		assert_eq!(json["payload"]["connection_id"], "c1");
	}

	#[test]
	fn test_rollback_overloads_share_one_shape() {
		for savepoint in [
			None,
			Some(Savepoint::by_id(1)),
			Some(Savepoint::by_name("sp")),
			Some(Savepoint {
				id: Some(1),
				name: Some("sp".to_string()),
			}),
		] {
			let payload = RequestPayload::Rollback(RollbackRequest {
				connection_id: "c1".to_string(),
				savepoint,
			});
			let json = serde_json::to_string(&payload).unwrap();
			let back: RequestPayload = serde_json::from_str(&json).unwrap();
			assert!(matches!(back, RequestPayload::Rollback(_)));
		}
	}

	#[test]
	fn test_open_without_id_omits_the_field() {
		let json = serde_json::to_string(&OpenConnectionRequest {
			connection_id: None,
			configs: HashMap::new(),
		})
		.unwrap();
		assert!(!json.contains("connection_id"));
	}
}
