// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Response messages.
//!
//! Verbs that produce nothing but a status (setters, lifecycle verbs,
//! statement execution) all answer with [`DirectStatusResponse`]; getters
//! answer with a typed payload next to the status.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{savepoint::Savepoint, status::Status, warning::SqlWarning};

/// A response message, correlated to its request by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: String,
	#[serde(flatten)]
	pub payload: ResponsePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ResponsePayload {
	Direct(DirectStatusResponse),
	AutoCommit(GetAutoCommitResponse),
	ReadOnly(IsReadOnlyResponse),
	Catalog(GetCatalogResponse),
	TransactionIsolation(GetTransactionIsolationResponse),
	Warnings(GetWarningsResponse),
	ClientInfo(GetClientInfoResponse),
	TypeMap(GetTypeMapResponse),
	Holdability(GetHoldabilityResponse),
	Schema(GetSchemaResponse),
	NetworkTimeout(GetNetworkTimeoutResponse),
	Savepoint(SetSavepointResponse),
	Valid(IsValidResponse),
	NativeSql(NativeSqlResponse),
}

impl ResponsePayload {
	/// The status every response carries, regardless of variant.
	pub fn status(&self) -> &Status {
		match self {
			ResponsePayload::Direct(resp) => &resp.status,
			ResponsePayload::AutoCommit(resp) => &resp.status,
			ResponsePayload::ReadOnly(resp) => &resp.status,
			ResponsePayload::Catalog(resp) => &resp.status,
			ResponsePayload::TransactionIsolation(resp) => &resp.status,
			ResponsePayload::Warnings(resp) => &resp.status,
			ResponsePayload::ClientInfo(resp) => &resp.status,
			ResponsePayload::TypeMap(resp) => &resp.status,
			ResponsePayload::Holdability(resp) => &resp.status,
			ResponsePayload::Schema(resp) => &resp.status,
			ResponsePayload::NetworkTimeout(resp) => &resp.status,
			ResponsePayload::Savepoint(resp) => &resp.status,
			ResponsePayload::Valid(resp) => &resp.status,
			ResponsePayload::NativeSql(resp) => &resp.status,
		}
	}
}

/// The response for every verb whose only payload is a status: lifecycle
/// verbs additionally echo the handle in `identifier`, and open carries a
/// server-defined extra-info map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectStatusResponse {
	pub status: Status,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub identifier: String,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub extra_info: HashMap<String, String>,
}

impl DirectStatusResponse {
	pub fn ok(identifier: impl Into<String>) -> Self {
		Self {
			status: Status::ok(),
			identifier: identifier.into(),
			extra_info: HashMap::new(),
		}
	}

	pub fn error(status: Status) -> Self {
		Self {
			status,
			identifier: String::new(),
			extra_info: HashMap::new(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAutoCommitResponse {
	pub status: Status,
	#[serde(default)]
	pub auto_commit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsReadOnlyResponse {
	pub status: Status,
	#[serde(default)]
	pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCatalogResponse {
	pub status: Status,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub catalog: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTransactionIsolationResponse {
	pub status: Status,
	#[serde(default)]
	pub level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWarningsResponse {
	pub status: Status,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub warnings: Option<SqlWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetClientInfoResponse {
	pub status: Status,
	#[serde(default)]
	pub configs: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTypeMapResponse {
	pub status: Status,
	#[serde(default)]
	pub type_to_class: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHoldabilityResponse {
	pub status: Status,
	#[serde(default)]
	pub holdability: i32,
}

/// A `None` schema is a valid `OK` answer: the server may simply have no
/// current schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSchemaResponse {
	pub status: Status,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNetworkTimeoutResponse {
	pub status: Status,
	#[serde(default)]
	pub milliseconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSavepointResponse {
	pub status: Status,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub savepoint: Option<Savepoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsValidResponse {
	pub status: Status,
	#[serde(default)]
	pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeSqlResponse {
	pub status: Status,
	#[serde(default)]
	pub sql: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_accessor_covers_every_variant() {
		let error = Status::error("38808", "boom");
		let payloads = vec![
			ResponsePayload::Direct(DirectStatusResponse::error(error.clone())),
			ResponsePayload::Schema(GetSchemaResponse {
				status: error.clone(),
				schema: None,
			}),
			ResponsePayload::Valid(IsValidResponse {
				status: error.clone(),
				valid: false,
			}),
		];
		for payload in payloads {
			assert_eq!(payload.status(), &error);
		}
	}

	#[test]
	fn test_direct_response_round_trip() {
		let mut resp = DirectStatusResponse::ok("conn-1");
		resp.extra_info.insert("server".to_string(), "sqlbridge".to_string());

		let response = Response {
			id: "r1".to_string(),
			payload: ResponsePayload::Direct(resp),
		};
		let json = serde_json::to_string(&response).unwrap();
		let back: Response = serde_json::from_str(&json).unwrap();

		assert_eq!(back.id, "r1");
		match back.payload {
			ResponsePayload::Direct(direct) => {
				assert!(direct.status.is_ok());
				assert_eq!(direct.identifier, "conn-1");
				assert_eq!(direct.extra_info["server"], "sqlbridge");
			}
			other => panic!("unexpected payload: {:?}", other),
		}
	}

	#[test]
	fn test_absent_schema_still_deserializes() {
		let json = r#"{"status":{"code":"Ok","sql_state":"00000"}}"#;
		let resp: GetSchemaResponse = serde_json::from_str(json).unwrap();
		assert!(resp.status.is_ok());
		assert_eq!(resp.schema, None);
	}
}
