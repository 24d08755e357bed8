// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! The uniform success/failure vocabulary carried by every response.

use serde::{Deserialize, Serialize};

/// State code carried by every successful status.
pub const SQL_STATE_OK: &str = "00000";
/// State code class for operations addressing an unknown or closed handle.
pub const SQL_STATE_INVALID_HANDLE: &str = "2E000";
/// State code class for failures while opening a connection.
pub const SQL_STATE_OPEN_FAILED: &str = "0AS86";
/// Catch-all state code for driver failures that carry no code of their own.
pub const SQL_STATE_GENERIC: &str = "38808";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
	Ok,
	Error,
}

/// Exactly one status accompanies every response. `Ok` carries the "00000"
/// state; `Error` carries a driver state code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
	pub code: StatusCode,
	pub sql_state: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub message: String,
}

impl Status {
	pub fn ok() -> Self {
		Self {
			code: StatusCode::Ok,
			sql_state: SQL_STATE_OK.to_string(),
			message: String::new(),
		}
	}

	pub fn error(sql_state: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code: StatusCode::Error,
			sql_state: sql_state.into(),
			message: message.into(),
		}
	}

	/// The error used whenever a request addresses a connection handle that
	/// is not registered. The message embeds the handle so clients can log
	/// something actionable.
	pub fn invalid_connection(handle: &str) -> Self {
		Self::error(SQL_STATE_INVALID_HANDLE, format!("invalid connection id {}", handle))
	}

	/// The error used whenever a request addresses a statement handle that is
	/// not registered.
	pub fn invalid_statement(handle: &str) -> Self {
		Self::error(SQL_STATE_INVALID_HANDLE, format!("statement id {} not found", handle))
	}

	pub fn is_ok(&self) -> bool {
		self.code == StatusCode::Ok
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ok_carries_no_error_state() {
		let status = Status::ok();
		assert!(status.is_ok());
		assert_eq!(status.sql_state, SQL_STATE_OK);
		assert!(status.message.is_empty());
	}

	#[test]
	fn test_invalid_connection_embeds_handle() {
		let status = Status::invalid_connection("abc-123");
		assert!(!status.is_ok());
		assert_eq!(status.sql_state, SQL_STATE_INVALID_HANDLE);
		assert_eq!(status.message, "invalid connection id abc-123");
	}

	#[test]
	fn test_invalid_statement_embeds_handle() {
		let status = Status::invalid_statement("stmt-9");
		assert_eq!(status.sql_state, SQL_STATE_INVALID_HANDLE);
		assert!(status.message.contains("stmt-9"));
		assert!(status.message.contains("not found"));
	}

	#[test]
	fn test_ok_message_is_omitted_on_the_wire() {
		let json = serde_json::to_string(&Status::ok()).unwrap();
		assert!(!json.contains("message"));
		let back: Status = serde_json::from_str(&json).unwrap();
		assert_eq!(back, Status::ok());
	}
}
