// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! The driver boundary.
//!
//! The dispatcher consumes databases exclusively through the [`Driver`] and
//! [`DriverConnection`] traits, so the session protocol stays independent of
//! any one database. [`SqliteDriver`] is the reference implementation.

mod sqlite;

use std::{collections::HashMap, time::Duration};

use sqlbridge_protocol::{SQL_STATE_GENERIC, SQL_STATE_OPEN_FAILED, SqlWarning, Status};
pub use sqlite::SqliteDriver;

/// A failure raised by the underlying database.
///
/// Carries the driver's native state code so it can cross the wire inside a
/// [`Status`] unchanged.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
	pub sql_state: String,
	pub message: String,
}

impl DriverError {
	pub fn new(sql_state: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			sql_state: sql_state.into(),
			message: message.into(),
		}
	}

	/// A driver failure without a state code of its own.
	pub fn generic(message: impl Into<String>) -> Self {
		Self::new(SQL_STATE_GENERIC, message)
	}

	/// A failure while opening a connection.
	pub fn open_failed(message: impl Into<String>) -> Self {
		Self::new(SQL_STATE_OPEN_FAILED, message)
	}

	pub fn to_status(&self) -> Status {
		Status::error(self.sql_state.clone(), self.message.clone())
	}
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Opens native connections from a configuration map.
pub trait Driver: Send + Sync {
	fn open(&self, configs: &HashMap<String, String>) -> DriverResult<Box<dyn DriverConnection>>;
}

/// One live native connection.
///
/// Mirrors the operation set of the session protocol. Implementations are
/// owned by exactly one [`ConnectionSession`](crate::ConnectionSession) and
/// only ever accessed through it, so they need `Send` but not `Sync`.
pub trait DriverConnection: Send {
	fn set_auto_commit(&mut self, auto_commit: bool) -> DriverResult<()>;
	fn auto_commit(&mut self) -> DriverResult<bool>;

	fn commit(&mut self) -> DriverResult<()>;
	fn rollback(&mut self) -> DriverResult<()>;
	fn rollback_to_savepoint(&mut self, name: &str) -> DriverResult<()>;
	fn create_savepoint(&mut self, name: &str) -> DriverResult<()>;
	fn release_savepoint(&mut self, name: &str) -> DriverResult<()>;

	fn set_read_only(&mut self, read_only: bool) -> DriverResult<()>;
	fn is_read_only(&mut self) -> DriverResult<bool>;

	fn set_catalog(&mut self, catalog: &str) -> DriverResult<()>;
	fn catalog(&mut self) -> DriverResult<Option<String>>;

	fn set_transaction_isolation(&mut self, level: i32) -> DriverResult<()>;
	fn transaction_isolation(&mut self) -> DriverResult<i32>;

	fn warnings(&mut self) -> DriverResult<Option<SqlWarning>>;
	fn clear_warnings(&mut self) -> DriverResult<()>;

	/// Replace the entire client-info property set with `configs`.
	fn set_client_info(&mut self, configs: &HashMap<String, String>) -> DriverResult<()>;
	fn client_info(&mut self) -> DriverResult<HashMap<String, String>>;

	fn set_schema(&mut self, schema: &str) -> DriverResult<()>;
	fn schema(&mut self) -> DriverResult<Option<String>>;

	fn set_network_timeout(&mut self, milliseconds: u64) -> DriverResult<()>;
	fn network_timeout(&mut self) -> DriverResult<u64>;

	/// `timeout` is forwarded driver semantics; this layer does not enforce it.
	fn is_valid(&mut self, timeout: Duration) -> DriverResult<bool>;

	/// Translate JDBC-style escaped SQL into the native dialect.
	fn native_sql(&mut self, sql: &str) -> DriverResult<String>;

	/// Execute SQL to completion, discarding any rows.
	fn execute(&mut self, sql: &str) -> DriverResult<()>;

	fn close(&mut self) -> DriverResult<()>;

	/// A callback that interrupts whatever the connection is currently doing,
	/// callable from another thread while a foreground call holds the
	/// connection. Used by the abort worker.
	fn abort_handle(&self) -> Box<dyn Fn() + Send + Sync>;
}

impl std::fmt::Debug for dyn DriverConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("DriverConnection")
	}
}
