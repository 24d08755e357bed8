// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! SQLite driver.
//!
//! Maps the session operations onto SQLite pragmas and transaction SQL.
//! Auto-commit, isolation level and client info have no direct SQLite
//! counterpart and are emulated on the connection.

use std::{
	collections::HashMap,
	path::PathBuf,
	time::Duration,
};

use rusqlite::Connection;
use sqlbridge_protocol::SqlWarning;

use super::{Driver, DriverConnection, DriverError, DriverResult};

/// JDBC-style transaction isolation levels.
const ISOLATION_READ_UNCOMMITTED: i32 = 1;
const ISOLATION_READ_COMMITTED: i32 = 2;
const ISOLATION_REPEATABLE_READ: i32 = 4;
const ISOLATION_SERIALIZABLE: i32 = 8;

/// Client info properties the driver accepts; anything else is rejected.
const SUPPORTED_CLIENT_INFO: [&str; 3] = ["ApplicationName", "ClientUser", "ClientHostname"];

/// Opens SQLite connections. Connections open against the `path` config key
/// when present, the driver's default path otherwise, and fall back to a
/// private in-memory database.
pub struct SqliteDriver {
	default_path: Option<PathBuf>,
}

impl SqliteDriver {
	/// A driver whose connections default to private in-memory databases.
	pub fn in_memory() -> Self {
		Self {
			default_path: None,
		}
	}

	pub fn with_default_path(path: impl Into<PathBuf>) -> Self {
		Self {
			default_path: Some(path.into()),
		}
	}
}

impl Driver for SqliteDriver {
	fn open(&self, configs: &HashMap<String, String>) -> DriverResult<Box<dyn DriverConnection>> {
		let result = match configs.get("path") {
			Some(path) if path != ":memory:" => Connection::open(path),
			Some(_) => Connection::open_in_memory(),
			None => match &self.default_path {
				Some(path) => Connection::open(path),
				None => Connection::open_in_memory(),
			},
		};
		let conn = result.map_err(|e| DriverError::open_failed(e.to_string()))?;
		Ok(Box::new(SqliteConnection::new(conn)))
	}
}

pub struct SqliteConnection {
	conn: Connection,
	auto_commit: bool,
	isolation: i32,
	schema: String,
	client_info: HashMap<String, String>,
	network_timeout_ms: u64,
}

impl SqliteConnection {
	fn new(conn: Connection) -> Self {
		Self {
			conn,
			auto_commit: true,
			isolation: ISOLATION_SERIALIZABLE,
			schema: "main".to_string(),
			client_info: HashMap::new(),
			network_timeout_ms: 0,
		}
	}

	fn attached_schemas(&self) -> DriverResult<Vec<String>> {
		let mut stmt = self.conn.prepare("PRAGMA database_list").map_err(sql_err)?;
		let rows = stmt.query_map([], |row| row.get::<_, String>(1)).map_err(sql_err)?;
		rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
	}
}

fn sql_err(e: rusqlite::Error) -> DriverError {
	DriverError::generic(e.to_string())
}

/// SQLite identifiers are quoted with doubled double-quotes.
fn quote_ident(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}

impl DriverConnection for SqliteConnection {
	fn set_auto_commit(&mut self, auto_commit: bool) -> DriverResult<()> {
		if auto_commit == self.auto_commit {
			return Ok(());
		}
		if auto_commit {
			// Leaving manual mode commits the open transaction.
			if !self.conn.is_autocommit() {
				self.conn.execute_batch("COMMIT").map_err(sql_err)?;
			}
		} else if self.conn.is_autocommit() {
			self.conn.execute_batch("BEGIN").map_err(sql_err)?;
		}
		self.auto_commit = auto_commit;
		Ok(())
	}

	fn auto_commit(&mut self) -> DriverResult<bool> {
		Ok(self.auto_commit)
	}

	fn commit(&mut self) -> DriverResult<()> {
		if !self.conn.is_autocommit() {
			self.conn.execute_batch("COMMIT").map_err(sql_err)?;
		}
		if !self.auto_commit {
			self.conn.execute_batch("BEGIN").map_err(sql_err)?;
		}
		Ok(())
	}

	fn rollback(&mut self) -> DriverResult<()> {
		if !self.conn.is_autocommit() {
			self.conn.execute_batch("ROLLBACK").map_err(sql_err)?;
		}
		if !self.auto_commit {
			self.conn.execute_batch("BEGIN").map_err(sql_err)?;
		}
		Ok(())
	}

	fn rollback_to_savepoint(&mut self, name: &str) -> DriverResult<()> {
		self.conn
			.execute_batch(&format!("ROLLBACK TO SAVEPOINT {}", quote_ident(name)))
			.map_err(sql_err)
	}

	fn create_savepoint(&mut self, name: &str) -> DriverResult<()> {
		self.conn.execute_batch(&format!("SAVEPOINT {}", quote_ident(name))).map_err(sql_err)
	}

	fn release_savepoint(&mut self, name: &str) -> DriverResult<()> {
		self.conn
			.execute_batch(&format!("RELEASE SAVEPOINT {}", quote_ident(name)))
			.map_err(sql_err)
	}

	fn set_read_only(&mut self, read_only: bool) -> DriverResult<()> {
		self.conn.pragma_update(None, "query_only", read_only).map_err(sql_err)
	}

	fn is_read_only(&mut self) -> DriverResult<bool> {
		self.conn
			.pragma_query_value(None, "query_only", |row| row.get::<_, bool>(0))
			.map_err(sql_err)
	}

	fn set_catalog(&mut self, _catalog: &str) -> DriverResult<()> {
		// SQLite has a single catalog; like drivers that do not support
		// catalogs, the request is silently ignored.
		Ok(())
	}

	fn catalog(&mut self) -> DriverResult<Option<String>> {
		Ok(Some("main".to_string()))
	}

	fn set_transaction_isolation(&mut self, level: i32) -> DriverResult<()> {
		match level {
			ISOLATION_READ_UNCOMMITTED => {
				self.conn.pragma_update(None, "read_uncommitted", true).map_err(sql_err)?;
			}
			ISOLATION_READ_COMMITTED | ISOLATION_REPEATABLE_READ | ISOLATION_SERIALIZABLE => {
				self.conn.pragma_update(None, "read_uncommitted", false).map_err(sql_err)?;
			}
			other => {
				return Err(DriverError::generic(format!(
					"unsupported transaction isolation level {}",
					other
				)));
			}
		}
		self.isolation = level;
		Ok(())
	}

	fn transaction_isolation(&mut self) -> DriverResult<i32> {
		Ok(self.isolation)
	}

	fn warnings(&mut self) -> DriverResult<Option<SqlWarning>> {
		// SQLite surfaces problems as errors, never as warnings.
		Ok(None)
	}

	fn clear_warnings(&mut self) -> DriverResult<()> {
		Ok(())
	}

	/// Replaces the whole client-info set; properties absent from `configs`
	/// are cleared. Nothing is kept when any property is unsupported.
	fn set_client_info(&mut self, configs: &HashMap<String, String>) -> DriverResult<()> {
		for name in configs.keys() {
			if !SUPPORTED_CLIENT_INFO.contains(&name.as_str()) {
				return Err(DriverError::generic(format!(
					"client info property {} is not supported",
					name
				)));
			}
		}
		self.client_info = configs.clone();
		Ok(())
	}

	fn client_info(&mut self) -> DriverResult<HashMap<String, String>> {
		Ok(self.client_info.clone())
	}

	fn set_schema(&mut self, schema: &str) -> DriverResult<()> {
		let attached = self.attached_schemas()?;
		if !attached.iter().any(|name| name.eq_ignore_ascii_case(schema)) {
			return Err(DriverError::generic(format!("schema {} not found", schema)));
		}
		self.schema = schema.to_string();
		Ok(())
	}

	fn schema(&mut self) -> DriverResult<Option<String>> {
		Ok(Some(self.schema.clone()))
	}

	fn set_network_timeout(&mut self, milliseconds: u64) -> DriverResult<()> {
		let capped = Duration::from_millis(milliseconds.min(i32::MAX as u64));
		self.conn.busy_timeout(capped).map_err(sql_err)?;
		self.network_timeout_ms = milliseconds;
		Ok(())
	}

	fn network_timeout(&mut self) -> DriverResult<u64> {
		Ok(self.network_timeout_ms)
	}

	fn is_valid(&mut self, _timeout: Duration) -> DriverResult<bool> {
		Ok(self.conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0)).is_ok())
	}

	fn native_sql(&mut self, sql: &str) -> DriverResult<String> {
		Ok(strip_jdbc_escapes(sql))
	}

	fn execute(&mut self, sql: &str) -> DriverResult<()> {
		self.conn.execute_batch(sql).map_err(sql_err)
	}

	fn close(&mut self) -> DriverResult<()> {
		// An open manual transaction must not leak into the file.
		if !self.conn.is_autocommit() {
			self.conn.execute_batch("ROLLBACK").map_err(sql_err)?;
		}
		Ok(())
	}

	fn abort_handle(&self) -> Box<dyn Fn() + Send + Sync> {
		let handle = self.conn.get_interrupt_handle();
		Box::new(move || handle.interrupt())
	}
}

/// Strip JDBC escape clauses (`{fn ...}`, `{d '...'}`, `{ts '...'}`, ...),
/// keeping their inner content. String literals pass through untouched.
fn strip_jdbc_escapes(sql: &str) -> String {
	let mut out = String::with_capacity(sql.len());
	let mut chars = sql.chars().peekable();
	let mut in_string = false;

	while let Some(c) = chars.next() {
		if in_string {
			out.push(c);
			if c == '\'' {
				in_string = false;
			}
			continue;
		}
		match c {
			'\'' => {
				in_string = true;
				out.push(c);
			}
			'{' => {
				// Drop the escape keyword after the brace.
				while chars.peek().is_some_and(|n| n.is_ascii_alphabetic()) {
					chars.next();
				}
				if chars.peek().is_some_and(|n| n.is_whitespace()) {
					chars.next();
				}
			}
			'}' => {}
			_ => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::driver::{Driver, DriverConnection};

	fn open() -> Box<dyn DriverConnection> {
		SqliteDriver::in_memory().open(&HashMap::new()).unwrap()
	}

	#[test]
	fn test_auto_commit_round_trip() {
		let mut conn = open();
		assert!(conn.auto_commit().unwrap());

		conn.set_auto_commit(false).unwrap();
		assert!(!conn.auto_commit().unwrap());

		conn.execute("CREATE TABLE t (x INTEGER)").unwrap();
		conn.rollback().unwrap();
		// The table was rolled back, creating it again must work.
		conn.execute("CREATE TABLE t (x INTEGER)").unwrap();
		conn.commit().unwrap();

		conn.set_auto_commit(true).unwrap();
		assert!(conn.auto_commit().unwrap());
	}

	#[test]
	fn test_savepoint_rollback_discards_later_work() {
		let mut conn = open();
		conn.set_auto_commit(false).unwrap();
		conn.execute("CREATE TABLE t (x INTEGER)").unwrap();
		conn.execute("INSERT INTO t VALUES (1)").unwrap();

		conn.create_savepoint("sp1").unwrap();
		conn.execute("INSERT INTO t VALUES (2)").unwrap();
		conn.rollback_to_savepoint("sp1").unwrap();
		conn.release_savepoint("sp1").unwrap();

		// The second insert was rolled back, so the single remaining row
		// keeps this insert unique-clean.
		conn.execute("CREATE UNIQUE INDEX idx ON t (x)").unwrap();
		conn.execute("INSERT INTO t VALUES (2)").unwrap();
		assert!(conn.execute("INSERT INTO t VALUES (1)").is_err());

		// A released savepoint is gone.
		assert!(conn.rollback_to_savepoint("sp1").is_err());
	}

	#[test]
	fn test_read_only_round_trip() {
		let mut conn = open();
		assert!(!conn.is_read_only().unwrap());

		conn.set_read_only(true).unwrap();
		assert!(conn.is_read_only().unwrap());
		assert!(conn.execute("CREATE TABLE t (x INTEGER)").is_err());

		conn.set_read_only(false).unwrap();
		assert!(!conn.is_read_only().unwrap());
	}

	#[test]
	fn test_unsupported_isolation_level_is_rejected() {
		let mut conn = open();
		assert_eq!(conn.transaction_isolation().unwrap(), ISOLATION_SERIALIZABLE);

		conn.set_transaction_isolation(ISOLATION_READ_UNCOMMITTED).unwrap();
		assert_eq!(conn.transaction_isolation().unwrap(), ISOLATION_READ_UNCOMMITTED);

		let err = conn.set_transaction_isolation(3).unwrap_err();
		assert!(err.message.contains("isolation level 3"));
	}

	#[test]
	fn test_client_info_rejects_unknown_property() {
		let mut conn = open();

		let mut configs = HashMap::new();
		configs.insert("ApplicationName".to_string(), "sqlbridge-test".to_string());
		conn.set_client_info(&configs).unwrap();
		assert_eq!(conn.client_info().unwrap()["ApplicationName"], "sqlbridge-test");

		let mut bad = HashMap::new();
		bad.insert("FancyProperty".to_string(), "x".to_string());
		let err = conn.set_client_info(&bad).unwrap_err();
		assert!(err.message.contains("FancyProperty"));
		// The rejected set left the stored properties alone.
		assert_eq!(conn.client_info().unwrap()["ApplicationName"], "sqlbridge-test");
	}

	#[test]
	fn test_set_client_info_replaces_the_whole_set() {
		let mut conn = open();

		let mut configs = HashMap::new();
		configs.insert("ApplicationName".to_string(), "first".to_string());
		conn.set_client_info(&configs).unwrap();

		let mut configs = HashMap::new();
		configs.insert("ClientUser".to_string(), "alice".to_string());
		conn.set_client_info(&configs).unwrap();

		let info = conn.client_info().unwrap();
		assert_eq!(info.len(), 1);
		assert_eq!(info["ClientUser"], "alice");
		assert!(!info.contains_key("ApplicationName"));
	}

	#[test]
	fn test_schema_must_be_attached() {
		let mut conn = open();
		assert_eq!(conn.schema().unwrap().as_deref(), Some("main"));

		conn.set_schema("main").unwrap();

		let err = conn.set_schema("missing").unwrap_err();
		assert!(err.message.contains("schema missing not found"));
		assert_eq!(conn.schema().unwrap().as_deref(), Some("main"));
	}

	#[test]
	fn test_network_timeout_round_trip() {
		let mut conn = open();
		assert_eq!(conn.network_timeout().unwrap(), 0);
		conn.set_network_timeout(1500).unwrap();
		assert_eq!(conn.network_timeout().unwrap(), 1500);
	}

	#[test]
	fn test_is_valid_on_live_connection() {
		let mut conn = open();
		assert!(conn.is_valid(Duration::from_secs(5)).unwrap());
	}

	#[test]
	fn test_native_sql_strips_escapes() {
		let mut conn = open();
		assert_eq!(
			conn.native_sql("SELECT {fn ABS(-1)} FROM t WHERE d = {d '2021-01-01'}").unwrap(),
			"SELECT ABS(-1) FROM t WHERE d = '2021-01-01'"
		);
		assert_eq!(conn.native_sql("SELECT '{not an escape}'").unwrap(), "SELECT '{not an escape}'");
		assert_eq!(conn.native_sql("SELECT 1").unwrap(), "SELECT 1");
	}

	#[test]
	fn test_open_failure_reports_open_state() {
		let driver = SqliteDriver::with_default_path("/nonexistent-dir/db.sqlite");
		let err = driver.open(&HashMap::new()).unwrap_err();
		assert_eq!(err.sql_state, sqlbridge_protocol::SQL_STATE_OPEN_FAILED);
	}
}
