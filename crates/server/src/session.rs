// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! One live server-side connection and the per-connection state the driver
//! does not track itself: savepoint identities, statement handles,
//! holdability and the type map.

use std::{
	collections::{HashMap, HashSet},
	sync::atomic::{AtomicI32, Ordering},
};

use parking_lot::Mutex;
use sqlbridge_protocol::Savepoint;

use crate::driver::{DriverConnection, DriverResult};

/// JDBC `HOLD_CURSORS_OVER_COMMIT`.
const DEFAULT_HOLDABILITY: i32 = 1;

pub struct ConnectionSession {
	id: String,
	conn: Mutex<Box<dyn DriverConnection>>,
	interrupt: Box<dyn Fn() + Send + Sync>,
	savepoints: Mutex<HashMap<Savepoint, String>>,
	statements: Mutex<HashSet<String>>,
	next_savepoint: AtomicI32,
	holdability: AtomicI32,
	type_map: Mutex<HashMap<String, String>>,
}

impl std::fmt::Debug for ConnectionSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectionSession").field("id", &self.id).finish_non_exhaustive()
	}
}

impl ConnectionSession {
	pub fn new(id: impl Into<String>, conn: Box<dyn DriverConnection>) -> Self {
		// Taken up front so aborts never have to wait for the
		// connection lock a stuck foreground call may hold.
		let interrupt = conn.abort_handle();
		Self {
			id: id.into(),
			conn: Mutex::new(conn),
			interrupt,
			savepoints: Mutex::new(HashMap::new()),
			statements: Mutex::new(HashSet::new()),
			next_savepoint: AtomicI32::new(1),
			holdability: AtomicI32::new(DEFAULT_HOLDABILITY),
			type_map: Mutex::new(HashMap::new()),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	/// Run a driver call while holding the connection lock.
	pub fn with_conn<T>(&self, f: impl FnOnce(&mut dyn DriverConnection) -> DriverResult<T>) -> DriverResult<T> {
		let mut conn = self.conn.lock();
		f(conn.as_mut())
	}

	/// Interrupt whatever the driver is doing right now, without taking the
	/// connection lock.
	pub fn interrupt(&self) {
		(self.interrupt)();
	}

	pub fn close(&self) -> DriverResult<()> {
		self.conn.lock().close()
	}

	pub fn next_savepoint_id(&self) -> i32 {
		self.next_savepoint.fetch_add(1, Ordering::SeqCst)
	}

	pub fn record_savepoint(&self, savepoint: Savepoint, native_name: String) {
		self.savepoints.lock().insert(savepoint, native_name);
	}

	pub fn resolve_savepoint(&self, savepoint: &Savepoint) -> Option<String> {
		self.savepoints.lock().get(savepoint).cloned()
	}

	pub fn remove_savepoint(&self, savepoint: &Savepoint) -> Option<String> {
		self.savepoints.lock().remove(savepoint)
	}

	pub fn holdability(&self) -> i32 {
		self.holdability.load(Ordering::SeqCst)
	}

	pub fn set_holdability(&self, holdability: i32) {
		self.holdability.store(holdability, Ordering::SeqCst);
	}

	pub fn type_map(&self) -> HashMap<String, String> {
		self.type_map.lock().clone()
	}

	pub fn set_type_map(&self, map: HashMap<String, String>) {
		*self.type_map.lock() = map;
	}

	pub fn add_statement(&self, statement_id: String) {
		self.statements.lock().insert(statement_id);
	}

	pub fn remove_statement(&self, statement_id: &str) {
		self.statements.lock().remove(statement_id);
	}

	/// Drain the statement handles, used when the connection is evicted.
	pub fn take_statements(&self) -> Vec<String> {
		self.statements.lock().drain().collect()
	}
}
