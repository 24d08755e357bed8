// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! The handle registry: the single source of truth for which connection and
//! statement handles are live. A handle missing here is a dead handle, no
//! matter what the driver still holds.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use sqlbridge_protocol::{SQL_STATE_GENERIC, Status};
use uuid::Uuid;

use crate::session::ConnectionSession;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("invalid connection id {0}")]
	UnknownConnection(String),
	#[error("statement id {0} not found")]
	UnknownStatement(String),
	#[error("statement id {0} already belongs to another connection")]
	StatementInUse(String),
}

impl RegistryError {
	pub fn to_status(&self) -> Status {
		match self {
			RegistryError::UnknownConnection(id) => Status::invalid_connection(id),
			RegistryError::UnknownStatement(id) => Status::invalid_statement(id),
			RegistryError::StatementInUse(_) => Status::error(SQL_STATE_GENERIC, self.to_string()),
		}
	}
}

pub fn generate_handle() -> String {
	Uuid::new_v4().to_string()
}

pub struct HandleRegistry {
	connections: DashMap<String, Arc<ConnectionSession>>,
	/// statement handle -> owning connection handle
	statements: DashMap<String, String>,
}

impl HandleRegistry {
	pub fn new() -> Self {
		Self {
			connections: DashMap::new(),
			statements: DashMap::new(),
		}
	}

	pub fn existing(&self, connection_id: &str) -> Option<Arc<ConnectionSession>> {
		self.connections.get(connection_id).map(|entry| entry.value().clone())
	}

	/// Register a session unless its id is already live. Returns the
	/// surviving session and whether this call inserted it; the check and the
	/// insert are one atomic step, so a concurrent open with the same id
	/// cannot overwrite an existing session.
	pub fn register(&self, session: Arc<ConnectionSession>) -> (Arc<ConnectionSession>, bool) {
		match self.connections.entry(session.id().to_string()) {
			Entry::Occupied(entry) => (entry.get().clone(), false),
			Entry::Vacant(entry) => {
				entry.insert(session.clone());
				(session, true)
			}
		}
	}

	pub fn resolve(&self, connection_id: &str) -> Result<Arc<ConnectionSession>, RegistryError> {
		self.existing(connection_id)
			.ok_or_else(|| RegistryError::UnknownConnection(connection_id.to_string()))
	}

	/// Evict a connection and every statement it owns. The handle is dead the
	/// moment this returns, even while the driver teardown is still running.
	pub fn remove(&self, connection_id: &str) -> Result<Arc<ConnectionSession>, RegistryError> {
		let (_, session) = self
			.connections
			.remove(connection_id)
			.ok_or_else(|| RegistryError::UnknownConnection(connection_id.to_string()))?;
		for statement_id in session.take_statements() {
			self.statements.remove(&statement_id);
		}
		Ok(session)
	}

	/// Register a statement handle under a connection. A caller-supplied id
	/// that is already live under the same connection is returned as-is,
	/// mirroring idempotent open; one owned by a different connection is
	/// rejected.
	pub fn create_statement(&self, connection_id: &str, statement_id: Option<String>) -> Result<String, RegistryError> {
		let session = self.resolve(connection_id)?;
		let statement_id = statement_id.filter(|id| !id.is_empty()).unwrap_or_else(generate_handle);
		if let Some(owner) = self.statements.get(&statement_id).map(|entry| entry.value().clone()) {
			if owner == connection_id {
				return Ok(statement_id);
			}
			return Err(RegistryError::StatementInUse(statement_id));
		}
		session.add_statement(statement_id.clone());
		self.statements.insert(statement_id.clone(), connection_id.to_string());
		Ok(statement_id)
	}

	/// The session owning a statement handle. Statement handles are global,
	/// so no connection id is needed to resolve them.
	pub fn statement_session(&self, statement_id: &str) -> Result<Arc<ConnectionSession>, RegistryError> {
		let connection_id = self
			.statements
			.get(statement_id)
			.map(|entry| entry.value().clone())
			.ok_or_else(|| RegistryError::UnknownStatement(statement_id.to_string()))?;
		// The owning connection may have raced away; the statement is then
		// just as dead.
		self.existing(&connection_id).ok_or_else(|| RegistryError::UnknownStatement(statement_id.to_string()))
	}

	pub fn remove_statement(&self, statement_id: &str) -> Result<(), RegistryError> {
		let (_, connection_id) = self
			.statements
			.remove(statement_id)
			.ok_or_else(|| RegistryError::UnknownStatement(statement_id.to_string()))?;
		if let Some(session) = self.existing(&connection_id) {
			session.remove_statement(statement_id);
		}
		Ok(())
	}

	pub fn connection_count(&self) -> usize {
		self.connections.len()
	}

	pub fn statement_count(&self) -> usize {
		self.statements.len()
	}
}

impl Default for HandleRegistry {
	fn default() -> Self {
		Self::new()
	}
}
