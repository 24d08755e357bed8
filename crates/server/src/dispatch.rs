// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! The dispatcher: one verb in, one response out.
//!
//! Every verb resolves its handle through the registry first, so a dead
//! handle is answered without touching the driver. Driver failures are
//! converted into statuses here and never escape as errors.

use std::{collections::HashMap, sync::Arc, time::Duration};

use sqlbridge_protocol::{
	DirectStatusResponse, GetAutoCommitResponse, GetCatalogResponse, GetClientInfoResponse, GetHoldabilityResponse,
	GetNetworkTimeoutResponse, GetSchemaResponse, GetTransactionIsolationResponse, GetTypeMapResponse,
	GetWarningsResponse, IsReadOnlyResponse, IsValidResponse, NativeSqlResponse, OpenConnectionRequest,
	RequestPayload, ResponsePayload, RollbackRequest, SQL_STATE_GENERIC, SQL_STATE_OPEN_FAILED, Savepoint,
	SetSavepointRequest, SetSavepointResponse, Status,
};

use crate::{
	driver::{Driver, DriverConnection, DriverResult},
	registry::{HandleRegistry, generate_handle},
	session::ConnectionSession,
	worker::AbortWorker,
};

pub struct Dispatcher {
	registry: HandleRegistry,
	driver: Arc<dyn Driver>,
	aborts: AbortWorker,
}

impl Dispatcher {
	pub fn new(driver: Arc<dyn Driver>) -> Self {
		Self {
			registry: HandleRegistry::new(),
			driver,
			aborts: AbortWorker::new(),
		}
	}

	pub fn registry(&self) -> &HandleRegistry {
		&self.registry
	}

	pub fn handle(&self, payload: RequestPayload) -> ResponsePayload {
		match payload {
			RequestPayload::OpenConnection(req) => self.open_connection(req),
			RequestPayload::CloseConnection(req) => self.close_connection(&req.connection_id),
			RequestPayload::AbortConnection(req) => self.abort_connection(&req.connection_id),
			RequestPayload::SetAutoCommit(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_auto_commit(req.auto_commit)),
			),
			RequestPayload::GetAutoCommit(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.auto_commit()) {
					Ok(auto_commit) => ResponsePayload::AutoCommit(GetAutoCommitResponse {
						status: Status::ok(),
						auto_commit,
					}),
					Err(status) => ResponsePayload::AutoCommit(GetAutoCommitResponse {
						status,
						auto_commit: false,
					}),
				}
			}
			RequestPayload::Commit(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.commit()),
			),
			RequestPayload::Rollback(req) => self.rollback(req),
			RequestPayload::SetReadOnly(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_read_only(req.read_only)),
			),
			RequestPayload::IsReadOnly(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.is_read_only()) {
					Ok(read_only) => ResponsePayload::ReadOnly(IsReadOnlyResponse {
						status: Status::ok(),
						read_only,
					}),
					Err(status) => ResponsePayload::ReadOnly(IsReadOnlyResponse {
						status,
						read_only: false,
					}),
				}
			}
			RequestPayload::SetCatalog(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_catalog(&req.catalog)),
			),
			RequestPayload::GetCatalog(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.catalog()) {
					Ok(catalog) => ResponsePayload::Catalog(GetCatalogResponse {
						status: Status::ok(),
						catalog,
					}),
					Err(status) => ResponsePayload::Catalog(GetCatalogResponse {
						status,
						catalog: None,
					}),
				}
			}
			RequestPayload::SetTransactionIsolation(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_transaction_isolation(req.level)),
			),
			RequestPayload::GetTransactionIsolation(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.transaction_isolation()) {
					Ok(level) => ResponsePayload::TransactionIsolation(GetTransactionIsolationResponse {
						status: Status::ok(),
						level,
					}),
					Err(status) => ResponsePayload::TransactionIsolation(GetTransactionIsolationResponse {
						status,
						level: 0,
					}),
				}
			}
			RequestPayload::GetWarnings(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.warnings()) {
					Ok(warnings) => ResponsePayload::Warnings(GetWarningsResponse {
						status: Status::ok(),
						warnings,
					}),
					Err(status) => ResponsePayload::Warnings(GetWarningsResponse {
						status,
						warnings: None,
					}),
				}
			}
			RequestPayload::ClearWarnings(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.clear_warnings()),
			),
			RequestPayload::SetClientInfo(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_client_info(&req.configs)),
			),
			RequestPayload::GetClientInfo(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.client_info()) {
					Ok(configs) => ResponsePayload::ClientInfo(GetClientInfoResponse {
						status: Status::ok(),
						configs,
					}),
					Err(status) => ResponsePayload::ClientInfo(GetClientInfoResponse {
						status,
						configs: HashMap::new(),
					}),
				}
			}
			RequestPayload::SetTypeMap(req) => {
				let result = self.session(&req.connection_id).and_then(|session| {
					for (type_name, class_name) in &req.type_to_class {
						if class_name.is_empty() {
							return Err(Status::error(
								SQL_STATE_GENERIC,
								format!("type map entry {} has no target class", type_name),
							));
						}
					}
					session.set_type_map(req.type_to_class.clone());
					Ok(())
				});
				self.direct(&req.connection_id, result)
			}
			RequestPayload::GetTypeMap(req) => match self.session(&req.connection_id) {
				Ok(session) => ResponsePayload::TypeMap(GetTypeMapResponse {
					status: Status::ok(),
					type_to_class: session.type_map(),
				}),
				Err(status) => ResponsePayload::TypeMap(GetTypeMapResponse {
					status,
					type_to_class: HashMap::new(),
				}),
			},
			RequestPayload::SetHoldability(req) => {
				let result = self.session(&req.connection_id).map(|session| session.set_holdability(req.holdability));
				self.direct(&req.connection_id, result)
			}
			RequestPayload::GetHoldability(req) => match self.session(&req.connection_id) {
				Ok(session) => ResponsePayload::Holdability(GetHoldabilityResponse {
					status: Status::ok(),
					holdability: session.holdability(),
				}),
				Err(status) => ResponsePayload::Holdability(GetHoldabilityResponse {
					status,
					holdability: 0,
				}),
			},
			RequestPayload::SetSchema(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_schema(&req.schema)),
			),
			RequestPayload::GetSchema(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.schema()) {
					Ok(schema) => ResponsePayload::Schema(GetSchemaResponse {
						status: Status::ok(),
						schema,
					}),
					Err(status) => ResponsePayload::Schema(GetSchemaResponse {
						status,
						schema: None,
					}),
				}
			}
			RequestPayload::SetNetworkTimeout(req) => self.direct(
				&req.connection_id,
				self.with_connection(&req.connection_id, |conn| conn.set_network_timeout(req.milliseconds)),
			),
			RequestPayload::GetNetworkTimeout(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.network_timeout()) {
					Ok(milliseconds) => ResponsePayload::NetworkTimeout(GetNetworkTimeoutResponse {
						status: Status::ok(),
						milliseconds,
					}),
					Err(status) => ResponsePayload::NetworkTimeout(GetNetworkTimeoutResponse {
						status,
						milliseconds: 0,
					}),
				}
			}
			RequestPayload::SetSavepoint(req) => self.set_savepoint(req),
			RequestPayload::ReleaseSavepoint(req) => {
				let result = self.session(&req.connection_id).and_then(|session| {
					let native = session
						.remove_savepoint(&req.savepoint)
						.ok_or_else(|| savepoint_not_found(&req.savepoint))?;
					session.with_conn(|conn| conn.release_savepoint(&native)).map_err(|e| e.to_status())
				});
				self.direct(&req.connection_id, result)
			}
			RequestPayload::IsValid(req) => {
				let timeout = Duration::from_secs(req.timeout);
				match self.with_connection(&req.connection_id, |conn| conn.is_valid(timeout)) {
					Ok(valid) => ResponsePayload::Valid(IsValidResponse {
						status: Status::ok(),
						valid,
					}),
					Err(status) => ResponsePayload::Valid(IsValidResponse {
						status,
						valid: false,
					}),
				}
			}
			RequestPayload::NativeSql(req) => {
				match self.with_connection(&req.connection_id, |conn| conn.native_sql(&req.sql)) {
					Ok(sql) => ResponsePayload::NativeSql(NativeSqlResponse {
						status: Status::ok(),
						sql,
					}),
					Err(status) => ResponsePayload::NativeSql(NativeSqlResponse {
						status,
						sql: String::new(),
					}),
				}
			}
			RequestPayload::CreateStatement(req) => {
				match self.registry.create_statement(&req.connection_id, req.statement_id) {
					Ok(statement_id) => ResponsePayload::Direct(DirectStatusResponse::ok(statement_id)),
					Err(e) => ResponsePayload::Direct(DirectStatusResponse::error(e.to_status())),
				}
			}
			RequestPayload::CloseStatement(req) => match self.registry.remove_statement(&req.statement_id) {
				Ok(()) => ResponsePayload::Direct(DirectStatusResponse::ok(req.statement_id)),
				Err(e) => ResponsePayload::Direct(DirectStatusResponse::error(e.to_status())),
			},
			RequestPayload::ExecuteQuery(req) => {
				let result = self
					.registry
					.statement_session(&req.statement_id)
					.map_err(|e| e.to_status())
					.and_then(|session| {
						session.with_conn(|conn| conn.execute(&req.sql)).map_err(|e| e.to_status())
					});
				self.direct(&req.statement_id, result)
			}
		}
	}

	fn open_connection(&self, req: OpenConnectionRequest) -> ResponsePayload {
		if let Some(id) = req.connection_id.as_deref().filter(|id| !id.is_empty()) {
			// Reconnecting to a live handle reuses the session untouched.
			if self.registry.existing(id).is_some() {
				tracing::debug!("reconnected to connection {}", id);
				return self.opened(id);
			}
		}
		let connection_id = match req.connection_id.filter(|id| !id.is_empty()) {
			Some(id) => id,
			None => generate_handle(),
		};
		match self.driver.open(&req.configs) {
			Ok(conn) => {
				let session = Arc::new(ConnectionSession::new(connection_id.clone(), conn));
				let (_, inserted) = self.registry.register(session.clone());
				if inserted {
					tracing::debug!("opened connection {}", connection_id);
				} else {
					// Lost a concurrent open with the same id; the registered
					// session wins and this native connection is surplus.
					if let Err(e) = session.close() {
						tracing::warn!("failed to close surplus connection {}: {}", connection_id, e);
					}
					tracing::debug!("reconnected to connection {}", connection_id);
				}
				self.opened(&connection_id)
			}
			Err(e) => {
				tracing::debug!("failed to open connection: {}", e);
				let status = if e.sql_state == SQL_STATE_GENERIC {
					Status::error(SQL_STATE_OPEN_FAILED, e.message)
				} else {
					e.to_status()
				};
				ResponsePayload::Direct(DirectStatusResponse::error(status))
			}
		}
	}

	fn opened(&self, connection_id: &str) -> ResponsePayload {
		let mut resp = DirectStatusResponse::ok(connection_id);
		resp.extra_info.insert("server".to_string(), "sqlbridge".to_string());
		resp.extra_info.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
		ResponsePayload::Direct(resp)
	}

	fn close_connection(&self, connection_id: &str) -> ResponsePayload {
		match self.registry.remove(connection_id) {
			Ok(session) => match session.close() {
				Ok(()) => {
					tracing::debug!("closed connection {}", connection_id);
					ResponsePayload::Direct(DirectStatusResponse::ok(connection_id))
				}
				// The handle is evicted either way; the failure keeps the
				// driver's own state code.
				Err(e) => ResponsePayload::Direct(DirectStatusResponse::error(e.to_status())),
			},
			Err(e) => ResponsePayload::Direct(DirectStatusResponse::error(e.to_status())),
		}
	}

	fn abort_connection(&self, connection_id: &str) -> ResponsePayload {
		match self.registry.remove(connection_id) {
			Ok(session) => {
				// Interrupt and teardown happen off-thread; the handle is
				// already dead for every later request.
				self.aborts.submit(session);
				ResponsePayload::Direct(DirectStatusResponse::ok(connection_id))
			}
			Err(e) => ResponsePayload::Direct(DirectStatusResponse::error(e.to_status())),
		}
	}

	fn rollback(&self, req: RollbackRequest) -> ResponsePayload {
		let result = self.session(&req.connection_id).and_then(|session| match &req.savepoint {
			None => session.with_conn(|conn| conn.rollback()).map_err(|e| e.to_status()),
			Some(savepoint) => {
				let native = session.resolve_savepoint(savepoint).ok_or_else(|| savepoint_not_found(savepoint))?;
				session.with_conn(|conn| conn.rollback_to_savepoint(&native)).map_err(|e| e.to_status())
			}
		});
		self.direct(&req.connection_id, result)
	}

	fn set_savepoint(&self, req: SetSavepointRequest) -> ResponsePayload {
		let connection_id = req.connection_id.clone();
		let result = self.session(&req.connection_id).and_then(|session| {
			let (savepoint, native) = match req.name {
				Some(name) => (Savepoint::by_name(name.clone()), name),
				None => {
					let id = session.next_savepoint_id();
					(Savepoint::by_id(id), format!("sqlbridge_sp_{}", id))
				}
			};
			session.with_conn(|conn| conn.create_savepoint(&native)).map_err(|e| e.to_status())?;
			session.record_savepoint(savepoint.clone(), native);
			Ok(savepoint)
		});
		match result {
			Ok(savepoint) => ResponsePayload::Savepoint(SetSavepointResponse {
				status: Status::ok(),
				savepoint: Some(savepoint),
			}),
			Err(status) => {
				tracing::debug!("set savepoint failed on {}: {}", connection_id, status.message);
				ResponsePayload::Savepoint(SetSavepointResponse {
					status,
					savepoint: None,
				})
			}
		}
	}

	fn session(&self, connection_id: &str) -> Result<Arc<ConnectionSession>, Status> {
		self.registry.resolve(connection_id).map_err(|e| e.to_status())
	}

	fn with_connection<T>(
		&self,
		connection_id: &str,
		f: impl FnOnce(&mut dyn DriverConnection) -> DriverResult<T>,
	) -> Result<T, Status> {
		let session = self.session(connection_id)?;
		session.with_conn(f).map_err(|e| e.to_status())
	}

	fn direct(&self, identifier: &str, result: Result<(), Status>) -> ResponsePayload {
		match result {
			Ok(()) => ResponsePayload::Direct(DirectStatusResponse::ok(identifier)),
			Err(status) => ResponsePayload::Direct(DirectStatusResponse::error(status)),
		}
	}
}

fn savepoint_not_found(savepoint: &Savepoint) -> Status {
	Status::error(SQL_STATE_GENERIC, format!("savepoint {} not found", savepoint))
}
