// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Blocking facade over [`WsClient`] for callers without an async runtime.
//! Owns a single-threaded runtime and drives each call to completion on it.

use std::collections::HashMap;

use sqlbridge_protocol::{
	DirectStatusResponse, GetAutoCommitResponse, GetCatalogResponse, GetClientInfoResponse, GetHoldabilityResponse,
	GetNetworkTimeoutResponse, GetSchemaResponse, GetTransactionIsolationResponse, GetTypeMapResponse,
	GetWarningsResponse, IsReadOnlyResponse, IsValidResponse, NativeSqlResponse, Savepoint, SetSavepointResponse,
};
use tokio::runtime::Runtime;

use crate::{client::WsClient, error::ClientError};

pub struct BlockingClient {
	runtime: Runtime,
	inner: WsClient,
}

impl BlockingClient {
	pub fn connect(url: &str) -> Result<Self, ClientError> {
		let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|e| {
			ClientError::Connect {
				url: url.to_string(),
				reason: e.to_string(),
			}
		})?;
		let inner = runtime.block_on(WsClient::connect(url))?;
		Ok(Self {
			runtime,
			inner,
		})
	}

	pub fn close(self) {
		self.runtime.block_on(self.inner.close());
	}

	pub fn open_connection(
		&self,
		connection_id: Option<String>,
		configs: HashMap<String, String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.open_connection(connection_id, configs))
	}

	pub fn close_connection(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.close_connection(connection_id))
	}

	pub fn abort_connection(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.abort_connection(connection_id))
	}

	pub fn set_auto_commit(&self, connection_id: &str, auto_commit: bool) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_auto_commit(connection_id, auto_commit))
	}

	pub fn get_auto_commit(&self, connection_id: &str) -> Result<GetAutoCommitResponse, ClientError> {
		self.runtime.block_on(self.inner.get_auto_commit(connection_id))
	}

	pub fn commit(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.commit(connection_id))
	}

	pub fn rollback(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.rollback(connection_id))
	}

	pub fn rollback_to_savepoint(&self, connection_id: &str, savepoint: Savepoint) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.rollback_to_savepoint(connection_id, savepoint))
	}

	pub fn set_read_only(&self, connection_id: &str, read_only: bool) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_read_only(connection_id, read_only))
	}

	pub fn is_read_only(&self, connection_id: &str) -> Result<IsReadOnlyResponse, ClientError> {
		self.runtime.block_on(self.inner.is_read_only(connection_id))
	}

	pub fn set_catalog(&self, connection_id: &str, catalog: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_catalog(connection_id, catalog))
	}

	pub fn get_catalog(&self, connection_id: &str) -> Result<GetCatalogResponse, ClientError> {
		self.runtime.block_on(self.inner.get_catalog(connection_id))
	}

	pub fn set_transaction_isolation(&self, connection_id: &str, level: i32) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_transaction_isolation(connection_id, level))
	}

	pub fn get_transaction_isolation(&self, connection_id: &str) -> Result<GetTransactionIsolationResponse, ClientError> {
		self.runtime.block_on(self.inner.get_transaction_isolation(connection_id))
	}

	pub fn get_warnings(&self, connection_id: &str) -> Result<GetWarningsResponse, ClientError> {
		self.runtime.block_on(self.inner.get_warnings(connection_id))
	}

	pub fn clear_warnings(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.clear_warnings(connection_id))
	}

	pub fn set_client_info(
		&self,
		connection_id: &str,
		configs: HashMap<String, String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_client_info(connection_id, configs))
	}

	pub fn set_client_info_entry(&self, connection_id: &str, name: &str, value: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_client_info_entry(connection_id, name, value))
	}

	pub fn get_client_info(&self, connection_id: &str) -> Result<GetClientInfoResponse, ClientError> {
		self.runtime.block_on(self.inner.get_client_info(connection_id))
	}

	pub fn set_type_map(
		&self,
		connection_id: &str,
		type_to_class: HashMap<String, String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_type_map(connection_id, type_to_class))
	}

	pub fn get_type_map(&self, connection_id: &str) -> Result<GetTypeMapResponse, ClientError> {
		self.runtime.block_on(self.inner.get_type_map(connection_id))
	}

	pub fn set_holdability(&self, connection_id: &str, holdability: i32) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_holdability(connection_id, holdability))
	}

	pub fn get_holdability(&self, connection_id: &str) -> Result<GetHoldabilityResponse, ClientError> {
		self.runtime.block_on(self.inner.get_holdability(connection_id))
	}

	pub fn set_schema(&self, connection_id: &str, schema: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_schema(connection_id, schema))
	}

	pub fn get_schema(&self, connection_id: &str) -> Result<GetSchemaResponse, ClientError> {
		self.runtime.block_on(self.inner.get_schema(connection_id))
	}

	pub fn set_network_timeout(&self, connection_id: &str, milliseconds: u64) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.set_network_timeout(connection_id, milliseconds))
	}

	pub fn get_network_timeout(&self, connection_id: &str) -> Result<GetNetworkTimeoutResponse, ClientError> {
		self.runtime.block_on(self.inner.get_network_timeout(connection_id))
	}

	pub fn set_savepoint(&self, connection_id: &str, name: Option<String>) -> Result<SetSavepointResponse, ClientError> {
		self.runtime.block_on(self.inner.set_savepoint(connection_id, name))
	}

	pub fn release_savepoint(&self, connection_id: &str, savepoint: Savepoint) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.release_savepoint(connection_id, savepoint))
	}

	pub fn is_valid(&self, connection_id: &str, timeout_secs: u64) -> Result<IsValidResponse, ClientError> {
		self.runtime.block_on(self.inner.is_valid(connection_id, timeout_secs))
	}

	pub fn native_sql(&self, connection_id: &str, sql: &str) -> Result<NativeSqlResponse, ClientError> {
		self.runtime.block_on(self.inner.native_sql(connection_id, sql))
	}

	pub fn create_statement(&self, connection_id: &str, statement_id: Option<String>) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.create_statement(connection_id, statement_id))
	}

	pub fn close_statement(&self, statement_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.close_statement(statement_id))
	}

	pub fn execute_query(&self, statement_id: &str, sql: &str) -> Result<DirectStatusResponse, ClientError> {
		self.runtime.block_on(self.inner.execute_query(statement_id, sql))
	}
}
