// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! The async client adapter.
//!
//! One method per verb; each serializes a request with a fresh correlation
//! id, parks a oneshot sender under that id and waits for the reader task to
//! route the response back. Error statuses are returned in the response
//! payload, not as `Err`: only transport failures surface as [`ClientError`].

use std::{collections::HashMap, sync::Arc};

use futures_util::{
	SinkExt, StreamExt,
	stream::{SplitSink, SplitStream},
};
use parking_lot::Mutex;
use sqlbridge_protocol::{
	ConnectionRequest, CreateStatementRequest, DirectStatusResponse, ExecuteQueryRequest, GetAutoCommitResponse,
	GetCatalogResponse, GetClientInfoResponse, GetHoldabilityResponse, GetNetworkTimeoutResponse, GetSchemaResponse,
	GetTransactionIsolationResponse, GetTypeMapResponse, GetWarningsResponse, IsReadOnlyResponse, IsValidRequest,
	IsValidResponse, NativeSqlRequest, NativeSqlResponse, OpenConnectionRequest, ReleaseSavepointRequest, Request,
	RequestPayload, Response, ResponsePayload, RollbackRequest, Savepoint, SetAutoCommitRequest, SetCatalogRequest,
	SetClientInfoRequest, SetHoldabilityRequest, SetNetworkTimeoutRequest, SetReadOnlyRequest, SetSavepointRequest,
	SetSavepointResponse, SetSchemaRequest, SetTransactionIsolationRequest, SetTypeMapRequest, StatementRequest,
};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use uuid::Uuid;

use crate::error::ClientError;

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<ResponsePayload>>>>;

pub struct WsClient {
	write: tokio::sync::Mutex<WsWrite>,
	pending: PendingMap,
	reader: JoinHandle<()>,
}

impl WsClient {
	pub async fn connect(url: &str) -> Result<Self, ClientError> {
		let (ws_stream, _) = connect_async(url).await.map_err(|e| ClientError::Connect {
			url: url.to_string(),
			reason: e.to_string(),
		})?;
		let (write, read) = ws_stream.split();
		let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
		let reader = tokio::spawn(read_loop(read, pending.clone()));
		Ok(Self {
			write: tokio::sync::Mutex::new(write),
			pending,
			reader,
		})
	}

	/// Close the socket and stop the reader. In-flight requests fail with
	/// [`ClientError::ConnectionClosed`].
	pub async fn close(self) {
		let _ = self.write.lock().await.send(Message::Close(None)).await;
		self.reader.abort();
		self.pending.lock().clear();
	}

	async fn send(&self, payload: RequestPayload) -> Result<ResponsePayload, ClientError> {
		let id = Uuid::new_v4().to_string();
		let (tx, rx) = oneshot::channel();
		self.pending.lock().insert(id.clone(), tx);

		let json = match serde_json::to_string(&Request {
			id: id.clone(),
			payload,
		}) {
			Ok(json) => json,
			Err(e) => {
				self.pending.lock().remove(&id);
				return Err(ClientError::Encode(e));
			}
		};
		if self.write.lock().await.send(Message::Text(json.into())).await.is_err() {
			self.pending.lock().remove(&id);
			return Err(ClientError::ConnectionClosed);
		}
		rx.await.map_err(|_| ClientError::ConnectionClosed)
	}

	async fn direct(&self, operation: &'static str, payload: RequestPayload) -> Result<DirectStatusResponse, ClientError> {
		match self.send(payload).await? {
			ResponsePayload::Direct(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation,
			}),
		}
	}

	pub async fn open_connection(
		&self,
		connection_id: Option<String>,
		configs: HashMap<String, String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"OpenConnection",
			RequestPayload::OpenConnection(OpenConnectionRequest {
				connection_id,
				configs,
			}),
		)
		.await
	}

	pub async fn close_connection(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct("CloseConnection", RequestPayload::CloseConnection(conn_req(connection_id))).await
	}

	pub async fn abort_connection(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct("AbortConnection", RequestPayload::AbortConnection(conn_req(connection_id))).await
	}

	pub async fn set_auto_commit(&self, connection_id: &str, auto_commit: bool) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetAutoCommit",
			RequestPayload::SetAutoCommit(SetAutoCommitRequest {
				connection_id: connection_id.to_string(),
				auto_commit,
			}),
		)
		.await
	}

	pub async fn get_auto_commit(&self, connection_id: &str) -> Result<GetAutoCommitResponse, ClientError> {
		match self.send(RequestPayload::GetAutoCommit(conn_req(connection_id))).await? {
			ResponsePayload::AutoCommit(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetAutoCommit",
			}),
		}
	}

	pub async fn commit(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct("Commit", RequestPayload::Commit(conn_req(connection_id))).await
	}

	pub async fn rollback(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"Rollback",
			RequestPayload::Rollback(RollbackRequest {
				connection_id: connection_id.to_string(),
				savepoint: None,
			}),
		)
		.await
	}

	pub async fn rollback_to_savepoint(
		&self,
		connection_id: &str,
		savepoint: Savepoint,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"Rollback",
			RequestPayload::Rollback(RollbackRequest {
				connection_id: connection_id.to_string(),
				savepoint: Some(savepoint),
			}),
		)
		.await
	}

	pub async fn set_read_only(&self, connection_id: &str, read_only: bool) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetReadOnly",
			RequestPayload::SetReadOnly(SetReadOnlyRequest {
				connection_id: connection_id.to_string(),
				read_only,
			}),
		)
		.await
	}

	pub async fn is_read_only(&self, connection_id: &str) -> Result<IsReadOnlyResponse, ClientError> {
		match self.send(RequestPayload::IsReadOnly(conn_req(connection_id))).await? {
			ResponsePayload::ReadOnly(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "IsReadOnly",
			}),
		}
	}

	pub async fn set_catalog(&self, connection_id: &str, catalog: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetCatalog",
			RequestPayload::SetCatalog(SetCatalogRequest {
				connection_id: connection_id.to_string(),
				catalog: catalog.to_string(),
			}),
		)
		.await
	}

	pub async fn get_catalog(&self, connection_id: &str) -> Result<GetCatalogResponse, ClientError> {
		match self.send(RequestPayload::GetCatalog(conn_req(connection_id))).await? {
			ResponsePayload::Catalog(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetCatalog",
			}),
		}
	}

	pub async fn set_transaction_isolation(&self, connection_id: &str, level: i32) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetTransactionIsolation",
			RequestPayload::SetTransactionIsolation(SetTransactionIsolationRequest {
				connection_id: connection_id.to_string(),
				level,
			}),
		)
		.await
	}

	pub async fn get_transaction_isolation(
		&self,
		connection_id: &str,
	) -> Result<GetTransactionIsolationResponse, ClientError> {
		match self.send(RequestPayload::GetTransactionIsolation(conn_req(connection_id))).await? {
			ResponsePayload::TransactionIsolation(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetTransactionIsolation",
			}),
		}
	}

	pub async fn get_warnings(&self, connection_id: &str) -> Result<GetWarningsResponse, ClientError> {
		match self.send(RequestPayload::GetWarnings(conn_req(connection_id))).await? {
			ResponsePayload::Warnings(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetWarnings",
			}),
		}
	}

	pub async fn clear_warnings(&self, connection_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct("ClearWarnings", RequestPayload::ClearWarnings(conn_req(connection_id))).await
	}

	pub async fn set_client_info(
		&self,
		connection_id: &str,
		configs: HashMap<String, String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetClientInfo",
			RequestPayload::SetClientInfo(SetClientInfoRequest {
				connection_id: connection_id.to_string(),
				configs,
			}),
		)
		.await
	}

	/// The single name/value form collapses into the map form, which
	/// replaces the server-side property set.
	pub async fn set_client_info_entry(
		&self,
		connection_id: &str,
		name: &str,
		value: &str,
	) -> Result<DirectStatusResponse, ClientError> {
		let mut configs = HashMap::new();
		configs.insert(name.to_string(), value.to_string());
		self.set_client_info(connection_id, configs).await
	}

	pub async fn get_client_info(&self, connection_id: &str) -> Result<GetClientInfoResponse, ClientError> {
		match self.send(RequestPayload::GetClientInfo(conn_req(connection_id))).await? {
			ResponsePayload::ClientInfo(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetClientInfo",
			}),
		}
	}

	pub async fn set_type_map(
		&self,
		connection_id: &str,
		type_to_class: HashMap<String, String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetTypeMap",
			RequestPayload::SetTypeMap(SetTypeMapRequest {
				connection_id: connection_id.to_string(),
				type_to_class,
			}),
		)
		.await
	}

	pub async fn get_type_map(&self, connection_id: &str) -> Result<GetTypeMapResponse, ClientError> {
		match self.send(RequestPayload::GetTypeMap(conn_req(connection_id))).await? {
			ResponsePayload::TypeMap(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetTypeMap",
			}),
		}
	}

	pub async fn set_holdability(&self, connection_id: &str, holdability: i32) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetHoldability",
			RequestPayload::SetHoldability(SetHoldabilityRequest {
				connection_id: connection_id.to_string(),
				holdability,
			}),
		)
		.await
	}

	pub async fn get_holdability(&self, connection_id: &str) -> Result<GetHoldabilityResponse, ClientError> {
		match self.send(RequestPayload::GetHoldability(conn_req(connection_id))).await? {
			ResponsePayload::Holdability(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetHoldability",
			}),
		}
	}

	pub async fn set_schema(&self, connection_id: &str, schema: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetSchema",
			RequestPayload::SetSchema(SetSchemaRequest {
				connection_id: connection_id.to_string(),
				schema: schema.to_string(),
			}),
		)
		.await
	}

	pub async fn get_schema(&self, connection_id: &str) -> Result<GetSchemaResponse, ClientError> {
		match self.send(RequestPayload::GetSchema(conn_req(connection_id))).await? {
			ResponsePayload::Schema(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetSchema",
			}),
		}
	}

	pub async fn set_network_timeout(
		&self,
		connection_id: &str,
		milliseconds: u64,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"SetNetworkTimeout",
			RequestPayload::SetNetworkTimeout(SetNetworkTimeoutRequest {
				connection_id: connection_id.to_string(),
				milliseconds,
			}),
		)
		.await
	}

	pub async fn get_network_timeout(&self, connection_id: &str) -> Result<GetNetworkTimeoutResponse, ClientError> {
		match self.send(RequestPayload::GetNetworkTimeout(conn_req(connection_id))).await? {
			ResponsePayload::NetworkTimeout(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "GetNetworkTimeout",
			}),
		}
	}

	/// Create a savepoint; anonymous when `name` is `None`.
	pub async fn set_savepoint(&self, connection_id: &str, name: Option<String>) -> Result<SetSavepointResponse, ClientError> {
		match self
			.send(RequestPayload::SetSavepoint(SetSavepointRequest {
				connection_id: connection_id.to_string(),
				name,
			}))
			.await?
		{
			ResponsePayload::Savepoint(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "SetSavepoint",
			}),
		}
	}

	pub async fn release_savepoint(
		&self,
		connection_id: &str,
		savepoint: Savepoint,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"ReleaseSavepoint",
			RequestPayload::ReleaseSavepoint(ReleaseSavepointRequest {
				connection_id: connection_id.to_string(),
				savepoint,
			}),
		)
		.await
	}

	pub async fn is_valid(&self, connection_id: &str, timeout_secs: u64) -> Result<IsValidResponse, ClientError> {
		match self
			.send(RequestPayload::IsValid(IsValidRequest {
				connection_id: connection_id.to_string(),
				timeout: timeout_secs,
			}))
			.await?
		{
			ResponsePayload::Valid(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "IsValid",
			}),
		}
	}

	pub async fn native_sql(&self, connection_id: &str, sql: &str) -> Result<NativeSqlResponse, ClientError> {
		match self
			.send(RequestPayload::NativeSql(NativeSqlRequest {
				connection_id: connection_id.to_string(),
				sql: sql.to_string(),
			}))
			.await?
		{
			ResponsePayload::NativeSql(resp) => Ok(resp),
			_ => Err(ClientError::UnexpectedResponse {
				operation: "NativeSql",
			}),
		}
	}

	pub async fn create_statement(
		&self,
		connection_id: &str,
		statement_id: Option<String>,
	) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"CreateStatement",
			RequestPayload::CreateStatement(CreateStatementRequest {
				connection_id: connection_id.to_string(),
				statement_id,
			}),
		)
		.await
	}

	pub async fn close_statement(&self, statement_id: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"CloseStatement",
			RequestPayload::CloseStatement(StatementRequest {
				statement_id: statement_id.to_string(),
			}),
		)
		.await
	}

	pub async fn execute_query(&self, statement_id: &str, sql: &str) -> Result<DirectStatusResponse, ClientError> {
		self.direct(
			"ExecuteQuery",
			RequestPayload::ExecuteQuery(ExecuteQueryRequest {
				statement_id: statement_id.to_string(),
				sql: sql.to_string(),
			}),
		)
		.await
	}
}

fn conn_req(connection_id: &str) -> ConnectionRequest {
	ConnectionRequest {
		connection_id: connection_id.to_string(),
	}
}

async fn read_loop(mut read: WsRead, pending: PendingMap) {
	while let Some(msg) = read.next().await {
		match msg {
			Ok(Message::Text(text)) => match serde_json::from_str::<Response>(&text) {
				Ok(response) => {
					let sender = pending.lock().remove(&response.id);
					match sender {
						Some(tx) => {
							let _ = tx.send(response.payload);
						}
						None => tracing::debug!("response for unknown request id {}", response.id),
					}
				}
				Err(e) => tracing::warn!("failed to decode response: {}", e),
			},
			Ok(Message::Close(_)) => break,
			Ok(_) => {}
			Err(e) => {
				tracing::debug!("WebSocket read error: {}", e);
				break;
			}
		}
	}
	// Waiters see the dropped senders as a closed connection.
	pending.lock().clear();
}
