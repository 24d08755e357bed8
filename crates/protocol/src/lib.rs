// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Wire protocol for the sqlbridge remote session protocol.
//!
//! Every JDBC-style operation is one request/response pair. Requests address
//! server-side resources through opaque string handles; responses always
//! carry a [`Status`] so driver failures cross the wire as data, never as a
//! transport fault.
//!
//! All messages are JSON-formatted with the following structure:
//!
//! ```json
//! {
//!   "id": "unique-request-id",
//!   "type": "OpenConnection|Commit|ExecuteQuery|...",
//!   "payload": { ... }
//! }
//! ```

mod request;
mod response;
mod savepoint;
mod status;
mod warning;

pub use request::{
	ConnectionRequest, CreateStatementRequest, ExecuteQueryRequest, IsValidRequest, NativeSqlRequest,
	OpenConnectionRequest, ReleaseSavepointRequest, Request, RequestPayload, RollbackRequest, SetAutoCommitRequest,
	SetCatalogRequest, SetClientInfoRequest, SetHoldabilityRequest, SetNetworkTimeoutRequest, SetReadOnlyRequest,
	SetSavepointRequest, SetSchemaRequest, SetTransactionIsolationRequest, SetTypeMapRequest, StatementRequest,
};
pub use response::{
	DirectStatusResponse, GetAutoCommitResponse, GetCatalogResponse, GetClientInfoResponse, GetHoldabilityResponse,
	GetNetworkTimeoutResponse, GetSchemaResponse, GetTransactionIsolationResponse, GetTypeMapResponse,
	GetWarningsResponse, IsReadOnlyResponse, IsValidResponse, NativeSqlResponse, Response, ResponsePayload,
	SetSavepointResponse,
};
pub use savepoint::Savepoint;
pub use status::{
	SQL_STATE_GENERIC, SQL_STATE_INVALID_HANDLE, SQL_STATE_OK, SQL_STATE_OPEN_FAILED, Status, StatusCode,
};
pub use warning::SqlWarning;
