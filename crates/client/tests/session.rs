// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! End-to-end tests: a real server on an ephemeral port, driven through the
//! client adapter.

use std::{collections::HashMap, sync::Arc};

use sqlbridge_client::{BlockingClient, WsClient};
use sqlbridge_protocol::{SQL_STATE_INVALID_HANDLE, Savepoint};
use sqlbridge_server::{Dispatcher, ServerConfig, SqliteDriver, WsServer};

async fn start_server() -> (WsServer, String) {
	let dispatcher = Arc::new(Dispatcher::new(Arc::new(SqliteDriver::in_memory())));
	let mut server = WsServer::new(
		ServerConfig {
			bind_addr: "127.0.0.1:0".to_string(),
			max_connections: 8,
		},
		dispatcher,
	);
	server.start().await.unwrap();
	let url = format!("ws://{}", server.local_addr().unwrap());
	(server, url)
}

async fn open(client: &WsClient) -> String {
	let resp = client.open_connection(None, HashMap::new()).await.unwrap();
	assert!(resp.status.is_ok(), "open failed: {:?}", resp.status);
	resp.identifier
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connection_properties_round_trip() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();
	let id = open(&client).await;

	assert!(client.get_auto_commit(&id).await.unwrap().auto_commit);
	client.set_auto_commit(&id, false).await.unwrap();
	assert!(!client.get_auto_commit(&id).await.unwrap().auto_commit);
	client.commit(&id).await.unwrap();
	client.rollback(&id).await.unwrap();
	client.set_auto_commit(&id, true).await.unwrap();

	client.set_read_only(&id, true).await.unwrap();
	assert!(client.is_read_only(&id).await.unwrap().read_only);
	client.set_read_only(&id, false).await.unwrap();

	client.set_transaction_isolation(&id, 1).await.unwrap();
	assert_eq!(client.get_transaction_isolation(&id).await.unwrap().level, 1);

	assert!(client.get_warnings(&id).await.unwrap().warnings.is_none());
	assert!(client.clear_warnings(&id).await.unwrap().status.is_ok());

	client.set_client_info_entry(&id, "ApplicationName", "session-test").await.unwrap();
	let info = client.get_client_info(&id).await.unwrap();
	assert_eq!(info.configs["ApplicationName"], "session-test");

	let mut type_map = HashMap::new();
	type_map.insert("point".to_string(), "geo.Point".to_string());
	client.set_type_map(&id, type_map).await.unwrap();
	assert_eq!(client.get_type_map(&id).await.unwrap().type_to_class["point"], "geo.Point");

	client.set_holdability(&id, 2).await.unwrap();
	assert_eq!(client.get_holdability(&id).await.unwrap().holdability, 2);

	client.set_network_timeout(&id, 2500).await.unwrap();
	assert_eq!(client.get_network_timeout(&id).await.unwrap().milliseconds, 2500);

	assert!(client.is_valid(&id, 5).await.unwrap().valid);

	client.close_connection(&id).await.unwrap();
	client.close().await;
	server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_handles_are_rejected() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();

	let resp = client.commit("no-such-connection").await.unwrap();
	assert_eq!(resp.status.sql_state, SQL_STATE_INVALID_HANDLE);
	assert!(resp.status.message.contains("no-such-connection"));

	let resp = client.execute_query("no-such-statement", "SELECT 1").await.unwrap();
	assert_eq!(resp.status.sql_state, SQL_STATE_INVALID_HANDLE);
	assert!(resp.status.message.contains("no-such-statement"));

	client.close().await;
	server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconnect_with_known_id_is_idempotent() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();
	let id = open(&client).await;

	client.set_auto_commit(&id, false).await.unwrap();

	let resp = client.open_connection(Some(id.clone()), HashMap::new()).await.unwrap();
	assert!(resp.status.is_ok());
	assert_eq!(resp.identifier, id);
	// Same session, not a fresh one.
	assert!(!client.get_auto_commit(&id).await.unwrap().auto_commit);

	client.close().await;
	server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_savepoints_end_to_end() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();
	let id = open(&client).await;
	client.set_auto_commit(&id, false).await.unwrap();

	let anonymous = client.set_savepoint(&id, None).await.unwrap();
	assert!(anonymous.status.is_ok());
	let anonymous = anonymous.savepoint.unwrap();
	assert!(anonymous.id.is_some());

	let named = client.set_savepoint(&id, Some("mark".to_string())).await.unwrap().savepoint.unwrap();
	assert_eq!(named.name.as_deref(), Some("mark"));

	assert!(client.rollback_to_savepoint(&id, named).await.unwrap().status.is_ok());
	assert!(client.release_savepoint(&id, anonymous).await.unwrap().status.is_ok());

	let resp = client.rollback_to_savepoint(&id, Savepoint::by_name("phantom")).await.unwrap();
	assert!(!resp.status.is_ok());
	assert!(resp.status.message.contains("phantom"));

	client.close().await;
	server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_statements_end_to_end() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();
	let id = open(&client).await;

	let statement_id = client.create_statement(&id, None).await.unwrap().identifier;
	assert!(!statement_id.is_empty());

	let resp = client
		.execute_query(&statement_id, "CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (42)")
		.await
		.unwrap();
	assert!(resp.status.is_ok());

	assert!(client.close_statement(&statement_id).await.unwrap().status.is_ok());

	let resp = client.execute_query(&statement_id, "SELECT 1").await.unwrap();
	assert_eq!(resp.status.sql_state, SQL_STATE_INVALID_HANDLE);
	assert!(resp.status.message.contains("not found"));

	// Statements die with their connection.
	let orphan = client.create_statement(&id, None).await.unwrap().identifier;
	client.close_connection(&id).await.unwrap();
	let resp = client.execute_query(&orphan, "SELECT 1").await.unwrap();
	assert_eq!(resp.status.sql_state, SQL_STATE_INVALID_HANDLE);

	client.close().await;
	server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_catalog_schema_and_native_sql() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();
	let id = open(&client).await;

	// Catalog switching is silently accepted.
	assert!(client.set_catalog(&id, "warehouse").await.unwrap().status.is_ok());
	assert_eq!(client.get_catalog(&id).await.unwrap().catalog.as_deref(), Some("main"));

	assert!(client.set_schema(&id, "main").await.unwrap().status.is_ok());
	let resp = client.set_schema(&id, "missing").await.unwrap();
	assert!(!resp.status.is_ok());
	assert!(resp.status.message.contains("not found"));
	assert_eq!(client.get_schema(&id).await.unwrap().schema.as_deref(), Some("main"));

	let resp = client.native_sql(&id, "SELECT {fn ABS(-7)}").await.unwrap();
	assert_eq!(resp.sql, "SELECT ABS(-7)");

	client.close().await;
	server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abort_connection() {
	let (mut server, url) = start_server().await;
	let client = WsClient::connect(&url).await.unwrap();
	let id = open(&client).await;

	assert!(client.abort_connection(&id).await.unwrap().status.is_ok());

	let resp = client.get_auto_commit(&id).await.unwrap();
	assert_eq!(resp.status.sql_state, SQL_STATE_INVALID_HANDLE);

	client.close().await;
	server.shutdown().await;
}

#[test]
fn test_blocking_client_round_trip() {
	let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(2).enable_all().build().unwrap();
	let (server, url) = runtime.block_on(start_server());

	let client = BlockingClient::connect(&url).unwrap();
	let resp = client.open_connection(None, HashMap::new()).unwrap();
	assert!(resp.status.is_ok());
	let id = resp.identifier;

	client.set_auto_commit(&id, false).unwrap();
	assert!(!client.get_auto_commit(&id).unwrap().auto_commit);
	assert!(client.is_valid(&id, 5).unwrap().valid);
	assert!(client.close_connection(&id).unwrap().status.is_ok());
	client.close();

	runtime.block_on(async move {
		let mut server = server;
		server.shutdown().await;
	});
}
