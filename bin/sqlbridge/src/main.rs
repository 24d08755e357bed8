// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use sqlbridge_server::{Dispatcher, ServerConfig, SqliteDriver, WsServer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlbridge", about = "Remote SQL session server over SQLite", version)]
struct Args {
	/// Address to listen on
	#[arg(long, default_value = "127.0.0.1:8855")]
	bind: String,

	/// Database file; connections without a path config open this file.
	/// Omit for private in-memory databases.
	#[arg(long)]
	db: Option<PathBuf>,

	/// Maximum number of concurrent client sockets
	#[arg(long, default_value_t = 64)]
	max_connections: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();

	let driver = match &args.db {
		Some(path) => SqliteDriver::with_default_path(path),
		None => SqliteDriver::in_memory(),
	};
	let dispatcher = Arc::new(Dispatcher::new(Arc::new(driver)));

	let mut server = WsServer::new(
		ServerConfig {
			bind_addr: args.bind,
			max_connections: args.max_connections,
		},
		dispatcher,
	);

	if let Err(e) = server.start().await {
		tracing::error!("{}", e);
		return ExitCode::FAILURE;
	}

	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("shutting down"),
		Err(e) => tracing::error!("failed to listen for shutdown signal: {}", e),
	}
	server.shutdown().await;
	ExitCode::SUCCESS
}
