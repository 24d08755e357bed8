// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! The WebSocket listener.
//!
//! Accepts sockets, enforces the connection limit with a semaphore, and
//! broadcasts shutdown to every per-socket task through a watch channel.

use std::{
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use parking_lot::RwLock;
use tokio::{
	net::TcpListener,
	sync::{Semaphore, watch},
	time::sleep,
};

use crate::{dispatch::Dispatcher, handler::handle_connection};

const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub bind_addr: String,
	pub max_connections: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			bind_addr: "127.0.0.1:8855".to_string(),
			max_connections: 64,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("failed to bind {addr}: {source}")]
	Bind {
		addr: String,
		source: std::io::Error,
	},
	#[error("failed to read bound address: {0}")]
	Address(std::io::Error),
}

pub struct WsServer {
	config: ServerConfig,
	dispatcher: Arc<Dispatcher>,
	local_addr: Arc<RwLock<Option<SocketAddr>>>,
	running: Arc<AtomicBool>,
	active_connections: Arc<AtomicUsize>,
	shutdown_tx: Option<watch::Sender<bool>>,
}

impl WsServer {
	pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
		Self {
			config,
			dispatcher,
			local_addr: Arc::new(RwLock::new(None)),
			running: Arc::new(AtomicBool::new(false)),
			active_connections: Arc::new(AtomicUsize::new(0)),
			shutdown_tx: None,
		}
	}

	/// Bind and start accepting in a background task. Returns once the
	/// listener is bound, so [`WsServer::local_addr`] is valid afterwards.
	pub async fn start(&mut self) -> Result<(), ServerError> {
		if self.running.swap(true, Ordering::SeqCst) {
			return Ok(());
		}

		let listener = match TcpListener::bind(&self.config.bind_addr).await {
			Ok(listener) => listener,
			Err(source) => {
				// A failed start leaves the server stopped and restartable.
				self.running.store(false, Ordering::SeqCst);
				return Err(ServerError::Bind {
					addr: self.config.bind_addr.clone(),
					source,
				});
			}
		};
		let addr = match listener.local_addr() {
			Ok(addr) => addr,
			Err(source) => {
				self.running.store(false, Ordering::SeqCst);
				return Err(ServerError::Address(source));
			}
		};
		*self.local_addr.write() = Some(addr);
		tracing::info!("listening on ws://{}", addr);

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		self.shutdown_tx = Some(shutdown_tx);

		let dispatcher = self.dispatcher.clone();
		let running = self.running.clone();
		let active = self.active_connections.clone();
		let limit = Arc::new(Semaphore::new(self.config.max_connections));

		tokio::spawn(async move {
			let mut accept_shutdown = shutdown_rx.clone();
			loop {
				tokio::select! {
					_ = accept_shutdown.changed() => {
						if *accept_shutdown.borrow() {
							break;
						}
					}
					accepted = listener.accept() => {
						let (stream, peer) = match accepted {
							Ok(pair) => pair,
							Err(e) => {
								tracing::warn!("accept failed: {}", e);
								continue;
							}
						};
						let Ok(permit) = limit.clone().try_acquire_owned() else {
							tracing::warn!("rejecting {}: connection limit reached", peer);
							continue;
						};
						tracing::debug!("accepted {}", peer);
						let dispatcher = dispatcher.clone();
						let active = active.clone();
						let shutdown_rx = shutdown_rx.clone();
						active.fetch_add(1, Ordering::SeqCst);
						tokio::spawn(async move {
							handle_connection(stream, dispatcher, shutdown_rx).await;
							active.fetch_sub(1, Ordering::SeqCst);
							drop(permit);
						});
					}
				}
			}
			running.store(false, Ordering::SeqCst);
		});

		Ok(())
	}

	/// Signal shutdown and wait for per-socket tasks to drain, bounded by a
	/// fixed timeout.
	pub async fn shutdown(&mut self) {
		let Some(shutdown_tx) = self.shutdown_tx.take() else {
			return;
		};
		let _ = shutdown_tx.send(true);

		let deadline = tokio::time::Instant::now() + SHUTDOWN_DRAIN_TIMEOUT;
		while self.active_connections.load(Ordering::SeqCst) > 0 {
			if tokio::time::Instant::now() >= deadline {
				tracing::warn!(
					"shutdown timed out with {} connections still active",
					self.active_connections.load(Ordering::SeqCst)
				);
				break;
			}
			sleep(Duration::from_millis(50)).await;
		}
		*self.local_addr.write() = None;
		tracing::info!("server stopped");
	}

	pub fn local_addr(&self) -> Option<SocketAddr> {
		*self.local_addr.read()
	}

	pub fn port(&self) -> Option<u16> {
		self.local_addr().map(|addr| addr.port())
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	pub fn active_connections(&self) -> usize {
		self.active_connections.load(Ordering::SeqCst)
	}
}
