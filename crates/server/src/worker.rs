// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Background abort worker.
//!
//! Abort must return immediately even while a foreground call has the
//! connection busy, so the interrupt-and-teardown runs on a dedicated thread
//! after the handle has already been evicted from the registry.

use std::{
	sync::{Arc, mpsc},
	thread::{self, JoinHandle},
};

use parking_lot::Mutex;

use crate::session::ConnectionSession;

enum AbortCommand {
	Abort(Arc<ConnectionSession>),
	Shutdown,
}

pub struct AbortWorker {
	sender: mpsc::Sender<AbortCommand>,
	thread: Mutex<Option<JoinHandle<()>>>,
}

impl AbortWorker {
	pub fn new() -> Self {
		let (sender, receiver) = mpsc::channel();
		let thread = thread::Builder::new()
			.name("session-abort".to_string())
			.spawn(move || run_worker(receiver))
			.ok();
		Self {
			sender,
			thread: Mutex::new(thread),
		}
	}

	/// Queue a session for interrupt and teardown. Never blocks.
	pub fn submit(&self, session: Arc<ConnectionSession>) {
		let _ = self.sender.send(AbortCommand::Abort(session));
	}
}

impl Default for AbortWorker {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for AbortWorker {
	fn drop(&mut self) {
		let _ = self.sender.send(AbortCommand::Shutdown);
		if let Some(handle) = self.thread.lock().take() {
			let _ = handle.join();
		}
	}
}

fn run_worker(receiver: mpsc::Receiver<AbortCommand>) {
	while let Ok(command) = receiver.recv() {
		match command {
			AbortCommand::Abort(session) => {
				session.interrupt();
				if let Err(e) = session.close() {
					tracing::warn!("failed to close aborted connection {}: {}", session.id(), e);
				} else {
					tracing::debug!("aborted connection {}", session.id());
				}
			}
			AbortCommand::Shutdown => break,
		}
	}
}
