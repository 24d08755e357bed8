// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error("failed to connect to {url}: {reason}")]
	Connect {
		url: String,
		reason: String,
	},

	/// The socket closed (or the reader failed) while a request was in
	/// flight.
	#[error("connection closed")]
	ConnectionClosed,

	#[error("failed to encode request: {0}")]
	Encode(#[from] serde_json::Error),

	/// The server answered with a payload variant the verb never produces.
	#[error("unexpected response for {operation}")]
	UnexpectedResponse {
		operation: &'static str,
	},
}
