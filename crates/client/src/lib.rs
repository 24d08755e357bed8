// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Client adapter for the sqlbridge session protocol.
//!
//! [`WsClient`] is the async adapter; [`BlockingClient`] wraps it for
//! synchronous callers. Response statuses are data, not errors: a verb that
//! the server rejects still returns `Ok` with an error status inside.

mod blocking;
mod client;
mod error;

pub use blocking::BlockingClient;
pub use client::WsClient;
pub use error::ClientError;
pub use sqlbridge_protocol as protocol;
