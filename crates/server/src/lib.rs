// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Server side of the sqlbridge session protocol.
//!
//! [`WsServer`] accepts WebSocket connections and feeds decoded requests to
//! the [`Dispatcher`], which resolves handles through the [`HandleRegistry`]
//! and drives the database through the [`Driver`] seam.

mod dispatch;
mod driver;
mod handler;
mod registry;
mod server;
mod session;
mod worker;

pub use dispatch::Dispatcher;
pub use driver::{Driver, DriverConnection, DriverError, DriverResult, SqliteDriver};
pub use handler::handle_connection;
pub use registry::{HandleRegistry, RegistryError, generate_handle};
pub use server::{ServerConfig, ServerError, WsServer};
pub use session::ConnectionSession;
pub use worker::AbortWorker;
