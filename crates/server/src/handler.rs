// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

//! Per-socket request loop.
//!
//! One task per accepted socket: decode a request, dispatch it on the
//! blocking pool (driver calls may block on the database), send the
//! response. A malformed frame is answered with an error status rather
//! than dropping the socket.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use sqlbridge_protocol::{DirectStatusResponse, Request, Response, ResponsePayload, SQL_STATE_GENERIC, Status};
use tokio::{net::TcpStream, sync::watch, task};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::dispatch::Dispatcher;

pub async fn handle_connection(stream: TcpStream, dispatcher: Arc<Dispatcher>, mut shutdown_rx: watch::Receiver<bool>) {
	let ws_stream = match accept_async(stream).await {
		Ok(ws) => ws,
		Err(e) => {
			tracing::debug!("WebSocket handshake failed: {}", e);
			return;
		}
	};
	let (mut write, mut read) = ws_stream.split();

	loop {
		tokio::select! {
			result = shutdown_rx.changed() => {
				if result.is_err() || *shutdown_rx.borrow() {
					let _ = write.send(Message::Close(None)).await;
					break;
				}
			}
			msg = read.next() => {
				match msg {
					Some(Ok(Message::Text(text))) => {
						let response = dispatch_text(&dispatcher, &text).await;
						match serde_json::to_string(&response) {
							Ok(json) => {
								if write.send(Message::Text(json.into())).await.is_err() {
									break;
								}
							}
							Err(e) => {
								tracing::error!("failed to encode response: {}", e);
							}
						}
					}
					Some(Ok(Message::Ping(data))) => {
						let _ = write.send(Message::Pong(data)).await;
					}
					Some(Ok(Message::Close(_))) | None => break,
					Some(Ok(_)) => {}
					Some(Err(e)) => {
						tracing::debug!("WebSocket read error: {}", e);
						break;
					}
				}
			}
		}
	}
}

async fn dispatch_text(dispatcher: &Arc<Dispatcher>, text: &str) -> Response {
	match serde_json::from_str::<Request>(text) {
		Ok(request) => {
			let id = request.id;
			let dispatcher = dispatcher.clone();
			let payload = match task::spawn_blocking(move || dispatcher.handle(request.payload)).await {
				Ok(payload) => payload,
				Err(e) => ResponsePayload::Direct(DirectStatusResponse::error(Status::error(
					SQL_STATE_GENERIC,
					format!("request handling failed: {}", e),
				))),
			};
			Response {
				id,
				payload,
			}
		}
		Err(e) => Response {
			// No id could be decoded, so the error cannot be correlated.
			id: String::new(),
			payload: ResponsePayload::Direct(DirectStatusResponse::error(Status::error(
				SQL_STATE_GENERIC,
				format!("malformed request: {}", e),
			))),
		},
	}
}
