// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

use std::fmt;

use serde::{Deserialize, Serialize};

/// A savepoint value object, identified by an integer id, a name, or both.
///
/// Savepoints are not handles: they are passed by value in rollback/release
/// requests and resolved against the per-connection map of previously
/// created native savepoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Savepoint {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

impl Savepoint {
	pub fn by_id(id: i32) -> Self {
		Self {
			id: Some(id),
			name: None,
		}
	}

	pub fn by_name(name: impl Into<String>) -> Self {
		Self {
			id: None,
			name: Some(name.into()),
		}
	}
}

impl fmt::Display for Savepoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (&self.id, &self.name) {
			(Some(id), Some(name)) => write!(f, "{} ({})", name, id),
			(Some(id), None) => write!(f, "{}", id),
			(None, Some(name)) => write!(f, "{}", name),
			(None, None) => f.write_str("<unnamed>"),
		}
	}
}
