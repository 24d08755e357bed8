// Copyright (c) sqlbridge 2025
// This file is licensed under the MIT, see license.md file

use serde::{Deserialize, Serialize};

/// A chain of non-fatal driver warnings.
///
/// The wire form mirrors the driver form: each warning owns the next one.
/// Chains are produced lazily, so a connection with no warnings sends no
/// warning field at all rather than an empty chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlWarning {
	pub reason: String,
	#[serde(default)]
	pub sql_state: String,
	#[serde(default)]
	pub vendor_code: i32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next: Option<Box<SqlWarning>>,
}

impl SqlWarning {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			reason: reason.into(),
			sql_state: String::new(),
			vendor_code: 0,
			next: None,
		}
	}

	/// Build a chain from ordered (reason, state, vendor code) entries.
	/// Returns `None` for an empty slice, matching the lazy production rule.
	pub fn from_entries(entries: &[(String, String, i32)]) -> Option<Self> {
		entries.iter().rev().fold(None, |next, (reason, sql_state, vendor_code)| {
			Some(Self {
				reason: reason.clone(),
				sql_state: sql_state.clone(),
				vendor_code: *vendor_code,
				next: next.map(Box::new),
			})
		})
	}

	/// Iterate the chain head-first.
	pub fn iter(&self) -> impl Iterator<Item = &SqlWarning> {
		std::iter::successors(Some(self), |warning| warning.next.as_deref())
	}
}
