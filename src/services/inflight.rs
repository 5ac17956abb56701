// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-user in-flight guards.
//!
//! At most one add, one remove and one publish may be outstanding per user.
//! A second request of the same kind is rejected with [`AppError::Busy`]
//! rather than queued.

use crate::error::AppError;
use dashmap::DashSet;
use std::sync::Arc;

/// Operation kinds that are guarded independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Remove,
    Publish,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Publish => "publish",
        }
    }
}

/// Shared set of (user, kind) pairs with an operation in progress.
#[derive(Clone, Default)]
pub struct InFlightGuards {
    active: Arc<DashSet<(String, OpKind)>>,
}

impl InFlightGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `(user_id, kind)`. Released when the guard drops.
    pub fn try_begin(&self, user_id: &str, kind: OpKind) -> Result<InFlightGuard, AppError> {
        let key = (user_id.to_string(), kind);
        if !self.active.insert(key.clone()) {
            tracing::debug!(user_id, op = kind.as_str(), "Rejected concurrent request");
            return Err(AppError::Busy(kind.as_str()));
        }
        Ok(InFlightGuard {
            active: self.active.clone(),
            key,
        })
    }

    pub fn is_active(&self, user_id: &str, kind: OpKind) -> bool {
        self.active.contains(&(user_id.to_string(), kind))
    }
}

/// RAII marker for an in-flight operation.
pub struct InFlightGuard {
    active: Arc<DashSet<(String, OpKind)>>,
    key: (String, OpKind),
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}
