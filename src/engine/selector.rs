// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-call provider selection.
//!
//! ```text
//! pinned?  --yes--> owner differs? -> ProviderMismatch
//!    |              available + capable? -> pinned | Unsupported
//!    no
//!    v
//! owner?   --yes--> available + capable? -> owner  | Unsupported
//!    |
//!    no
//!    v
//! embedded capable? -> embedded
//! subprocess capable? -> subprocess
//! otherwise Unsupported
//! ```
//!
//! The selector never retries on another provider after a failure.

use std::sync::Arc;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::provider::{Operation, Provider, ProviderKind, ProviderSet};

/// Chooses the provider for one operation.
#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
    providers: &'a ProviderSet,
    pinned: Option<ProviderKind>,
}

impl<'a> Selector<'a> {
    #[must_use]
    pub const fn new(providers: &'a ProviderSet, pinned: Option<ProviderKind>) -> Self {
        Self { providers, pinned }
    }

    /// Picks the provider for `operation`.
    ///
    /// `owner` is the provider that started the lifecycle `operation` belongs
    /// to (active descriptor or park entry), `None` for independent calls.
    ///
    /// # Errors
    ///
    /// `ProviderMismatch` when a pin contradicts `owner`, `Unsupported` when
    /// no eligible provider is available and declares the capability.
    pub fn select(
        &self,
        operation: Operation,
        owner: Option<ProviderKind>,
    ) -> EngineResult<&'a Arc<dyn Provider>> {
        if let Some(pinned) = self.pinned {
            if let Some(owner) = owner.filter(|o| *o != pinned) {
                return Err(EngineError::ProviderMismatch {
                    operation,
                    requested: pinned,
                    owner,
                });
            }
            return self.require(pinned, operation);
        }

        if let Some(owner) = owner {
            return self.require(owner, operation);
        }

        [ProviderKind::Embedded, ProviderKind::Subprocess]
            .into_iter()
            .find_map(|kind| self.capable(kind, operation))
            .inspect(|p| debug!(%operation, provider = %p.kind(), "selected provider"))
            .ok_or_else(|| EngineError::Unsupported {
                operation,
                reason: if operation.is_advanced() {
                    "it needs the git executable, which was not found".to_string()
                } else {
                    "no available provider declares it".to_string()
                },
            })
    }

    fn capable(&self, kind: ProviderKind, operation: Operation) -> Option<&'a Arc<dyn Provider>> {
        self.providers
            .available(kind)
            .filter(|p| p.capabilities().supports(operation))
    }

    fn require(
        &self,
        kind: ProviderKind,
        operation: Operation,
    ) -> EngineResult<&'a Arc<dyn Provider>> {
        let provider = self
            .providers
            .available(kind)
            .ok_or_else(|| EngineError::Unsupported {
                operation,
                reason: format!("the {kind} provider is not available"),
            })?;
        if !provider.capabilities().supports(operation) {
            return Err(EngineError::Unsupported {
                operation,
                reason: format!("the {kind} provider does not declare it"),
            });
        }
        debug!(%operation, provider = %kind, "selected provider");
        Ok(provider)
    }
}
