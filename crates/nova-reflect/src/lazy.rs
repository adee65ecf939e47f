use std::sync::Arc;

use nova_config::{BoundFailurePolicy, REFLECT_TARGET};
use parking_lot::Mutex;

use crate::error::{ReflectError, Result};
use crate::ty::ResolvedType;

/// Where a lazily-computed bound list stands.
///
/// Transitions are `Unresolved -> Resolved` or `Unresolved -> Failed`; a `Resolved` list is never
/// replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundState {
    Unresolved,
    Resolved(Arc<[ResolvedType]>),
    Failed(ReflectError),
}

impl BoundState {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, BoundState::Unresolved)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, BoundState::Resolved(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BoundState::Failed(_))
    }
}

/// Per-instance memo for a bound list.
///
/// The lock only guards reading and publishing the state. Computation runs unlocked, so two
/// threads may both compute; the first publish wins and the loser adopts the winner's list.
pub(crate) struct LazyBounds {
    state: Mutex<BoundState>,
    policy: BoundFailurePolicy,
}

impl LazyBounds {
    pub(crate) fn new(policy: BoundFailurePolicy) -> Self {
        Self {
            state: Mutex::new(BoundState::Unresolved),
            policy,
        }
    }

    pub(crate) fn state(&self) -> BoundState {
        self.state.lock().clone()
    }

    pub(crate) fn get_or_resolve(
        &self,
        compute: impl FnOnce() -> Result<Vec<ResolvedType>>,
    ) -> Result<Arc<[ResolvedType]>> {
        match &*self.state.lock() {
            BoundState::Resolved(bounds) => return Ok(bounds.clone()),
            BoundState::Failed(err) => return Err(err.clone()),
            BoundState::Unresolved => {}
        }

        match compute() {
            Ok(bounds) => {
                let bounds: Arc<[ResolvedType]> = bounds.into();
                let mut state = self.state.lock();
                match &*state {
                    BoundState::Resolved(winner) => Ok(winner.clone()),
                    // A concurrent failure was memoized first; keep it published but hand this
                    // caller its own result.
                    BoundState::Failed(_) => Ok(bounds),
                    BoundState::Unresolved => {
                        *state = BoundState::Resolved(bounds.clone());
                        Ok(bounds)
                    }
                }
            }
            Err(err) => {
                tracing::debug!(
                    target: REFLECT_TARGET,
                    error = %err,
                    policy = ?self.policy,
                    "bound resolution failed"
                );
                if self.policy == BoundFailurePolicy::Memoize {
                    let mut state = self.state.lock();
                    if state.is_unresolved() {
                        *state = BoundState::Failed(err.clone());
                    }
                }
                Err(err)
            }
        }
    }
}
