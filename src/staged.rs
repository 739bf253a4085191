use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use postgres_unit_of_work::{TransactionAware, TransactionResult};
use tracing::debug;
use uuid::Uuid;

use crate::invalidation::ListInvalidator;
use crate::traits::HasOwner;

/// A transaction-aware invalidation participant that stages affected owners
/// and invalidates their cached listings only on commit.
///
/// Use it when several mutations run inside one unit of work outside
/// [`TodoWriteService`](crate::TodoWriteService): invalidating before commit
/// would let a concurrent read repopulate the cache from the old snapshot.
pub struct StagedInvalidation {
    invalidator: ListInvalidator,
    staged_owners: RwLock<HashSet<Uuid>>,
}

impl StagedInvalidation {
    pub fn new(invalidator: ListInvalidator) -> Self {
        Self {
            invalidator,
            staged_owners: RwLock::new(HashSet::new()),
        }
    }

    /// Stages an owner whose listings must be invalidated on commit
    pub fn stage(&self, owner_id: Uuid) {
        self.staged_owners.write().insert(owner_id);
    }

    /// Stages the owner of a written record
    pub fn stage_record<T: HasOwner>(&self, record: &T) {
        self.stage(record.owner_id());
    }

    /// Returns true if the owner is staged
    pub fn is_staged(&self, owner_id: &Uuid) -> bool {
        self.staged_owners.read().contains(owner_id)
    }

    /// Returns the number of staged owners
    pub fn staged_count(&self) -> usize {
        self.staged_owners.read().len()
    }

    fn take_staged(&self) -> HashSet<Uuid> {
        std::mem::take(&mut *self.staged_owners.write())
    }
}

#[async_trait]
impl TransactionAware for StagedInvalidation {
    async fn on_commit(&self) -> TransactionResult<()> {
        let owners = self.take_staged();
        debug!("Commit: invalidating listings of {} owners", owners.len());
        for owner_id in owners {
            // The commit already happened; a cache failure must not turn it into an error.
            self.invalidator
                .invalidate_owner_best_effort(owner_id, "commit")
                .await;
        }
        Ok(())
    }

    async fn on_rollback(&self) -> TransactionResult<()> {
        let owners = self.take_staged();
        debug!("Rollback: discarding {} staged owners", owners.len());
        Ok(())
    }
}
