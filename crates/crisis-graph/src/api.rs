//! Store contract
//!
//! The critic and the orchestrator talk to the infrastructure graph only
//! through [`StateStore`], so any directed-property-graph backend can stand
//! in for the in-process [`GraphStore`](crate::GraphStore).

use crate::error::GraphError;
use crate::impact::ImpactReport;
use crate::template::TopologyTemplate;
use crate::types::{
    Entity, EntityId, EntitySnapshot, EntityStatus, EntityType, SeedReport, StatusChange,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Default traversal depth for reachability queries
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Default cap on unfiltered snapshot queries
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 100;

/// Infrastructure state store
pub trait StateStore: Send + Sync {
    /// Entities with their outgoing relationships, ordered by id
    ///
    /// Unfiltered queries are capped at the store's snapshot limit.
    fn get_current_state(
        &self,
        type_filter: Option<&EntityType>,
    ) -> Result<Vec<EntitySnapshot>, GraphError>;

    /// Fetch one entity
    fn get_entity(&self, id: &EntityId) -> Result<Entity, GraphError>;

    /// Current status of one entity
    fn get_entity_status(&self, id: &EntityId) -> Result<EntityStatus, GraphError>;

    /// Check existence without failing on absence
    fn contains_entity(&self, id: &EntityId) -> Result<bool, GraphError>;

    /// Set status, recording the causing inject
    fn update_entity_status(
        &self,
        id: &EntityId,
        status: EntityStatus,
        causing_inject: Option<&str>,
    ) -> Result<StatusChange, GraphError>;

    /// Apply several status changes atomically
    ///
    /// Either every id exists and every change is applied, or nothing is.
    fn apply_status_batch(
        &self,
        changes: &[(EntityId, EntityStatus)],
        causing_inject: Option<&str>,
    ) -> Result<Vec<StatusChange>, GraphError>;

    /// Status transitions of one entity in commit order
    fn status_history(&self, id: &EntityId) -> Result<Vec<StatusChange>, GraphError>;

    /// Ids reachable over causal edges within `max_depth` hops, ordered by (depth, id)
    fn get_affected_entities(
        &self,
        id: &EntityId,
        max_depth: usize,
    ) -> Result<Vec<EntityId>, GraphError>;

    /// Sources of incoming causal edges
    fn causal_predecessors(&self, id: &EntityId) -> Result<Vec<EntityId>, GraphError>;

    /// Advisory impact of moving `id` to `new_status`
    fn calculate_cascading_impact(
        &self,
        id: &EntityId,
        new_status: &EntityStatus,
        max_depth: usize,
    ) -> Result<ImpactReport, GraphError>;

    /// Bulk-load a topology, optionally clearing the graph first
    fn seed(
        &self,
        topology: &TopologyTemplate,
        clear_existing: bool,
    ) -> Result<SeedReport, GraphError>;

    /// Register an active generation run
    fn begin_run(&self) -> Result<RunLease, GraphError>;
}

/// Marks a generation run as active for as long as it is held
///
/// Destructive seeding is refused while any lease is alive.
#[derive(Debug)]
pub struct RunLease {
    counter: Arc<AtomicUsize>,
}

impl RunLease {
    /// Acquire a lease on `counter`
    #[must_use]
    pub fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_counts_down_on_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let first = RunLease::acquire(Arc::clone(&counter));
        let second = RunLease::acquire(Arc::clone(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        drop(first);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        drop(second);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
