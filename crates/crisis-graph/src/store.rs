//! In-process graph state store
//!
//! A petgraph `DiGraph` guarded by a `parking_lot` lock, with an id index so
//! every operation is keyed by entity id. Reachability is an explicit bounded
//! BFS over outgoing causal edges.

use crate::api::{RunLease, StateStore, DEFAULT_SNAPSHOT_LIMIT};
use crate::error::GraphError;
use crate::impact::{AffectedEntity, ImpactReport};
use crate::template::TopologyTemplate;
use crate::types::{
    Entity, EntityId, EntitySnapshot, EntityStatus, EntityType, OutgoingRelationship,
    RelationshipType, SeedReport, StatusChange,
};
use chrono::Utc;
use parking_lot::RwLock;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Topology {
    graph: DiGraph<Entity, RelationshipType>,
    index: HashMap<EntityId, NodeIndex>,
    history: Vec<StatusChange>,
    next_sequence: u64,
}

impl Topology {
    fn node(&self, id: &EntityId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::EntityNotFound(id.clone()))
    }

    fn record(
        &mut self,
        node: NodeIndex,
        status: EntityStatus,
        causing_inject: Option<&str>,
    ) -> StatusChange {
        let entity = &mut self.graph[node];
        let from = std::mem::replace(&mut entity.status, status.clone());
        let change = StatusChange {
            sequence: self.next_sequence,
            entity_id: entity.id.clone(),
            from,
            to: status,
            causing_inject: causing_inject.map(str::to_string),
            recorded_at: Utc::now(),
        };
        self.next_sequence += 1;
        self.history.push(change.clone());
        change
    }

    fn snapshot(&self, node: NodeIndex) -> EntitySnapshot {
        let mut relationships: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| OutgoingRelationship {
                target: self.graph[edge.target()].id.clone(),
                relationship_type: *edge.weight(),
            })
            .collect();
        relationships.sort_by(|a, b| {
            a.target
                .cmp(&b.target)
                .then(a.relationship_type.cmp(&b.relationship_type))
        });

        EntitySnapshot {
            entity: self.graph[node].clone(),
            relationships,
        }
    }

    /// Bounded BFS over outgoing causal edges
    ///
    /// First visit is the minimum depth; the source is never reported.
    fn reach(&self, start: NodeIndex, max_depth: usize) -> Vec<AffectedEntity> {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(
            start,
            0usize,
            Vec::<RelationshipType>::new(),
            vec![self.graph[start].id.clone()],
        )]);
        let mut reached = Vec::new();

        while let Some((node, depth, chain, path)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            let mut edges: Vec<_> = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .filter(|edge| edge.weight().is_causal())
                .map(|edge| (edge.target(), *edge.weight()))
                .collect();
            edges.sort_by(|a, b| {
                self.graph[a.0]
                    .id
                    .cmp(&self.graph[b.0].id)
                    .then(a.1.cmp(&b.1))
            });

            for (next, relationship) in edges {
                if !visited.insert(next) {
                    continue;
                }
                let entity = &self.graph[next];
                let mut next_chain = chain.clone();
                next_chain.push(relationship);
                let mut next_path = path.clone();
                next_path.push(entity.id.clone());

                reached.push(AffectedEntity {
                    entity_id: entity.id.clone(),
                    name: entity.name.clone(),
                    entity_type: entity.entity_type.clone(),
                    criticality: entity.criticality,
                    depth: depth + 1,
                    relationship_chain: next_chain.clone(),
                    path: next_path.clone(),
                });
                queue.push_back((next, depth + 1, next_chain, next_path));
            }
        }

        reached.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.entity_id.cmp(&b.entity_id)));
        reached
    }
}

/// Shared, lock-guarded infrastructure graph
#[derive(Debug)]
pub struct GraphStore {
    inner: RwLock<Topology>,
    connected: AtomicBool,
    active_runs: Arc<AtomicUsize>,
    snapshot_limit: usize,
}

impl GraphStore {
    /// Create empty, connected store
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Topology::default()),
            connected: AtomicBool::new(true),
            active_runs: Arc::new(AtomicUsize::new(0)),
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
        }
    }

    /// Create a store seeded from `template`
    pub fn from_template(template: &TopologyTemplate) -> Result<Self, GraphError> {
        let store = Self::new();
        store.seed(template, true)?;
        Ok(store)
    }

    /// With cap on unfiltered snapshot queries
    #[inline]
    #[must_use]
    pub fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit;
        self
    }

    /// Simulate loss of the backend link
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        tracing::warn!("graph store disconnected");
    }

    /// Restore the backend link
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!("graph store reconnected");
    }

    /// Whether the backend link is up
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.inner.read().graph.node_count()
    }

    /// Number of relationships
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.inner.read().graph.edge_count()
    }

    /// Number of live run leases
    #[inline]
    #[must_use]
    pub fn active_runs(&self) -> usize {
        self.active_runs.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<(), GraphError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(GraphError::Connection("graph store is disconnected".to_string()))
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for GraphStore {
    fn get_current_state(
        &self,
        type_filter: Option<&EntityType>,
    ) -> Result<Vec<EntitySnapshot>, GraphError> {
        self.ensure_connected()?;
        let topology = self.inner.read();

        let mut nodes: Vec<_> = topology
            .graph
            .node_indices()
            .filter(|&n| type_filter.map_or(true, |t| &topology.graph[n].entity_type == t))
            .collect();
        nodes.sort_by(|a, b| topology.graph[*a].id.cmp(&topology.graph[*b].id));
        if type_filter.is_none() {
            nodes.truncate(self.snapshot_limit);
        }

        Ok(nodes.into_iter().map(|n| topology.snapshot(n)).collect())
    }

    fn get_entity(&self, id: &EntityId) -> Result<Entity, GraphError> {
        self.ensure_connected()?;
        let topology = self.inner.read();
        let node = topology.node(id)?;
        Ok(topology.graph[node].clone())
    }

    fn get_entity_status(&self, id: &EntityId) -> Result<EntityStatus, GraphError> {
        self.get_entity(id).map(|e| e.status)
    }

    fn contains_entity(&self, id: &EntityId) -> Result<bool, GraphError> {
        self.ensure_connected()?;
        Ok(self.inner.read().index.contains_key(id))
    }

    fn update_entity_status(
        &self,
        id: &EntityId,
        status: EntityStatus,
        causing_inject: Option<&str>,
    ) -> Result<StatusChange, GraphError> {
        self.ensure_connected()?;
        let mut topology = self.inner.write();
        let node = topology.node(id)?;
        let change = topology.record(node, status, causing_inject);
        tracing::debug!(
            entity = %change.entity_id,
            from = %change.from,
            to = %change.to,
            cause = ?change.causing_inject,
            "entity status updated"
        );
        Ok(change)
    }

    fn apply_status_batch(
        &self,
        changes: &[(EntityId, EntityStatus)],
        causing_inject: Option<&str>,
    ) -> Result<Vec<StatusChange>, GraphError> {
        self.ensure_connected()?;
        let mut topology = self.inner.write();

        let nodes = changes
            .iter()
            .map(|(id, _)| topology.node(id))
            .collect::<Result<Vec<_>, _>>()?;

        let applied: Vec<_> = nodes
            .into_iter()
            .zip(changes)
            .map(|(node, (_, status))| topology.record(node, status.clone(), causing_inject))
            .collect();

        tracing::debug!(
            count = applied.len(),
            cause = ?causing_inject,
            "status batch applied"
        );
        Ok(applied)
    }

    fn status_history(&self, id: &EntityId) -> Result<Vec<StatusChange>, GraphError> {
        self.ensure_connected()?;
        let topology = self.inner.read();
        topology.node(id)?;
        Ok(topology
            .history
            .iter()
            .filter(|c| &c.entity_id == id)
            .cloned()
            .collect())
    }

    fn get_affected_entities(
        &self,
        id: &EntityId,
        max_depth: usize,
    ) -> Result<Vec<EntityId>, GraphError> {
        self.ensure_connected()?;
        let topology = self.inner.read();
        let start = topology.node(id)?;
        Ok(topology
            .reach(start, max_depth)
            .into_iter()
            .map(|a| a.entity_id)
            .collect())
    }

    fn causal_predecessors(&self, id: &EntityId) -> Result<Vec<EntityId>, GraphError> {
        self.ensure_connected()?;
        let topology = self.inner.read();
        let node = topology.node(id)?;

        let mut sources: Vec<_> = topology
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|edge| edge.weight().is_causal())
            .map(|edge| topology.graph[edge.source()].id.clone())
            .collect();
        sources.sort();
        sources.dedup();
        Ok(sources)
    }

    fn calculate_cascading_impact(
        &self,
        id: &EntityId,
        new_status: &EntityStatus,
        max_depth: usize,
    ) -> Result<ImpactReport, GraphError> {
        self.ensure_connected()?;
        let topology = self.inner.read();
        let start = topology.node(id)?;
        let affected = topology.reach(start, max_depth);

        let report = ImpactReport::from_affected(id.clone(), new_status.clone(), affected);
        tracing::debug!(
            source = %id,
            status = %new_status,
            affected = report.affected_count(),
            severity = %report.impact_severity,
            "cascading impact computed"
        );
        Ok(report)
    }

    fn seed(
        &self,
        topology: &TopologyTemplate,
        clear_existing: bool,
    ) -> Result<SeedReport, GraphError> {
        self.ensure_connected()?;

        // leases are only taken under the read lock, so none can appear
        // between this check and the reset below
        let mut inner = self.inner.write();
        let active_runs = self.active_runs();
        if active_runs > 0 {
            return Err(GraphError::Busy { active_runs });
        }

        let existing: HashSet<EntityId> = if clear_existing {
            HashSet::new()
        } else {
            inner.index.keys().cloned().collect()
        };
        topology.validate_against(&existing)?;

        if clear_existing {
            *inner = Topology::default();
        }

        for entity in &topology.entities {
            let id = entity.id.clone();
            let node = inner.graph.add_node(entity.clone());
            inner.index.insert(id, node);
        }
        for rel in &topology.relationships {
            let from = inner.node(&rel.source)?;
            let to = inner.node(&rel.target)?;
            inner.graph.add_edge(from, to, rel.relationship_type);
        }

        let report = SeedReport {
            entities: topology.entities.len(),
            relationships: topology.relationships.len(),
            cleared: clear_existing,
        };
        tracing::info!(
            template = %topology.name,
            entities = report.entities,
            relationships = report.relationships,
            cleared = report.cleared,
            "topology seeded"
        );
        Ok(report)
    }

    fn begin_run(&self) -> Result<RunLease, GraphError> {
        self.ensure_connected()?;
        let _topology = self.inner.read();
        Ok(RunLease::acquire(Arc::clone(&self.active_runs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Relationship, RelationshipType::*};

    fn chain_store() -> GraphStore {
        let template = TopologyTemplate::new("chain")
            .with_entity(Entity::new("A", "Server", "a"))
            .with_entity(Entity::new("B", "Server", "b"))
            .with_entity(Entity::new("C", "Server", "c"))
            .with_entity(Entity::new("D", "Server", "d"))
            .with_relationship(Relationship::new("A", "B", RunsOn))
            .with_relationship(Relationship::new("B", "C", RunsOn))
            .with_relationship(Relationship::new("C", "D", RunsOn))
            .with_relationship(Relationship::new("A", "D", BacksUp));
        GraphStore::from_template(&template).unwrap()
    }

    #[test]
    fn traversal_respects_depth_and_whitelist() {
        let store = chain_store();
        let a = EntityId::from("A");

        assert_eq!(store.get_affected_entities(&a, 1).unwrap(), vec!["B".into()]);
        assert_eq!(
            store.get_affected_entities(&a, 3).unwrap(),
            vec![EntityId::from("B"), "C".into(), "D".into()]
        );
        assert!(store.get_affected_entities(&a, 0).unwrap().is_empty());
    }

    #[test]
    fn cycles_do_not_revisit_the_source() {
        let store = chain_store();
        let cyclic = TopologyTemplate::new("back-edge")
            .with_relationship(Relationship::new("D", "A", ConnectsTo));
        store.seed(&cyclic, false).unwrap();

        let affected = store.get_affected_entities(&"B".into(), 5).unwrap();
        assert_eq!(affected, vec![EntityId::from("C"), "D".into(), "A".into()]);
    }

    #[test]
    fn status_updates_are_audited() {
        let store = chain_store();
        let b = EntityId::from("B");

        store
            .update_entity_status(&b, EntityStatus::Suspicious, Some("INJ-001"))
            .unwrap();
        store
            .update_entity_status(&b, EntityStatus::Compromised, Some("INJ-002"))
            .unwrap();

        let history = store.status_history(&b).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from, EntityStatus::Online);
        assert_eq!(history[1].from, EntityStatus::Suspicious);
        assert_eq!(history[1].causing_inject.as_deref(), Some("INJ-002"));
        assert!(history[0].sequence < history[1].sequence);
        assert_eq!(store.get_entity_status(&b).unwrap(), EntityStatus::Compromised);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = chain_store();
        let result = store.apply_status_batch(
            &[
                ("A".into(), EntityStatus::Compromised),
                ("MISSING".into(), EntityStatus::Compromised),
            ],
            Some("INJ-009"),
        );
        assert_eq!(result, Err(GraphError::EntityNotFound("MISSING".into())));
        assert_eq!(store.get_entity_status(&"A".into()).unwrap(), EntityStatus::Online);
        assert!(store.status_history(&"A".into()).unwrap().is_empty());
    }

    #[test]
    fn predecessors_ignore_descriptive_edges() {
        let store = chain_store();
        assert!(store.causal_predecessors(&"A".into()).unwrap().is_empty());
        assert_eq!(
            store.causal_predecessors(&"D".into()).unwrap(),
            vec![EntityId::from("C")]
        );
    }

    #[test]
    fn snapshot_is_capped_when_unfiltered() {
        let mut template = TopologyTemplate::new("wide");
        for i in 0..5 {
            template = template.with_entity(Entity::new(format!("N{i}"), "Workstation", "n"));
        }
        let store = GraphStore::from_template(&template)
            .unwrap()
            .with_snapshot_limit(3);

        assert_eq!(store.get_current_state(None).unwrap().len(), 3);
        assert_eq!(
            store
                .get_current_state(Some(&EntityType::Workstation))
                .unwrap()
                .len(),
            5
        );
    }

    #[test]
    fn seed_refused_while_a_run_is_active() {
        let store = chain_store();
        let lease = store.begin_run().unwrap();
        let template = TopologyTemplate::new("empty");
        assert_eq!(
            store.seed(&template, true),
            Err(GraphError::Busy { active_runs: 1 })
        );
        drop(lease);
        store.seed(&template, true).unwrap();
        assert_eq!(store.entity_count(), 0);
    }
}
