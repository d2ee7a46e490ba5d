use crisis_graph::prelude::*;
use crisis_graph::{classify_severity, impact_score};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn runs_on_store(node_count: usize, edges: &[(usize, usize)]) -> GraphStore {
    let mut template = TopologyTemplate::new("random");
    for i in 0..node_count {
        template = template.with_entity(Entity::new(format!("N{i:02}"), "Server", "node"));
    }
    for &(from, to) in edges {
        if from < node_count && to < node_count && from != to {
            template = template.with_relationship(Relationship::new(
                format!("N{from:02}"),
                format!("N{to:02}"),
                RelationshipType::RunsOn,
            ));
        }
    }
    GraphStore::from_template(&template).unwrap()
}

fn statuses() -> impl Strategy<Value = EntityStatus> {
    prop_oneof![
        Just(EntityStatus::Compromised),
        Just(EntityStatus::Encrypted),
        Just(EntityStatus::Offline),
        Just(EntityStatus::Degraded),
        Just(EntityStatus::Suspicious),
    ]
}

proptest! {
    #[test]
    fn prop_two_single_hops_equal_one_double_hop(
        node_count in 2..12usize,
        edges in proptest::collection::vec((0..12usize, 0..12usize), 0..40),
        start in 0..12usize,
    ) {
        let store = runs_on_store(node_count, &edges);
        let start = EntityId::new(format!("N{:02}", start % node_count));

        let first: BTreeSet<EntityId> =
            store.get_affected_entities(&start, 1).unwrap().into_iter().collect();
        let mut chained = first.clone();
        for hop in &first {
            chained.extend(store.get_affected_entities(hop, 1).unwrap());
        }
        chained.remove(&start);

        let direct: BTreeSet<EntityId> =
            store.get_affected_entities(&start, 2).unwrap().into_iter().collect();
        prop_assert_eq!(chained, direct);
    }

    #[test]
    fn prop_traversal_never_reports_source_or_duplicates(
        node_count in 1..12usize,
        edges in proptest::collection::vec((0..12usize, 0..12usize), 0..40),
        depth in 0..6usize,
    ) {
        let store = runs_on_store(node_count, &edges);
        let start = EntityId::new("N00");
        let affected = store.get_affected_entities(&start, depth).unwrap();

        let unique: BTreeSet<_> = affected.iter().cloned().collect();
        prop_assert_eq!(unique.len(), affected.len());
        prop_assert!(!unique.contains(&start));

        let report = store
            .calculate_cascading_impact(&start, &EntityStatus::Compromised, depth)
            .unwrap();
        prop_assert!(report.max_depth_found <= depth);
        prop_assert!(report.affected.windows(2).all(|w| w[0].depth <= w[1].depth));
    }

    #[test]
    fn prop_severity_monotonic_in_count_and_depth(
        count in 0..20usize,
        depth in 0..6usize,
        status in statuses(),
    ) {
        let base = impact_score(count, depth, &status);
        prop_assert!(impact_score(count + 1, depth, &status) >= base);
        prop_assert!(impact_score(count, depth + 1, &status) >= base);
        prop_assert!(classify_severity(impact_score(count + 1, depth + 1, &status))
            >= classify_severity(base));
    }
}
