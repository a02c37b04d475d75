use std::cell::RefCell;
use std::rc::Rc;

use nanosim::config;
use nanosim::{aggregate, AttributeValue, Registry};

use crate::fixture::{build_graph, energy_model, with_node};

#[test]
fn wildcard_fans_out_over_every_vector_index() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    let updated = config::set(
        &registry,
        "/NodeA/NodeB/NodesB/*/TestInt16",
        &AttributeValue::Integer(7),
    );
    assert_eq!(updated, 4);
    for leaf in &graph.leaves {
        assert_eq!(with_node(leaf, |n| n.test_int), 7);
    }

    let paths: Vec<String> = config::lookup_matches(&registry, "/NodeA/NodeB/NodesB/*")
        .iter()
        .map(|m| m.path.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/NodeA/NodeB/NodesB/0",
            "/NodeA/NodeB/NodesB/1",
            "/NodeA/NodeB/NodesB/2",
            "/NodeA/NodeB/NodesB/3",
        ]
    );
    // The intermediate nodes were not touched.
    assert_eq!(with_node(&graph.b, |n| n.test_int), 0);
}

#[test]
fn range_and_alternation_matchers_select_subsets() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    assert_eq!(
        config::set_str(&registry, "/NodeA/NodeB/NodesB/[0-2]/TestInt16", "1"),
        3
    );
    assert_eq!(
        config::set_str(&registry, "/NodeA/NodeB/NodesB/1|3/TestInt16", "2"),
        2
    );

    let values: Vec<i64> = graph
        .leaves
        .iter()
        .map(|leaf| with_node(leaf, |n| n.test_int))
        .collect();
    assert_eq!(values, vec![1, 2, 1, 2]);
}

#[test]
fn matched_paths_carry_concrete_indices() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    let matches = config::lookup_matches(&registry, "/NodeA/NodeB/NodesB/[1-2]");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches.get_matched_path(0), Some("/NodeA/NodeB/NodesB/1"));
    assert_eq!(matches.get_matched_path(1), Some("/NodeA/NodeB/NodesB/2"));
    assert!(Rc::ptr_eq(
        &matches.get(0).expect("two matches").object,
        &graph.leaves[1]
    ));
}

#[test]
fn single_object_path_resolves_through_pointer_attributes() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    let matches = config::lookup_matches(&registry, "/NodeA/NodeB");
    assert_eq!(matches.len(), 1);
    assert!(Rc::ptr_eq(&matches.get(0).expect("one match").object, &graph.b));

    assert_eq!(
        config::set_str(&registry, "/NodeA/TestInt16", "11"),
        1
    );
    assert_eq!(with_node(&graph.a, |n| n.test_int), 11);
}

#[test]
fn named_objects_resolve_under_the_names_namespace() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);
    registry.add_name("server", Rc::clone(&graph.leaves[0]));

    assert_eq!(
        config::set_str(&registry, "/Names/server/TestInt16", "5"),
        1
    );
    assert_eq!(with_node(&graph.leaves[0], |n| n.test_int), 5);

    let matches = config::lookup_matches(&registry, "/Names/server");
    assert_eq!(matches.get_matched_path(0), Some("/Names/server"));

    assert!(config::lookup_matches(&registry, "/Names/printer").is_empty());
}

#[test]
fn dollar_segment_finds_aggregated_capabilities() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    let energy = energy_model(80.0);
    aggregate(&graph.a, &energy);

    assert_eq!(
        config::set_str(&registry, "/NodeA/$EnergyModel/Remaining", "30.5"),
        1
    );
    let remaining = energy
        .borrow()
        .as_any()
        .downcast_ref::<crate::fixture::EnergyModel>()
        .expect("fixture object is an EnergyModel")
        .remaining;
    assert_eq!(remaining, 30.5);

    // No such capability on the leaves.
    assert!(config::lookup_matches(&registry, "/NodeA/NodeB/$EnergyModel").is_empty());
}

#[test]
fn unresolvable_paths_match_nothing_without_failing() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    assert!(config::lookup_matches(&registry, "/NodeA/NoSuchChild/NodesB/*").is_empty());
    assert!(config::lookup_matches(&registry, "/NodeA/NodeB/NodesB/9").is_empty());
    assert_eq!(
        config::set_str(&registry, "/NodeA/NodeC/TestInt16", "1"),
        0
    );
    // A null pointer terminates the branch the same silent way.
    with_node(&graph.a, |n| n.node_b = None);
    assert!(config::lookup_matches(&registry, "/NodeA/NodeB/NodesB/*").is_empty());
}

#[test]
fn miss_hook_reports_where_a_branch_died() {
    let mut registry = Registry::new();
    build_graph(&mut registry);

    let misses = RefCell::new(Vec::new());
    let hook = |segment: &str, path: &str| {
        misses.borrow_mut().push((segment.to_string(), path.to_string()));
    };
    let matches =
        config::lookup_matches_with(&registry, "/NodeA/NodeB/NoSuchChild/TestInt16", Some(&hook));

    assert!(matches.is_empty());
    assert_eq!(
        *misses.borrow(),
        vec![("NoSuchChild".to_string(), "/NodeA/NodeB".to_string())]
    );
}

#[test]
fn empty_segments_are_ignored() {
    let mut registry = Registry::new();
    let graph = build_graph(&mut registry);

    let matches = config::lookup_matches(&registry, "//NodeA//NodeB/");
    assert_eq!(matches.len(), 1);
    assert!(Rc::ptr_eq(&matches.get(0).expect("one match").object, &graph.b));
}
