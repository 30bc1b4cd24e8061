//! Integration tests: laying out an engine-shaped analysis tree.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chess_core::history::replay_chain;
use chess_core::layout::{layout, LayoutConfig, TreeGraph};
use chess_core::rules::ShakmatyExecutor;
use common::*;

fn fixture_graph() -> TreeGraph {
    layout(Some(&Arc::new(opening_tree())), &LayoutConfig::default())
}

#[test]
fn test_every_node_and_edge() {
    let graph = fixture_graph();
    assert_eq!(graph.nodes.len(), 7);
    assert_eq!(graph.edges.len(), graph.nodes.len() - 1);

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["", "e2e4", "e2e4-e7e5", "e2e4-c7c5", "d2d4", "d2d4-d7d5", "d2d4-g8f6"]
    );

    let edge_ids: HashSet<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids.len(), graph.edges.len());
    assert!(edge_ids.contains("e2e4==>e2e4-c7c5"));
    assert!(edge_ids.contains("==>d2d4"));
}

#[test]
fn test_labels_and_source_data() {
    let graph = fixture_graph();
    let root = graph.root().unwrap();
    assert_eq!(root.display_label, "start");
    assert_eq!(root.source_node.game_counts.p1, 40);

    let nf6 = graph.node("d2d4-g8f6").unwrap();
    assert_eq!(nf6.display_label, "Nf6");
    assert_eq!(nf6.parent_id.as_deref(), Some("d2d4"));

    let e4 = graph.node("e2e4").unwrap();
    assert_eq!(e4.source_node.evaluation_centipawns, 30);
    assert_eq!(e4.source_node.actual_results.p1.wins, 14.0);
    assert_eq!(e4.source_node.play_rate(), 0.7);

    let children: Vec<&str> = graph.children("e2e4").map(|n| n.id.as_str()).collect();
    assert_eq!(children, vec!["e2e4-e7e5", "e2e4-c7c5"]);
}

#[test]
fn test_ancestor_chains_replay() {
    let graph = fixture_graph();
    for node in &graph.nodes {
        assert_eq!(node.ancestor_chain.len(), node.depth + 1);
        assert_eq!(node.ancestor_chain[0].position, START);
        assert!(node.ancestor_chain[0].mv.is_none());

        let last = replay_chain(&ShakmatyExecutor, &node.ancestor_chain).unwrap();
        assert_eq!(last, node.source_node.position, "node {}", node.id);
    }
}

#[test]
fn test_geometry() {
    let graph = fixture_graph();
    let config = LayoutConfig::default();
    // Four leaves wide, two levels deep
    let width = 4.0 * config.node_width;

    for node in &graph.nodes {
        assert_eq!(node.coordinates.y, node.depth as f64 * config.node_height);
        assert!(node.coordinates.x >= 0.0 && node.coordinates.x <= width);
    }

    // Within a level, preorder is left to right and nodes never overlap
    for depth in 0..=2 {
        let xs: Vec<f64> = graph
            .nodes
            .iter()
            .filter(|n| n.depth == depth)
            .map(|n| n.coordinates.x)
            .collect();
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] > 1.0, "overlap at depth {depth}: {xs:?}");
        }
    }

    // Parents sit centred over their children
    let e4 = graph.node("e2e4").unwrap().coordinates.x;
    let e5 = graph.node("e2e4-e7e5").unwrap().coordinates.x;
    let c5 = graph.node("e2e4-c7c5").unwrap().coordinates.x;
    assert!((e4 - (e5 + c5) / 2.0).abs() < 1e-9);
}

#[test]
fn test_custom_unit_size() {
    let config = LayoutConfig {
        node_width: 50.0,
        node_height: 80.0,
        ..LayoutConfig::default()
    };
    let graph = layout(Some(&Arc::new(opening_tree())), &config);
    let leaf = graph.node("d2d4-d7d5").unwrap();
    assert_eq!(leaf.coordinates.y, 160.0);
    assert!(graph.nodes.iter().all(|n| n.coordinates.x <= 200.0));
}

#[test]
fn test_layout_is_repeatable() {
    let a = serde_json::to_value(fixture_graph()).unwrap();
    let b = serde_json::to_value(fixture_graph()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a["nodes"][1]["displayLabel"], "e4");
}

#[test]
fn test_null_tree() {
    let tree: Option<chess_core::analysis_tree::AnalysisNode> =
        serde_json::from_value(serde_json::Value::Null).unwrap();
    let graph = layout(tree.map(Arc::new).as_ref(), &LayoutConfig::default());
    assert!(graph.is_empty());
    assert!(graph.edges.is_empty());
}
