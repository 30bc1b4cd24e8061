//! Tree layout engine: turns an analysis tree into a positioned graph.
//!
//! Every graph node carries the ancestor chain from the root to itself, in the
//! same shape as [`History`](crate::history::History), so selecting a node
//! can replace the active history without touching the tree again.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::analysis_tree::AnalysisNode;
use crate::history::HistoryEntry;
use crate::rules::BoardMove;
use crate::tidy::{tidy_positions, Separation, TidyPoint};

pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEIGHT: f64 = 200.0;

/// Label shown for the root node.
pub const START_LABEL: &str = "start";

/// Separator between move codes in node ids.
const ID_SEPARATOR: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal space per leaf.
    pub node_width: f64,
    /// Vertical space per tree level.
    pub node_height: f64,
    pub separation: Separation,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            separation: Separation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Move codes from the root joined by `-`; the root's id is empty.
    pub id: String,
    pub display_label: String,
    #[serde(serialize_with = "serialize_summary")]
    pub source_node: Arc<AnalysisNode>,
    pub ancestor_chain: Vec<HistoryEntry>,
    pub coordinates: Point,
    pub depth: usize,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TreeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }

    /// Children of `id` in tree order.
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id)
            .filter_map(|e| self.node(&e.target))
    }
}

/// Lay out `root`. An absent root, or one without a position, yields an empty
/// graph.
pub fn layout(root: Option<&Arc<AnalysisNode>>, config: &LayoutConfig) -> TreeGraph {
    let root = match root {
        Some(r) if !r.position.is_empty() => r,
        Some(_) => {
            warn!("Analysis tree root has no position, nothing to lay out");
            return TreeGraph::default();
        }
        None => return TreeGraph::default(),
    };

    let mut walk = Walk::default();
    let root_chain = vec![HistoryEntry::start(root.position.clone())];
    walk.visit(root, None, String::new(), root_chain);

    let points = tidy_positions(&walk.children, config.separation);
    let coordinates = scale(&points, &walk, config);

    let mut graph = TreeGraph::default();
    for (i, visited) in walk.nodes.into_iter().enumerate() {
        let parent_id = visited.parent.map(|p| graph.nodes[p].id.clone());
        if let Some(source) = &parent_id {
            graph.edges.push(GraphEdge {
                id: format!("{source}==>{}", visited.id),
                source: source.clone(),
                target: visited.id.clone(),
            });
        }

        graph.index.insert(visited.id.clone(), i);
        graph.nodes.push(GraphNode {
            display_label: visited
                .node
                .move_notation
                .clone()
                .unwrap_or_else(|| START_LABEL.to_string()),
            id: visited.id,
            source_node: visited.node,
            ancestor_chain: visited.chain,
            coordinates: coordinates[i],
            depth: points[i].depth,
            parent_id,
        });
    }

    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Laid out analysis tree"
    );
    graph
}

struct Visited {
    id: String,
    node: Arc<AnalysisNode>,
    parent: Option<usize>,
    chain: Vec<HistoryEntry>,
}

/// Depth-first collection of nodes in preorder.
#[derive(Default)]
struct Walk {
    nodes: Vec<Visited>,
    children: Vec<Vec<usize>>,
}

impl Walk {
    fn visit(
        &mut self,
        node: &Arc<AnalysisNode>,
        parent: Option<usize>,
        id: String,
        chain: Vec<HistoryEntry>,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Visited {
            id: id.clone(),
            node: Arc::clone(node),
            parent,
            chain: chain.clone(),
        });
        self.children.push(Vec::new());

        for child in &node.children {
            // A subtree the history cannot replay into is left out
            let Some((code, mv)) = chain_move(child) else {
                continue;
            };
            let child_id = if id.is_empty() {
                code.to_string()
            } else {
                format!("{id}{ID_SEPARATOR}{code}")
            };

            let mut child_chain = chain.clone();
            child_chain.push(HistoryEntry {
                position: child.position.clone(),
                mv: Some(mv),
            });

            let c = self.visit(child, Some(index), child_id, child_chain);
            self.children[index].push(c);
        }

        index
    }

    fn parent(&self, i: usize) -> Option<usize> {
        self.nodes[i].parent
    }
}

fn chain_move(node: &AnalysisNode) -> Option<(&str, BoardMove)> {
    let Some(code) = node.move_code.as_deref() else {
        warn!(position = %node.position, "Dropping tree node without a move code");
        return None;
    };
    match BoardMove::from_code(code) {
        Ok(mv) => Some((code, mv)),
        Err(e) => {
            warn!(position = %node.position, error = %e, "Dropping tree node with an unreadable move code");
            None
        }
    }
}

/// Fit the tidy positions into a box `leaves × node_width` wide and
/// `height × node_height` tall. The outermost nodes keep half a separation
/// of margin.
fn scale(points: &[TidyPoint], walk: &Walk, config: &LayoutConfig) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }

    let leaves = walk.children.iter().filter(|c| c.is_empty()).count();
    let height = points.iter().map(|p| p.depth).max().unwrap_or(0);
    let width = leaves as f64 * config.node_width;

    let mut left = 0;
    let mut right = 0;
    for (i, p) in points.iter().enumerate() {
        if p.x < points[left].x {
            left = i;
        }
        if p.x > points[right].x {
            right = i;
        }
    }

    let gap = |a: usize, b: usize| {
        if walk.parent(a) == walk.parent(b) {
            config.separation.siblings
        } else {
            config.separation.cousins
        }
    };

    let tx = gap(left, right) / 2.0 - points[left].x;
    let kx = width / (points[right].x + gap(right, left) / 2.0 + tx);
    let ky = if height > 0 { config.node_height } else { 0.0 };

    points
        .iter()
        .map(|p| Point {
            x: (p.x + tx) * kx,
            y: p.depth as f64 * ky,
        })
        .collect()
}

fn serialize_summary<S: Serializer>(node: &Arc<AnalysisNode>, s: S) -> Result<S::Ok, S::Error> {
    node.summary().serialize(s)
}
