//! Paper network for graph visualization
//!
//! The graph is a star: the target sits at the centre and every edge runs
//! from the target to one candidate. Tag and author evidence for the same
//! pair merge into a single edge.

use crate::overlap::{shared_authors, shared_tags};
use crate::paper::PaperRecord;
use crate::score::ScoringWeights;
use serde::Serialize;
use uuid::Uuid;

/// Candidates rendered around one target
pub const MAX_NETWORK_CANDIDATES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub label: String,
    pub url: String,
    pub tags: Vec<String>,
    #[serde(rename = "isTarget")]
    pub is_target: bool,
}

impl GraphNode {
    fn from_paper(paper: &PaperRecord, is_target: bool) -> Self {
        Self {
            id: paper.id,
            label: paper.title.clone(),
            url: paper.url.clone(),
            tags: paper.tags.clone(),
            is_target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: Uuid,
    pub to: Uuid,
    pub label: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl NetworkGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn target(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.is_target)
    }
}

/// Build the star graph around `target` using the default weights
pub fn build_network(target: &PaperRecord, pool: &[PaperRecord]) -> NetworkGraph {
    build_network_with(target, pool, &ScoringWeights::DEFAULT)
}

/// Build the star graph around `target`
///
/// Only candidates sharing at least one tag with the target join the graph,
/// at most [`MAX_NETWORK_CANDIDATES`] of them in pool order.
pub fn build_network_with(
    target: &PaperRecord,
    pool: &[PaperRecord],
    weights: &ScoringWeights,
) -> NetworkGraph {
    let target_authors = target.author_list();
    let mut nodes = vec![GraphNode::from_paper(target, true)];
    let mut edges = Vec::new();

    let neighbours = pool
        .iter()
        .filter(|candidate| candidate.id != target.id)
        .map(|candidate| (candidate, shared_tags(&target.tags, &candidate.tags)))
        .filter(|(_, tags)| !tags.is_empty())
        .take(MAX_NETWORK_CANDIDATES);

    for (candidate, tags) in neighbours {
        nodes.push(GraphNode::from_paper(candidate, false));

        let authors = shared_authors(&target_authors, &candidate.author_list());
        if let Some(label) = edge_label(&tags, &authors) {
            edges.push(GraphEdge {
                from: target.id,
                to: candidate.id,
                label,
                weight: weights.edge_weight(tags.len(), authors.len()),
            });
        }
    }

    NetworkGraph { nodes, edges }
}

/// `"a, b | Authors: x, y"`, or `None` without any evidence
fn edge_label(tags: &[String], authors: &[String]) -> Option<String> {
    match (tags.is_empty(), authors.is_empty()) {
        (true, true) => None,
        (false, true) => Some(tags.join(", ")),
        (true, false) => Some(format!("Authors: {}", authors.join(", "))),
        (false, false) => Some(format!("{} | Authors: {}", tags.join(", "), authors.join(", "))),
    }
}
