//! Idea schema: the causal structure of a node subset, with a markdown view.

use serde::{Deserialize, Serialize};

use crate::metrics::SchemaMetrics;
use crate::model::{NodeType, RelationEdge, RelationNode};

pub const SCHEMA_VERSION: &str = "2.0.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub problems: Vec<String>,
    pub mechanisms: Vec<String>,
    pub outcomes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaSchema {
    pub nodes: Vec<RelationNode>,
    pub edges: Vec<RelationEdge>,
    pub summary: SchemaSummary,
    pub metrics: SchemaMetrics,
    pub version: String,
}

impl IdeaSchema {
    pub fn new(nodes: Vec<RelationNode>, edges: Vec<RelationEdge>) -> Self {
        let titles = |t: NodeType| -> Vec<String> {
            nodes.iter().filter(|n| n.node_type == t).map(RelationNode::title).collect()
        };
        let summary = SchemaSummary {
            problems: titles(NodeType::Problem),
            mechanisms: titles(NodeType::Mechanism),
            outcomes: titles(NodeType::Outcome),
        };
        let metrics = SchemaMetrics::compute(&nodes, &edges);
        Self { nodes, edges, summary, metrics, version: SCHEMA_VERSION.to_string() }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Idea Spec (v{})\n", self.version);
        let sections: [(&str, &[String]); 3] = [
            ("Problems", &self.summary.problems),
            ("Mechanisms", &self.summary.mechanisms),
            ("Outcomes", &self.summary.outcomes),
        ];
        for (i, (heading, items)) in sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("## {heading}\n"));
            for item in items.iter() {
                out.push_str(&format!("- {item}\n"));
            }
        }
        out.push_str("\n## Risks\n- (fill)\n\n## Next Steps\n- (fill)\n");
        out
    }
}
