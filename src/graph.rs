use crate::error::{GraphError, Result};
use crate::loader::{self, Edge, Vertex};
use crate::louvain::{Adjacency, Louvain};
use crate::model::CommunityModel;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::{Rng, thread_rng};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A vertex of a wrapper graph. At level 0 it is one loaded vertex; above
/// that it stands for a whole community of the level below.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    /// Display label: the vertex `name` when the file has one, else the id.
    pub label: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GraphWrapper {
    graph: UnGraph<Node, f64>,
    level: usize,
    louvain: Louvain,
}

impl GraphWrapper {
    /// Builds the level-0 graph. Parallel edges are merged by summing weights.
    pub fn new(vertices: Vec<Vertex>, edges: Vec<Edge>) -> Result<Self> {
        loader::validate_weights(&edges)?;

        let mut graph = UnGraph::with_capacity(vertices.len(), edges.len());
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::with_capacity(vertices.len());

        for vertex in vertices {
            if node_indices.contains_key(&vertex.id) {
                return Err(GraphError::DuplicateVertex(vertex.id));
            }
            let index = graph.add_node(Node {
                label: vertex.name.unwrap_or_else(|| vertex.id.clone()),
                id: vertex.id.clone(),
                members: vec![vertex.id.clone()],
            });
            node_indices.insert(vertex.id, index);
        }

        for edge in edges {
            let lookup = |id: &str| {
                node_indices
                    .get(id)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownVertex {
                        src: edge.src.clone(),
                        dst: edge.dst.clone(),
                        missing: id.to_string(),
                    })
            };
            let node1 = lookup(&edge.src)?;
            let node2 = lookup(&edge.dst)?;

            if let Some(existing) = graph.find_edge(node1, node2) {
                graph[existing] += edge.weight;
            } else {
                graph.add_edge(node1, node2, edge.weight);
            }
        }

        info!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(GraphWrapper {
            graph,
            level: 0,
            louvain: Louvain::new(),
        })
    }

    pub fn with_louvain(mut self, louvain: Louvain) -> Self {
        self.louvain = louvain;
        self
    }

    pub fn graph(&self) -> &UnGraph<Node, f64> {
        &self.graph
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    pub fn modularity(&self, assignment: &[usize]) -> Result<f64> {
        self.check_covers(assignment.len())?;
        Ok(Adjacency::from_graph(&self.graph).modularity(assignment, self.louvain.resolution()))
    }

    fn check_covers(&self, got: usize) -> Result<()> {
        let expected = self.graph.node_count();
        if got != expected {
            return Err(GraphError::ModelMismatch { expected, got });
        }
        Ok(())
    }

    fn check_model(&self, model: &CommunityModel) -> Result<()> {
        self.check_covers(model.assignment.len())?;
        let count = model.members.len();
        match model.assignment.iter().find(|&&c| c >= count) {
            Some(&community) => Err(GraphError::UnknownCommunity { community, count }),
            None => Ok(()),
        }
    }

    pub fn find_communities(&self) -> CommunityModel {
        self.find_communities_with(&mut thread_rng())
    }

    /// Runs detection from scratch on the current graph. Nothing is cached,
    /// so repeated calls may disagree when the visiting order changes the
    /// outcome.
    pub fn find_communities_with<R: Rng + ?Sized>(&self, rng: &mut R) -> CommunityModel {
        let adj = Adjacency::from_graph(&self.graph);
        let partition = self.louvain.local_moving(&adj, rng);

        let mut members = vec![Vec::new(); partition.communities];
        for (node, &community) in self.graph.node_weights().zip(&partition.assignment) {
            members[community].extend(node.members.iter().cloned());
        }

        debug!(
            level = self.level,
            communities = partition.communities,
            passes = partition.passes,
            "modularity {:.4}",
            partition.modularity
        );

        CommunityModel {
            level: self.level,
            assignment: partition.assignment,
            community_count: partition.communities,
            modularity: partition.modularity,
            passes: partition.passes,
            members,
        }
    }

    pub fn get_community_gw(&self) -> GraphWrapper {
        self.get_community_gw_with(&mut thread_rng())
    }

    pub fn get_community_gw_with<R: Rng + ?Sized>(&self, rng: &mut R) -> GraphWrapper {
        let model = self.find_communities_with(rng);
        self.collapse(&model)
    }

    /// Collapses every community of `model` into one super-vertex. Weight
    /// between communities is summed; weight inside a community becomes a
    /// self-loop, so the total weight is unchanged. The model must come
    /// from this graph.
    pub fn aggregate(&self, model: &CommunityModel) -> Result<GraphWrapper> {
        self.check_model(model)?;
        Ok(self.collapse(model))
    }

    fn collapse(&self, model: &CommunityModel) -> GraphWrapper {
        let level = self.level + 1;
        let mut graph = UnGraph::with_capacity(model.community_count, self.graph.edge_count());

        let super_nodes: Vec<NodeIndex> = model
            .members
            .iter()
            .enumerate()
            .map(|(community, members)| {
                let id = format!("L{}C{}", level, community);
                graph.add_node(Node {
                    label: id.clone(),
                    id,
                    members: members.clone(),
                })
            })
            .collect();

        let mut weights: HashMap<(usize, usize), f64> = HashMap::new();
        for edge in self.graph.edge_references() {
            let a = model.assignment[edge.source().index()];
            let b = model.assignment[edge.target().index()];
            *weights.entry((a.min(b), a.max(b))).or_insert(0.0) += *edge.weight();
        }

        let mut pairs: Vec<_> = weights.into_iter().collect();
        pairs.sort_by_key(|(pair, _)| *pair);
        for ((a, b), weight) in pairs {
            graph.add_edge(super_nodes[a], super_nodes[b], weight);
        }

        info!(
            "Aggregated level {} ({} nodes) into level {} ({} nodes)",
            self.level,
            self.graph.node_count(),
            level,
            graph.node_count()
        );
        GraphWrapper {
            graph,
            level,
            louvain: self.louvain.clone(),
        }
    }

    /// Writes the graph as Graphviz DOT, filling nodes by community.
    pub fn save_dot(&self, model: &CommunityModel, filename: impl AsRef<Path>) -> Result<()> {
        self.check_model(model)?;
        let node_attrs = |_, (index, node): (NodeIndex, &Node)| {
            let hue = model
                .assignment
                .get(index.index())
                .map_or(0, |comm_id| (comm_id * 60) % 360);
            format!(
                "label=\"{}\", style=filled, fillcolor=\"{:.3} 0.5 0.7\"",
                dot_escape(&node.label),
                hue as f32 / 360.0
            )
        };
        let dot = Dot::with_attr_getters(
            &self.graph,
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &|_, edge| format!("label=\"{}\"", edge.weight()),
            &node_attrs,
        );

        std::fs::write(filename, format!("{:?}", dot))?;
        Ok(())
    }
}

// Quotes and backslashes would end or corrupt a quoted DOT string.
fn dot_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn vertices(ids: &[&str]) -> Vec<Vertex> {
        ids.iter()
            .map(|id| Vertex {
                id: id.to_string(),
                name: None,
            })
            .collect()
    }

    fn two_triangles() -> GraphWrapper {
        let edges = vec![
            Edge::new("a", "b", 1.0),
            Edge::new("b", "c", 1.0),
            Edge::new("c", "a", 1.0),
            Edge::new("d", "e", 1.0),
            Edge::new("e", "f", 1.0),
            Edge::new("f", "d", 1.0),
            Edge::new("c", "d", 1.0),
        ];
        GraphWrapper::new(vertices(&["a", "b", "c", "d", "e", "f"]), edges).unwrap()
    }

    #[test]
    fn parallel_edges_are_merged() {
        let edges = vec![Edge::new("a", "b", 2.0), Edge::new("b", "a", 3.0)];
        let gw = GraphWrapper::new(vertices(&["a", "b"]), edges).unwrap();

        assert_eq!(gw.edge_count(), 1);
        assert_eq!(gw.total_weight(), 5.0);
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let edges = vec![Edge::new("a", "ghost", 1.0)];
        let err = GraphWrapper::new(vertices(&["a"]), edges).unwrap_err();
        assert!(matches!(err, GraphError::UnknownVertex { missing, .. } if missing == "ghost"));
    }

    #[test]
    fn detection_groups_original_vertices() {
        let gw = two_triangles();
        let model = gw.find_communities_with(&mut StdRng::seed_from_u64(3));

        assert_eq!(model.level, 0);
        assert_eq!(model.community_count, 2);
        assert_eq!(model.community_of("a"), model.community_of("c"));
        assert_ne!(model.community_of("a"), model.community_of("f"));
    }

    #[test]
    fn aggregation_preserves_weight_and_modularity() {
        let gw = two_triangles();
        let model = gw.find_communities_with(&mut StdRng::seed_from_u64(11));
        let coarse = gw.aggregate(&model).unwrap();

        assert_eq!(coarse.level(), 1);
        assert_eq!(coarse.node_count(), model.community_count);
        assert!((coarse.total_weight() - gw.total_weight()).abs() < 1e-9);

        let identity: Vec<usize> = (0..coarse.node_count()).collect();
        assert!((coarse.modularity(&identity).unwrap() - model.modularity).abs() < 1e-9);

        let mut all: Vec<String> = coarse
            .graph()
            .node_weights()
            .flat_map(|n| n.members.clone())
            .collect();
        all.sort();
        assert_eq!(all, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn internal_weight_becomes_self_loop() {
        let gw = two_triangles();
        let model = gw.find_communities_with(&mut StdRng::seed_from_u64(5));
        let coarse = gw.aggregate(&model).unwrap();

        let loops: Vec<f64> = coarse
            .graph()
            .edge_references()
            .filter(|e| e.source() == e.target())
            .map(|e| *e.weight())
            .collect();
        assert_eq!(loops, vec![3.0, 3.0]);
        assert_eq!(coarse.edge_count(), 3);
    }

    #[test]
    fn repeated_coarsening_bumps_level() {
        let mut gw = two_triangles();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..2 {
            gw = gw.get_community_gw_with(&mut rng);
        }
        assert_eq!(gw.level(), 2);

        let model = gw.find_communities_with(&mut rng);
        assert_eq!(model.level, 2);
        let total: usize = model.members.iter().map(Vec::len).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn dot_export_colours_nodes() {
        let gw = two_triangles();
        let model = gw.find_communities_with(&mut StdRng::seed_from_u64(2));
        let file = tempfile::NamedTempFile::new().unwrap();

        gw.save_dot(&model, file.path()).unwrap();
        let dot = std::fs::read_to_string(file.path()).unwrap();
        assert!(dot.starts_with("graph {"));
        assert!(dot.contains("label=\"a\""));
        assert!(dot.contains("fillcolor="));
    }

    #[test]
    fn dot_labels_use_escaped_vertex_names() {
        let vertices = vec![
            Vertex {
                id: "a\"b".to_string(),
                name: None,
            },
            Vertex {
                id: "c".to_string(),
                name: Some("back\\slash".to_string()),
            },
        ];
        let gw = GraphWrapper::new(vertices, vec![Edge::new("a\"b", "c", 1.0)]).unwrap();
        let model = gw.find_communities_with(&mut StdRng::seed_from_u64(1));
        let file = tempfile::NamedTempFile::new().unwrap();

        gw.save_dot(&model, file.path()).unwrap();
        let dot = std::fs::read_to_string(file.path()).unwrap();
        assert!(dot.contains(r#"label="a\"b""#));
        assert!(dot.contains(r#"label="back\\slash""#));
        assert!(!dot.contains(r#"label="a"b""#));
        assert_eq!(gw.graph().node_weights().nth(1).unwrap().label, "back\\slash");
    }

    #[test]
    fn model_from_another_graph_is_rejected() {
        let small = GraphWrapper::new(vertices(&["x"]), vec![]).unwrap();
        let foreign = small.find_communities_with(&mut StdRng::seed_from_u64(1));
        let gw = two_triangles();

        assert!(matches!(
            gw.aggregate(&foreign),
            Err(GraphError::ModelMismatch { expected: 6, got: 1 })
        ));
        assert!(matches!(
            gw.save_dot(&foreign, "unused.dot"),
            Err(GraphError::ModelMismatch { .. })
        ));
        assert!(matches!(
            gw.modularity(&[0, 0]),
            Err(GraphError::ModelMismatch { expected: 6, got: 2 })
        ));
    }

    #[test]
    fn assignment_past_member_list_is_rejected() {
        let gw = two_triangles();
        let mut model = gw.find_communities_with(&mut StdRng::seed_from_u64(3));
        model.assignment[0] = model.members.len();

        assert!(matches!(
            gw.aggregate(&model),
            Err(GraphError::UnknownCommunity { .. })
        ));
    }
}
