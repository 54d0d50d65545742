//! Louvain local moving over a weighted undirected graph.
//!
//! Modularity of a partition:
//!
//! ```text
//! Q = Σ_c [ Σin_c / 2m − γ (Σtot_c / 2m)² ]
//! ```
//!
//! `Σin_c` counts every internal edge from both ends (a self-loop of weight
//! `w` contributes `2w`), `Σtot_c` is the summed degree of the community and
//! `m` is the total edge weight.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

pub const DEFAULT_RESOLUTION: f64 = 1.0;
pub const MAX_PASSES: usize = 100;

// Gains below this are treated as float noise.
const MIN_GAIN: f64 = 1e-12;

/// Flat adjacency view of a petgraph graph, indexed by node index.
#[derive(Debug, Clone)]
pub struct Adjacency {
    neighbors: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
    degree: Vec<f64>,
    total_weight: f64,
}

impl Adjacency {
    pub fn from_graph<N>(graph: &UnGraph<N, f64>) -> Self {
        let n = graph.node_count();
        let mut adj = Adjacency {
            neighbors: vec![Vec::new(); n],
            self_loops: vec![0.0; n],
            degree: vec![0.0; n],
            total_weight: 0.0,
        };

        for edge in graph.edge_references() {
            let (a, b, w) = (edge.source().index(), edge.target().index(), *edge.weight());
            if a == b {
                adj.self_loops[a] += w;
                adj.degree[a] += 2.0 * w;
            } else {
                adj.neighbors[a].push((b, w));
                adj.neighbors[b].push((a, w));
                adj.degree[a] += w;
                adj.degree[b] += w;
            }
            adj.total_weight += w;
        }
        adj
    }

    pub fn node_count(&self) -> usize {
        self.degree.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// `assignment` must hold one community id per node.
    pub(crate) fn modularity(&self, assignment: &[usize], resolution: f64) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let two_m = 2.0 * self.total_weight;
        let communities = assignment.iter().copied().max().map_or(0, |c| c + 1);

        let mut internal = vec![0.0; communities];
        let mut total = vec![0.0; communities];
        for node in 0..self.node_count() {
            let c = assignment[node];
            total[c] += self.degree[node];
            internal[c] += 2.0 * self.self_loops[node];
            internal[c] += self.neighbors[node]
                .iter()
                .filter(|(other, _)| assignment[*other] == c)
                .map(|(_, w)| w)
                .sum::<f64>();
        }

        // Sequential so the same partition always scores the same bits.
        internal
            .iter()
            .zip(&total)
            .map(|(inside, tot)| inside / two_m - resolution * (tot / two_m).powi(2))
            .sum()
    }
}

/// Outcome of one local-moving phase.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Community id per node, contiguous from zero in order of first appearance.
    pub assignment: Vec<usize>,
    pub communities: usize,
    pub modularity: f64,
    pub passes: usize,
}

#[derive(Debug, Clone)]
pub struct Louvain {
    resolution: f64,
    max_passes: usize,
}

impl Default for Louvain {
    fn default() -> Self {
        Louvain {
            resolution: DEFAULT_RESOLUTION,
            max_passes: MAX_PASSES,
        }
    }
}

impl Louvain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Greedily moves nodes between neighbouring communities, visiting them
    /// in a random order each pass, until a pass moves nothing.
    pub fn local_moving<R: Rng + ?Sized>(&self, adj: &Adjacency, rng: &mut R) -> Partition {
        let n = adj.node_count();
        let mut community: Vec<usize> = (0..n).collect();

        if adj.total_weight <= 0.0 {
            return Partition {
                assignment: community,
                communities: n,
                modularity: 0.0,
                passes: 0,
            };
        }

        let two_m = 2.0 * adj.total_weight;
        let mut tot: Vec<f64> = adj.degree.clone();
        let mut order: Vec<usize> = (0..n).collect();
        // Link weight per neighbouring community, with the communities in
        // first-seen order so ties resolve the same way for a given seed.
        let mut link_weight = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut passes = 0;

        while passes < self.max_passes {
            passes += 1;
            order.shuffle(rng);
            let mut moved = false;

            for &node in &order {
                let current = community[node];
                let k_i = adj.degree[node];

                for &c in &touched {
                    link_weight[c] = 0.0;
                }
                touched.clear();
                for &(other, w) in &adj.neighbors[node] {
                    let c = community[other];
                    if link_weight[c] == 0.0 && !touched.contains(&c) {
                        touched.push(c);
                    }
                    link_weight[c] += w;
                }

                tot[current] -= k_i;
                let gain = |c: usize| link_weight[c] - self.resolution * tot[c] * k_i / two_m;

                let mut best = current;
                let mut best_gain = gain(current);
                for &c in &touched {
                    let g = gain(c);
                    if g > best_gain + MIN_GAIN {
                        best = c;
                        best_gain = g;
                    }
                }

                tot[best] += k_i;
                if best != current {
                    community[node] = best;
                    moved = true;
                }
            }

            if !moved {
                break;
            }
        }

        let assignment = renumber(&community);
        let communities = assignment.iter().copied().max().map_or(0, |c| c + 1);
        let modularity = adj.modularity(&assignment, self.resolution);
        Partition {
            assignment,
            communities,
            modularity,
            passes,
        }
    }
}

fn renumber(community: &[usize]) -> Vec<usize> {
    let mut ids = HashMap::new();
    community
        .iter()
        .map(|c| {
            let next = ids.len();
            *ids.entry(*c).or_insert(next)
        })
        .collect()
}
