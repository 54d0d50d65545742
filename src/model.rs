use std::collections::HashMap;
use std::fmt;

/// Result of one community detection run over a [`GraphWrapper`](crate::GraphWrapper).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityModel {
    pub level: usize,
    /// Community id per graph node, indexed like the graph's nodes.
    pub assignment: Vec<usize>,
    pub community_count: usize,
    pub modularity: f64,
    pub passes: usize,
    /// Original vertex ids per community.
    pub members: Vec<Vec<String>>,
}

impl CommunityModel {
    pub fn get_communities(&self) -> HashMap<usize, Vec<String>> {
        self.members
            .iter()
            .enumerate()
            .map(|(id, members)| (id, members.clone()))
            .collect()
    }

    pub fn community_of(&self, vertex_id: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|members| members.iter().any(|m| m == vertex_id))
    }

    pub fn largest_community(&self) -> usize {
        self.members.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl fmt::Display for CommunityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommunityModel(level={}, communities={}, modularity={:.4})",
            self.level, self.community_count, self.modularity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CommunityModel {
        CommunityModel {
            level: 2,
            assignment: vec![0, 1, 0],
            community_count: 2,
            modularity: 0.357_142_8,
            passes: 2,
            members: vec![
                vec!["a".into(), "b".into(), "e".into()],
                vec!["c".into(), "d".into()],
            ],
        }
    }

    #[test]
    fn display_rounds_modularity_to_four_places() {
        assert_eq!(
            model().to_string(),
            "CommunityModel(level=2, communities=2, modularity=0.3571)"
        );
    }

    #[test]
    fn lookup_by_original_vertex() {
        let model = model();
        assert_eq!(model.community_of("d"), Some(1));
        assert_eq!(model.community_of("zzz"), None);
        assert_eq!(model.largest_community(), 3);
        assert_eq!(model.get_communities()[&0].len(), 3);
    }
}
