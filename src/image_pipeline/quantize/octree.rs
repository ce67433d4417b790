//! Octree color reduction.
//!
//! Each level splits RGB space on one bit per channel, most significant bit
//! first. Whenever the tree holds more leaves than allowed, the lightest
//! internal node on the deepest populated level absorbs its children.

const MAX_DEPTH: usize = 8;

#[derive(Debug, Default, Clone)]
struct Node {
    children: [Option<usize>; 8],
    red: u64,
    green: u64,
    blue: u64,
    weight: u64,
    leaf: bool,
}

/// Weighted octree over RGB colors with a bounded leaf count
#[derive(Debug)]
pub struct Octree {
    nodes: Vec<Node>,
    reducible: [Vec<usize>; MAX_DEPTH],
    leaf_count: usize,
    max_leaves: usize,
}

fn child_slot(color: [u8; 3], level: usize) -> usize {
    let shift = 7 - level;
    let bit = |c: u8| ((c >> shift) & 1) as usize;
    (bit(color[0]) << 2) | (bit(color[1]) << 1) | bit(color[2])
}

impl Octree {
    /// Creates an empty tree that keeps at most `max_leaves` colors (minimum 1).
    pub fn new(max_leaves: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            reducible: Default::default(),
            leaf_count: 0,
            max_leaves: max_leaves.max(1),
        };
        tree.push_node(0);
        tree
    }

    fn push_node(&mut self, level: usize) -> usize {
        let id = self.nodes.len();
        let leaf = level == MAX_DEPTH;
        self.nodes.push(Node {
            leaf,
            ..Node::default()
        });
        if leaf {
            self.leaf_count += 1;
        } else {
            self.reducible[level].push(id);
        }
        id
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Adds `color` with the given weight. Zero weights are ignored.
    pub fn insert(&mut self, color: [u8; 3], weight: u64) {
        if weight == 0 {
            return;
        }

        let mut node = 0;
        for level in 0..MAX_DEPTH {
            if self.nodes[node].leaf {
                break;
            }
            let slot = child_slot(color, level);
            node = match self.nodes[node].children[slot] {
                Some(child) => child,
                None => {
                    let child = self.push_node(level + 1);
                    self.nodes[node].children[slot] = Some(child);
                    child
                }
            };
        }

        let leaf = &mut self.nodes[node];
        leaf.red += color[0] as u64 * weight;
        leaf.green += color[1] as u64 * weight;
        leaf.blue += color[2] as u64 * weight;
        leaf.weight += weight;

        while self.leaf_count > self.max_leaves {
            if !self.reduce() {
                break;
            }
        }
    }

    fn subtree_weight(&self, id: usize) -> u64 {
        self.nodes[id]
            .children
            .iter()
            .flatten()
            .map(|&child| self.nodes[child].weight)
            .sum()
    }

    /// Folds one internal node into a leaf. Returns false when nothing is left to fold.
    fn reduce(&mut self) -> bool {
        let Some(level) = (0..MAX_DEPTH).rev().find(|&l| !self.reducible[l].is_empty()) else {
            return false;
        };

        // Children of the deepest reducible level are all leaves
        let position = self.reducible[level]
            .iter()
            .enumerate()
            .min_by_key(|&(_, &id)| self.subtree_weight(id))
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        let id = self.reducible[level].swap_remove(position);

        let children = std::mem::take(&mut self.nodes[id].children);
        let mut merged = 0;
        for child in children.into_iter().flatten() {
            let Node {
                red,
                green,
                blue,
                weight,
                ..
            } = self.nodes[child];
            let node = &mut self.nodes[id];
            node.red += red;
            node.green += green;
            node.blue += blue;
            node.weight += weight;
            merged += 1;
        }

        self.nodes[id].leaf = true;
        self.leaf_count = self.leaf_count + 1 - merged;
        true
    }

    /// Weighted mean color of every populated leaf, in tree order.
    pub fn palette(&self) -> Vec<[u8; 3]> {
        let mut colors = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![0usize];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.leaf {
                if node.weight > 0 {
                    let mean = |sum: u64| ((sum + node.weight / 2) / node.weight).min(255) as u8;
                    colors.push([mean(node.red), mean(node.green), mean(node.blue)]);
                }
                continue;
            }
            stack.extend(node.children.iter().rev().flatten());
        }

        colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_colors_below_limit_are_exact() {
        let mut tree = Octree::new(8);
        let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [12, 34, 56]];
        for color in colors {
            tree.insert(color, 1);
        }
        let mut palette = tree.palette();
        palette.sort();
        let mut expected = colors.to_vec();
        expected.sort();
        assert_eq!(palette, expected);
    }

    #[test]
    fn test_leaf_count_never_exceeds_limit() {
        let mut tree = Octree::new(15);
        for r in (0..=255u8).step_by(17) {
            for g in (0..=255u8).step_by(51) {
                tree.insert([r, g, r ^ g], 1);
                assert!(tree.leaf_count() <= 15);
            }
        }
        assert!(tree.palette().len() <= 15);
        assert!(!tree.palette().is_empty());
    }

    #[test]
    fn test_single_leaf_is_weighted_mean() {
        let mut tree = Octree::new(1);
        tree.insert([0, 0, 0], 1);
        tree.insert([200, 100, 50], 3);
        assert_eq!(tree.palette(), vec![[150, 75, 38]]);
    }

    #[test]
    fn test_empty_tree_has_no_colors() {
        let mut tree = Octree::new(4);
        tree.insert([1, 2, 3], 0);
        assert!(tree.palette().is_empty());
    }
}
