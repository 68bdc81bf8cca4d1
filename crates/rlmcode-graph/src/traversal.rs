use crate::GraphEngine;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

impl GraphEngine {
    /// All shortest directed paths from `from` to `to`, at most `max_paths` of them.
    ///
    /// Empty when either endpoint is unknown or `to` is unreachable. A symbol
    /// reaches itself by the single-node path `[from]`. Paths come out in a
    /// stable order: predecessors are explored by ascending symbol id.
    pub fn shortest_paths(&self, from: &str, to: &str, max_paths: usize) -> Vec<Vec<String>> {
        let (Some(&start), Some(&goal)) = (self.id_to_index.get(from), self.id_to_index.get(to))
        else {
            return Vec::new();
        };
        if max_paths == 0 {
            return Vec::new();
        }
        if start == goal {
            return vec![vec![from.to_string()]];
        }

        // BFS layers with every shortest-path predecessor recorded.
        let mut dist: HashMap<NodeIndex, usize> = HashMap::new();
        let mut preds: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        dist.insert(start, 0);
        queue.push_back(start);

        while let Some(v) = queue.pop_front() {
            let d = dist[&v];
            if dist.get(&goal).is_some_and(|&g| d >= g) {
                break;
            }
            for w in self.graph.neighbors_directed(v, Direction::Outgoing) {
                match dist.get(&w) {
                    None => {
                        dist.insert(w, d + 1);
                        preds.entry(w).or_default().push(v);
                        queue.push_back(w);
                    }
                    Some(&dw) if dw == d + 1 => preds.entry(w).or_default().push(v),
                    _ => {}
                }
            }
        }
        if !dist.contains_key(&goal) {
            return Vec::new();
        }
        for list in preds.values_mut() {
            list.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
            list.dedup();
        }

        // Walk predecessor links back from the goal.
        let mut paths: Vec<Vec<String>> = Vec::new();
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(goal, vec![goal])];
        while let Some((node, reversed)) = stack.pop() {
            if node == start {
                paths.push(
                    reversed
                        .iter()
                        .rev()
                        .map(|&idx| self.graph[idx].clone())
                        .collect(),
                );
                if paths.len() >= max_paths {
                    break;
                }
                continue;
            }
            if let Some(list) = preds.get(&node) {
                for &p in list.iter().rev() {
                    let mut next = reversed.clone();
                    next.push(p);
                    stack.push((p, next));
                }
            }
        }
        paths
    }

    /// Symbols reachable from `start` within `depth` hops, sorted, excluding `start`.
    pub fn reachable_from(&self, start: &str, depth: usize) -> Vec<String> {
        let Some(&start_idx) = self.id_to_index.get(start) else {
            return Vec::new();
        };

        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut frontier: Vec<NodeIndex> = vec![start_idx];
        for _ in 0..depth {
            let mut next_frontier = Vec::new();
            for &node in &frontier {
                for succ in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    if seen.insert(succ) {
                        next_frontier.push(succ);
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        seen.remove(&start_idx);
        seen.into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
