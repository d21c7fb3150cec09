use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Finds cycles in a graph given as a node list plus an edge-extraction function.
///
/// Each cycle is reported as a closed chain, e.g. `["a", "b", "a"]`. Nodes are
/// visited in input order so results are deterministic. Edges pointing at names
/// that are not nodes are followed but never produce a cycle on their own.
pub fn find_cycles<'a, T, N, E>(items: &'a [T], node: N, edges: E) -> Vec<Vec<String>>
where
    N: Fn(&'a T) -> &'a str,
    E: Fn(&'a T) -> Vec<&'a str>,
{
    let mut adjacency: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
    let mut order = Vec::new();
    for item in items {
        let name = node(item);
        if name.is_empty() {
            continue;
        }
        if !adjacency.contains_key(name) {
            order.push(name);
        }
        adjacency.entry(name).or_default().extend(edges(item));
    }

    let mut search = Search {
        adjacency,
        color: HashMap::new(),
        parent: HashMap::new(),
        cycles: Vec::new(),
    };
    for name in order {
        if search.color_of(name) == Color::White {
            search.visit(name);
        }
    }
    search.cycles
}

struct Search<'a> {
    adjacency: HashMap<&'a str, Vec<&'a str>>,
    color: HashMap<&'a str, Color>,
    parent: HashMap<&'a str, &'a str>,
    cycles: Vec<Vec<String>>,
}

impl<'a> Search<'a> {
    fn color_of(&self, node: &str) -> Color {
        self.color.get(node).copied().unwrap_or(Color::White)
    }

    fn visit(&mut self, node: &'a str) {
        self.color.insert(node, Color::Gray);

        let next_nodes = self.adjacency.get(node).cloned().unwrap_or_default();
        for next in next_nodes {
            match self.color_of(next) {
                Color::Gray => {
                    let cycle = self.chain(next, node);
                    self.cycles.push(cycle);
                }
                Color::White => {
                    self.parent.insert(next, node);
                    self.visit(next);
                }
                Color::Black => {}
            }
        }

        self.color.insert(node, Color::Black);
    }

    /// Walks the DFS parents from `tail` back to `head`, then closes the loop.
    fn chain(&self, head: &'a str, tail: &'a str) -> Vec<String> {
        let mut path = vec![tail];
        let mut current = tail;
        while current != head {
            match self.parent.get(current) {
                Some(&p) => {
                    current = p;
                    path.push(current);
                }
                None => break,
            }
        }
        path.reverse();
        path.push(head);
        path.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&'static str, &[&'static str])]) -> Vec<(&'static str, Vec<&'static str>)> {
        edges.iter().map(|(n, e)| (*n, e.to_vec())).collect()
    }

    fn cycles_of(g: &[(&'static str, Vec<&'static str>)]) -> Vec<Vec<String>> {
        find_cycles(g, |(n, _)| *n, |(_, e)| e.clone())
    }

    #[test]
    fn test_acyclic_graph() {
        let g = graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        assert!(cycles_of(&g).is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        assert_eq!(cycles_of(&g), vec![vec!["a", "b", "a"]]);
    }

    #[test]
    fn test_three_node_cycle() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        assert_eq!(cycles_of(&g), vec![vec!["a", "b", "c", "a"]]);
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("a", &["a"])]);
        assert_eq!(cycles_of(&g), vec![vec!["a", "a"]]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let g = graph(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])]);
        assert!(cycles_of(&g).is_empty());
    }

    #[test]
    fn test_dangling_edge_ignored() {
        let g = graph(&[("a", &["missing"])]);
        assert!(cycles_of(&g).is_empty());
    }
}
