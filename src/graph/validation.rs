// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cycle detection for graph construction.
//!
//! Depth-first search tracking the current recursion path (gray nodes), so a
//! detected cycle can be reported as the actual path rather than a bare
//! boolean. O(V + E) time, O(V) space.

/// Returns the first cycle found as a path of stage names (first element
/// repeated at the end), or `None` if the graph is acyclic.
pub(crate) fn detect_cycle(adjacency: &[Vec<usize>], names: &[&str]) -> Option<Vec<String>> {
    let mut visited = vec![false; adjacency.len()];
    let mut on_path = vec![false; adjacency.len()];
    let mut path = Vec::new();

    for start in 0..adjacency.len() {
        if !visited[start] {
            if let Some(cycle) = walk(start, adjacency, names, &mut visited, &mut on_path, &mut path)
            {
                return Some(cycle);
            }
        }
    }
    None
}

fn walk(
    node: usize,
    adjacency: &[Vec<usize>],
    names: &[&str],
    visited: &mut [bool],
    on_path: &mut [bool],
    path: &mut Vec<usize>,
) -> Option<Vec<String>> {
    visited[node] = true;
    on_path[node] = true;
    path.push(node);

    for &next in &adjacency[node] {
        if on_path[next] {
            let start = path.iter().position(|&n| n == next).unwrap_or(0);
            let mut cycle: Vec<String> =
                path[start..].iter().map(|&n| names[n].to_string()).collect();
            cycle.push(names[next].to_string());
            return Some(cycle);
        }
        if !visited[next] {
            if let Some(cycle) = walk(next, adjacency, names, visited, on_path, path) {
                return Some(cycle);
            }
        }
    }

    on_path[node] = false;
    path.pop();
    None
}
