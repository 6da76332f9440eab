//! Delaunay-derived neighbor graphs over 2D point sets.
//!
//! The graph is a disposable structure: adjacency is valid only for the
//! positions and membership at build time. Callers rebuild it wholesale once
//! the point set changes beyond what [`NeighborGraph::fuse`] can patch.

use glam::DVec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::types::Point;

/// Symmetric adjacency between point ids, derived from a Delaunay
/// triangulation over `(col, row)` positions.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    adjacency: FxHashMap<u32, FxHashSet<u32>>,
}

impl NeighborGraph {
    /// Build the neighbor graph for a set of points (callers pass only
    /// active points). Returns `None` for fewer than 3 points, where a
    /// triangulation is undefined.
    ///
    /// Degenerate input (collinear or duplicate coordinates) is not
    /// special-cased; it yields whatever adjacency the triangulation
    /// produces, possibly an edgeless graph.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let sites: Vec<(u32, DVec2)> = points.iter().map(|p| (p.id, p.pos())).collect();
        Self::build(&sites)
    }

    /// Build from explicit `(id, position)` sites.
    pub fn build(sites: &[(u32, DVec2)]) -> Option<Self> {
        let n = sites.len();
        if n < 3 {
            return None;
        }

        let positions: Vec<DVec2> = sites.iter().map(|&(_, pos)| pos).collect();
        let triangles = triangulate(&positions);

        let mut adjacency: FxHashMap<u32, FxHashSet<u32>> = FxHashMap::default();
        for &(id, _) in sites {
            adjacency.insert(id, FxHashSet::default());
        }
        for tri in &triangles {
            for (i, j) in [(0, 1), (0, 2), (1, 2)] {
                let a = sites[tri[i]].0;
                let b = sites[tri[j]].0;
                if let Some(set) = adjacency.get_mut(&a) {
                    set.insert(b);
                }
                if let Some(set) = adjacency.get_mut(&b) {
                    set.insert(a);
                }
            }
        }

        Some(Self { adjacency })
    }

    /// Neighbor ids of `id`, or `None` if the id is not (or no longer) in
    /// the graph.
    #[inline]
    pub fn neighbors(&self, id: u32) -> Option<&FxHashSet<u32>> {
        self.adjacency.get(&id)
    }

    /// Number of nodes currently tracked.
    #[inline]
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|s| s.len()).sum::<usize>() / 2
    }

    /// Patch the adjacency after `removed` was fused into `survivor`,
    /// without retriangulating: `removed` disappears from every neighbor
    /// set, and each of its former neighbors (other than the survivor)
    /// gains a symmetric edge to the survivor.
    pub fn fuse(&mut self, removed: u32, survivor: u32) {
        let Some(former) = self.adjacency.remove(&removed) else {
            return;
        };
        if let Some(set) = self.adjacency.get_mut(&survivor) {
            set.remove(&removed);
        }
        for n in former {
            if n == survivor {
                continue;
            }
            if let Some(set) = self.adjacency.get_mut(&n) {
                set.remove(&removed);
                set.insert(survivor);
            }
            if let Some(set) = self.adjacency.get_mut(&survivor) {
                set.insert(n);
            }
        }
    }
}

/// Circumcircle of a triangle: center and squared radius. A degenerate
/// (near-collinear) triangle reports an effectively unbounded radius.
fn circumcircle(a: DVec2, b: DVec2, c: DVec2) -> (DVec2, f64) {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-20 {
        return (DVec2::ZERO, f64::MAX);
    }
    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = DVec2::new(ux, uy);
    (center, (a - center).length_squared())
}

#[inline]
fn in_circumcircle(a: DVec2, b: DVec2, c: DVec2, p: DVec2) -> bool {
    let (center, r2) = circumcircle(a, b, c);
    (p - center).length_squared() < r2
}

/// Bowyer-Watson incremental triangulation.
///
/// A super-triangle scaled from the input bounding box encloses all sites
/// (fixed margins break once coordinates approach the upper end of the u32
/// range); points are inserted one at a time, splitting the "bad" triangles
/// whose circumcircle contains them along the boundary polygon. Triangles
/// touching the super-triangle are discarded at the end.
fn triangulate(positions: &[DVec2]) -> Vec<[usize; 3]> {
    let n = positions.len();

    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    for p in positions {
        min = min.min(*p);
        max = max.max(*p);
    }
    let center = (min + max) * 0.5;
    let reach = (max - min).max_element().max(1.0) * 16.0;

    let mut coords: Vec<DVec2> = positions.to_vec();
    coords.push(center + DVec2::new(-reach, -reach));
    coords.push(center + DVec2::new(reach, -reach));
    coords.push(center + DVec2::new(0.0, reach));
    let super_first = n;

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for i in 0..n {
        let p = coords[i];

        let mut bad: Vec<usize> = Vec::new();
        for (ti, tri) in triangles.iter().enumerate() {
            let [a, b, c] = *tri;
            if in_circumcircle(coords[a], coords[b], coords[c], p) {
                bad.push(ti);
            }
        }

        // Boundary polygon: edges belonging to exactly one bad triangle.
        let mut edge_count: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        for &ti in &bad {
            let [a, b, c] = triangles[ti];
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let key = if u < v { (u, v) } else { (v, u) };
                *edge_count.entry(key).or_insert(0) += 1;
            }
        }

        // Remove bad triangles in reverse so indices stay valid.
        for &ti in bad.iter().rev() {
            triangles.swap_remove(ti);
        }

        for (&(u, v), &count) in &edge_count {
            if count == 1 {
                triangles.push([i, u, v]);
            }
        }
    }

    triangles.retain(|tri| tri.iter().all(|&v| v < super_first));
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites(coords: &[(f64, f64)]) -> Vec<(u32, DVec2)> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| (i as u32, DVec2::new(x, y)))
            .collect()
    }

    #[test]
    fn test_too_few_points() {
        assert!(NeighborGraph::build(&sites(&[])).is_none());
        assert!(NeighborGraph::build(&sites(&[(0.0, 0.0)])).is_none());
        assert!(NeighborGraph::build(&sites(&[(0.0, 0.0), (1.0, 0.0)])).is_none());
    }

    #[test]
    fn test_triangle() {
        let graph = NeighborGraph::build(&sites(&[(0.0, 0.0), (1.0, 0.0), (0.5, 1.0)])).unwrap();
        for id in 0..3 {
            assert_eq!(
                graph.neighbors(id).unwrap().len(),
                2,
                "node {} should connect to the other two",
                id
            );
        }
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_square() {
        let graph = NeighborGraph::build(&sites(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ]))
        .unwrap();
        // Two triangles sharing one diagonal: 5 undirected edges (the exact
        // diagonal depends on tie-breaking, so allow a small range).
        let edges = graph.edge_count();
        assert!((4..=6).contains(&edges), "expected 4-6 edges, got {}", edges);
    }

    #[test]
    fn test_symmetry() {
        let graph = NeighborGraph::build(&sites(&[
            (0.0, 0.0),
            (3.0, 0.1),
            (1.5, 2.5),
            (0.5, 1.0),
            (2.5, 1.0),
        ]))
        .unwrap();
        for (&id, nbrs) in graph.adjacency.iter() {
            for &n in nbrs {
                assert!(
                    graph.neighbors(n).unwrap().contains(&id),
                    "edge {}-{} is not symmetric",
                    id,
                    n
                );
            }
        }
    }

    #[test]
    fn test_delaunay_property() {
        let coords = [(0.0, 0.0), (3.0, 0.0), (1.5, 2.5), (0.5, 1.0), (2.5, 1.0)];
        let positions: Vec<DVec2> = coords.iter().map(|&(x, y)| DVec2::new(x, y)).collect();
        let triangles = triangulate(&positions);
        assert!(!triangles.is_empty());
        for tri in &triangles {
            let [a, b, c] = *tri;
            for (p, pos) in positions.iter().enumerate() {
                if p == a || p == b || p == c {
                    continue;
                }
                assert!(
                    !in_circumcircle(positions[a], positions[b], positions[c], *pos),
                    "point {} inside circumcircle of [{}, {}, {}]",
                    p,
                    a,
                    b,
                    c
                );
            }
        }
    }

    #[test]
    fn test_coordinates_near_u32_max() {
        // The super-triangle must still enclose sites at the top of the u32
        // coordinate range.
        let top = u32::MAX as f64;
        let graph = NeighborGraph::build(&sites(&[
            (top, top),
            (top - 1.0e8, top),
            (top, top - 1.0e8),
            (top - 1.0e8, top - 1.0e8),
        ]))
        .unwrap();
        assert!(
            graph.edge_count() >= 4,
            "far-out sites lost their adjacency, got {} edges",
            graph.edge_count()
        );
        for id in 0..4 {
            assert!(
                !graph.neighbors(id).unwrap().is_empty(),
                "node {} is edgeless",
                id
            );
        }
    }

    #[test]
    fn test_degenerate_input_does_not_panic() {
        // Duplicates and collinear runs go through without special-casing.
        let graph = NeighborGraph::build(&sites(&[
            (0.0, 0.0),
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
        ]));
        assert!(graph.is_some());
    }

    #[test]
    fn test_fuse_patches_adjacency() {
        // Triangle plus an interior point connected to all corners.
        let mut graph = NeighborGraph::build(&sites(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (2.0, 3.0),
            (2.0, 1.0),
        ]))
        .unwrap();
        assert_eq!(graph.neighbors(3).unwrap().len(), 3);

        // Fuse the interior point into corner 0: it vanishes everywhere and
        // its former neighbors now reach corner 0.
        graph.fuse(3, 0);
        assert!(graph.neighbors(3).is_none());
        for id in 0..3 {
            assert!(
                !graph.neighbors(id).unwrap().contains(&3),
                "node {} still references the fused point",
                id
            );
        }
        assert!(graph.neighbors(1).unwrap().contains(&0));
        assert!(graph.neighbors(2).unwrap().contains(&0));
        assert!(graph.neighbors(0).unwrap().contains(&1));
        assert!(graph.neighbors(0).unwrap().contains(&2));
    }
}
