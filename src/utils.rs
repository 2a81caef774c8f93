use std::collections::VecDeque;

use bit_set::BitSet;
use petgraph::{
    graph::{EdgeIndex, Graph, IndexType},
    visit::EdgeRef,
    EdgeType,
};

/// Return an iterator over the edges sharing an endpoint with `e`, excluding
/// `e` itself.
pub fn edge_neighbors<N, E, Ty, Ix>(
    g: &Graph<N, E, Ty, Ix>,
    e: EdgeIndex<Ix>,
) -> impl Iterator<Item = EdgeIndex<Ix>> + '_
where
    Ty: EdgeType,
    Ix: IndexType,
{
    g.edge_endpoints(e)
        .into_iter()
        .flat_map(move |(src, dst)| g.edges(src).chain(g.edges(dst)))
        .map(|r| r.id())
        .filter(move |f| *f != e)
}

/// Return `true` iff the subgraph induced by the edge set `s` is connected,
/// i.e., every edge of `s` can be reached from every other through shared
/// endpoints. The empty edge set is not considered connected.
pub fn is_subset_connected<N, E, Ty, Ix>(g: &Graph<N, E, Ty, Ix>, s: &BitSet) -> bool
where
    Ty: EdgeType,
    Ix: IndexType,
{
    let Some(start) = s.iter().next() else {
        return false;
    };

    let mut visited = BitSet::with_capacity(g.edge_count());
    let mut queue = VecDeque::from([start]);
    visited.insert(start);
    while let Some(e) = queue.pop_front() {
        for f in edge_neighbors(g, EdgeIndex::new(e)) {
            let f = f.index();
            if s.contains(f) && visited.insert(f) {
                queue.push_back(f);
            }
        }
    }

    visited.len() == s.len()
}
