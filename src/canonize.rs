//! Create canonical labelings for edge-induced sub-structures.
//!
//! Labels come from one-dimensional colour refinement (Weisfeiler-Lehman).
//! Every node starts from a seed colour; each round recolours a node by
//! hashing its current colour together with the sorted multiset of
//! `(edge attribute, neighbour colour)` pairs around it. Rounds stop once the
//! colour partition no longer splits, or after as many rounds as there are
//! nodes. The per-round colour histograms are hashed into the final label.
//!
//! Equal labels are taken to mean isomorphic sub-structures. Colour
//! refinement cannot tell apart some regular graphs (e.g. a hexagon and two
//! triangles), so this is a heuristic, not an isomorphism proof.

use std::{collections::HashMap, fmt::Display};

use bit_set::BitSet;
use itertools::Itertools;
use petgraph::{
    graph::{EdgeIndex, Graph, NodeIndex},
    visit::EdgeRef,
    Undirected,
};
use sha2::{Digest, Sha256};

use crate::molecule::{Index, Molecule};

/// Which attributes a labeling is computed from.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum LabelSource {
    /// Atomic numbers seed the nodes; bond orders label the edges.
    Structure,
    /// All nodes share one seed; bond configuration codes label the edges.
    Configuration,
}

/// A fixed-length canonical label (32 hex digits).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Labeling(String);

impl Labeling {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Labeling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity of a sub-structure: its structural label followed by its
/// configuration label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint {
    structure: Labeling,
    config: Labeling,
}

impl Fingerprint {
    pub fn structure(&self) -> &Labeling {
        &self.structure
    }

    pub fn config(&self) -> &Labeling {
        &self.config
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.structure, self.config)
    }
}

/// Compute both labelings of the sub-structure induced by the edge set
/// `subgraph` of `mol`.
pub fn fingerprint(mol: &Molecule, subgraph: &BitSet) -> Fingerprint {
    Fingerprint {
        structure: canonize(mol, subgraph, LabelSource::Structure),
        config: canonize(mol, subgraph, LabelSource::Configuration),
    }
}

/// Obtain a canonical labeling of the sub-structure induced by the edge set
/// `subgraph` of `mol`, using the attributes selected by `source`.
pub fn canonize(mol: &Molecule, subgraph: &BitSet, source: LabelSource) -> Labeling {
    let cgraph = subgraph_to_cgraph(mol, subgraph, source);
    refine(&cgraph)
}

/// A sub-structure reduced to what colour refinement sees: an optional seed
/// per node and one integer per edge.
type CGraph = Graph<Option<u32>, u32, Undirected, Index>;

type Colour = [u8; 16];

/// Copy the edges in `subgraph` and their endpoints out of `mol`.
fn subgraph_to_cgraph(mol: &Molecule, subgraph: &BitSet, source: LabelSource) -> CGraph {
    let mut h = CGraph::with_capacity(2 * subgraph.len(), subgraph.len());
    let mut vtx_map = HashMap::<NodeIndex<Index>, NodeIndex<Index>>::new();
    let seed = |ix: NodeIndex<Index>| match source {
        LabelSource::Structure => Some(mol.graph()[ix].atomic_number()),
        LabelSource::Configuration => None,
    };

    for e in subgraph {
        let eix = EdgeIndex::new(e);
        let Some((src, dst)) = mol.graph().edge_endpoints(eix) else {
            continue;
        };
        let bond = mol.graph()[eix];
        let attr = match source {
            LabelSource::Structure => bond.order(),
            LabelSource::Configuration => bond.config(),
        };

        let h_src = *vtx_map.entry(src).or_insert_with(|| h.add_node(seed(src)));
        let h_dst = *vtx_map.entry(dst).or_insert_with(|| h.add_node(seed(dst)));
        h.add_edge(h_src, h_dst, attr);
    }
    h
}

fn refine(h: &CGraph) -> Labeling {
    let mut colours: Vec<Colour> = h.node_weights().map(|seed| seed_colour(*seed)).collect();
    let mut classes = colours.iter().unique().count();
    let mut signature = Sha256::new();

    for _ in 0..h.node_count() {
        let next: Vec<Colour> = h
            .node_indices()
            .map(|v| {
                let mut neighborhood: Vec<(u32, Colour)> = h
                    .edges(v)
                    .map(|r| {
                        let other = if r.source() == v { r.target() } else { r.source() };
                        (*r.weight(), colours[other.index()])
                    })
                    .collect();
                neighborhood.sort_unstable();

                let mut hasher = Sha256::new();
                hasher.update(colours[v.index()]);
                hasher.update((neighborhood.len() as u64).to_le_bytes());
                for (attr, colour) in &neighborhood {
                    hasher.update(attr.to_le_bytes());
                    hasher.update(colour);
                }
                truncate(hasher)
            })
            .collect();
        colours = next;

        let histogram: Vec<(usize, Colour)> =
            colours.iter().copied().sorted_unstable().dedup_with_count().collect();
        signature.update((histogram.len() as u64).to_le_bytes());
        for (count, colour) in &histogram {
            signature.update(colour);
            signature.update((*count as u64).to_le_bytes());
        }

        if histogram.len() == classes {
            break;
        }
        classes = histogram.len();
    }

    for attr in h.edge_weights().copied().sorted_unstable() {
        signature.update(attr.to_le_bytes());
    }

    Labeling(truncate(signature).iter().map(|b| format!("{b:02x}")).collect())
}

fn seed_colour(seed: Option<u32>) -> Colour {
    let mut hasher = Sha256::new();
    match seed {
        Some(n) => {
            hasher.update([1u8]);
            hasher.update(n.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    truncate(hasher)
}

fn truncate(hasher: Sha256) -> Colour {
    let mut colour = Colour::default();
    colour.copy_from_slice(&hasher.finalize()[..16]);
    colour
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::Element::{self, Carbon, Nitrogen, Oxygen};

    fn all_edges(mol: &Molecule) -> BitSet {
        (0..mol.bond_count()).collect()
    }

    fn full_fingerprint(atoms: &[Element], bonds: &[(usize, usize, u32, u32)]) -> Fingerprint {
        let mol = Molecule::from_parts(atoms, bonds);
        fingerprint(&mol, &all_edges(&mol))
    }

    #[test]
    fn labels_are_fixed_length_hex() {
        let fp = full_fingerprint(&[Carbon, Oxygen], &[(0, 1, 1, 0)]);
        assert_eq!(fp.structure().as_str().len(), 32);
        assert!(fp.config().as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            fp.to_string(),
            format!("{}{}", fp.structure(), fp.config())
        );
    }

    #[test]
    fn invariant_under_relabeling() {
        // 2-aminopropan-1-ol, atoms and bonds listed in two different orders.
        let a = full_fingerprint(
            &[Carbon, Carbon, Carbon, Oxygen, Nitrogen],
            &[(0, 1, 1, 0), (1, 2, 1, 1), (2, 3, 1, 0), (1, 4, 1, 0)],
        );
        let b = full_fingerprint(
            &[Nitrogen, Oxygen, Carbon, Carbon, Carbon],
            &[(3, 1, 1, 0), (4, 0, 1, 0), (4, 3, 1, 1), (2, 4, 1, 0)],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_elements() {
        let a = full_fingerprint(&[Carbon, Carbon, Oxygen], &[(0, 1, 1, 0), (1, 2, 1, 0)]);
        let b = full_fingerprint(&[Carbon, Carbon, Nitrogen], &[(0, 1, 1, 0), (1, 2, 1, 0)]);
        assert_ne!(a.structure(), b.structure());
        assert_eq!(a.config(), b.config());
    }

    #[test]
    fn distinguishes_bond_orders() {
        let a = full_fingerprint(&[Carbon, Carbon, Oxygen], &[(0, 1, 1, 0), (1, 2, 2, 0)]);
        let b = full_fingerprint(&[Carbon, Carbon, Oxygen], &[(0, 1, 2, 0), (1, 2, 1, 0)]);
        assert_ne!(a.structure(), b.structure());
        assert_eq!(a.config(), b.config());
    }

    #[test]
    fn distinguishes_branching() {
        let butane = full_fingerprint(
            &[Carbon; 4],
            &[(0, 1, 1, 0), (1, 2, 1, 0), (2, 3, 1, 0)],
        );
        let isobutane = full_fingerprint(
            &[Carbon; 4],
            &[(0, 1, 1, 0), (0, 2, 1, 0), (0, 3, 1, 0)],
        );
        assert_ne!(butane.structure(), isobutane.structure());
        assert_ne!(butane.config(), isobutane.config());
    }

    #[test]
    fn configuration_ignores_atoms_and_orders() {
        let a = full_fingerprint(&[Carbon, Carbon, Oxygen], &[(0, 1, 1, 0), (1, 2, 1, 6)]);
        let b = full_fingerprint(&[Nitrogen, Carbon, Carbon], &[(0, 1, 2, 0), (1, 2, 3, 6)]);
        assert_eq!(a.config(), b.config());

        let c = full_fingerprint(&[Carbon, Carbon, Oxygen], &[(0, 1, 1, 0), (1, 2, 1, 1)]);
        assert_eq!(a.structure(), c.structure());
        assert_ne!(a.config(), c.config());
    }

    #[test]
    fn isomorphic_subgraphs_share_labels() {
        // In pentane, bonds {0, 1} and {2, 3} both induce propane.
        let mol = Molecule::from_parts(
            &[Carbon; 5],
            &[(0, 1, 1, 0), (1, 2, 1, 0), (2, 3, 1, 0), (3, 4, 1, 0)],
        );
        let left = fingerprint(&mol, &BitSet::from_iter([0, 1]));
        let right = fingerprint(&mol, &BitSet::from_iter([2, 3]));
        let middle = fingerprint(&mol, &BitSet::from_iter([1, 2]));
        let butane = fingerprint(&mol, &BitSet::from_iter([1, 2, 3]));
        assert_eq!(left, right);
        assert_eq!(left, middle);
        assert_ne!(left, butane);
    }

    #[test]
    fn regular_graphs_are_not_separated() {
        // A hexagon (bonds 0..6) and two triangles (bonds 6..12) refine to
        // the same colours, so they share a label.
        let mut bonds: Vec<(usize, usize, u32, u32)> =
            (0..6).map(|i| (i, (i + 1) % 6, 1, 0)).collect();
        bonds.extend((0..3).map(|i| (6 + i, 6 + (i + 1) % 3, 1, 0)));
        bonds.extend((0..3).map(|i| (9 + i, 9 + (i + 1) % 3, 1, 0)));
        let mol = Molecule::from_parts(&[Carbon; 12], &bonds);

        let hexagon = fingerprint(&mol, &(0..6).collect());
        let triangles = fingerprint(&mol, &(6..12).collect());
        assert_eq!(hexagon, triangles);
    }

    #[test]
    fn deterministic() {
        let mol = Molecule::from_parts(
            &[Carbon, Carbon, Oxygen, Oxygen],
            &[(0, 1, 1, 0), (1, 2, 2, 0), (1, 3, 1, 0)],
        );
        let edges = all_edges(&mol);
        assert_eq!(fingerprint(&mol, &edges), fingerprint(&mol, &edges));
    }
}
