//! Compute the structural complexity index of a molecule.
//!
//! For every sub-structure size `i` from `|E| - 1` down to `1`, all `C(|E|, i)`
//! bond combinations are enumerated, the disconnected ones are dropped, and the
//! distinct [`Fingerprint`]s of the rest are counted. The scan keeps the
//! running maximum count `nmax` and the size `bmax` where it was last reached
//! (ties move `bmax` down), and stops at the first size whose count falls
//! below `nmax`. This is not the global maximum over all sizes: a molecule
//! whose counts dip and then rise again keeps the value from before the dip.
//!
//! The index is `ln(nmax) / ln(bmax)`, or `0` when `bmax` is `1`.

use std::collections::HashSet;

use bit_set::BitSet;
use clap::ValueEnum;
use itertools::Itertools;
use rayon::iter::{ParallelBridge, ParallelIterator};
use thiserror::Error;
use tracing::debug;

use crate::{
    canonize::{fingerprint, Fingerprint},
    molecule::Molecule,
    utils::is_subset_connected,
};

/// Parallelization strategy for the sub-structure enumeration.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum ParallelMode {
    /// Canonize every combination on the calling thread.
    #[default]
    None,
    /// Canonize the combinations of each size on the rayon thread pool. The
    /// distinct count of a size is only taken once all of its combinations
    /// are done, so the result is the same as with `None`.
    Always,
}

/// Thrown by [`complexity`] and [`complexity_search`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ComplexityError {
    #[error("complexity is undefined for fewer than two atoms, got {atoms}")]
    TooFewAtoms { atoms: usize },
}

/// Number of distinct fingerprints among the connected sub-structures with
/// a given number of bonds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SearchLevel {
    edge_count: usize,
    distinct_count: usize,
}

impl SearchLevel {
    pub fn new(edge_count: usize, distinct_count: usize) -> Self {
        Self {
            edge_count,
            distinct_count,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn distinct_count(&self) -> usize {
        self.distinct_count
    }
}

/// Outcome of [`complexity_search`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityReport {
    score: f64,
    nmax: usize,
    bmax: usize,
    levels: Vec<SearchLevel>,
}

impl ComplexityReport {
    /// The complexity index.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// The largest distinct count reached before the scan stopped.
    pub fn nmax(&self) -> usize {
        self.nmax
    }

    /// The smallest size at which `nmax` was reached, or `0` if no size was
    /// scanned.
    pub fn bmax(&self) -> usize {
        self.bmax
    }

    /// Every scanned size in scan order, including the one that stopped it.
    pub fn levels(&self) -> &[SearchLevel] {
        &self.levels
    }
}

/// Compute the complexity index of `mol` on the calling thread.
pub fn complexity(mol: &Molecule) -> Result<f64, ComplexityError> {
    complexity_search(mol, ParallelMode::None).map(|report| report.score())
}

/// Compute the complexity index of `mol`, keeping the per-size counts.
///
/// Molecules with fewer than two bonds have no size to scan and score `0`.
pub fn complexity_search(
    mol: &Molecule,
    parallel_mode: ParallelMode,
) -> Result<ComplexityReport, ComplexityError> {
    if mol.atom_count() < 2 {
        return Err(ComplexityError::TooFewAtoms {
            atoms: mol.atom_count(),
        });
    }

    let mut nmax = 0;
    let mut bmax = 0;
    let mut levels = Vec::new();
    for size in (1..mol.bond_count()).rev() {
        let distinct_count = distinct_fingerprints(mol, size, parallel_mode).len();
        debug!(size, distinct_count, "scanned sub-structure size");
        levels.push(SearchLevel::new(size, distinct_count));

        if distinct_count < nmax {
            break;
        }
        nmax = distinct_count;
        bmax = size;
    }
    debug!(nmax, bmax, "complexity scan finished");

    let score = if bmax <= 1 {
        0.0
    } else {
        (nmax as f64).ln() / (bmax as f64).ln()
    };

    Ok(ComplexityReport {
        score,
        nmax,
        bmax,
        levels,
    })
}

/// Return the distinct fingerprints of all connected sub-structures of `mol`
/// with exactly `size` bonds.
pub fn distinct_fingerprints(
    mol: &Molecule,
    size: usize,
    parallel_mode: ParallelMode,
) -> HashSet<Fingerprint> {
    let subgraphs = mol
        .graph()
        .edge_indices()
        .map(|ix| ix.index())
        .combinations(size)
        .map(BitSet::from_iter);

    match parallel_mode {
        ParallelMode::None => subgraphs
            .filter(|subgraph| is_subset_connected(mol.graph(), subgraph))
            .map(|subgraph| fingerprint(mol, &subgraph))
            .collect(),
        ParallelMode::Always => subgraphs
            .par_bridge()
            .filter(|subgraph| is_subset_connected(mol.graph(), subgraph))
            .map(|subgraph| fingerprint(mol, &subgraph))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::Element::{self, Carbon, Nitrogen, Oxygen};

    fn chain(len: usize) -> Molecule {
        let bonds: Vec<(usize, usize, u32, u32)> = (1..len).map(|i| (i - 1, i, 1, 0)).collect();
        Molecule::from_parts(&vec![Carbon; len], &bonds)
    }

    fn propionic_acid() -> Molecule {
        Molecule::from_parts(
            &[Carbon, Carbon, Carbon, Oxygen, Oxygen],
            &[(0, 1, 1, 0), (1, 2, 1, 0), (2, 3, 2, 0), (2, 4, 1, 0)],
        )
    }

    fn levels(pairs: &[(usize, usize)]) -> Vec<SearchLevel> {
        pairs.iter().map(|&(e, n)| SearchLevel::new(e, n)).collect()
    }

    #[test]
    fn too_few_atoms() {
        let single = Molecule::from_parts(&[Carbon], &[]);
        assert_eq!(
            complexity(&single),
            Err(ComplexityError::TooFewAtoms { atoms: 1 })
        );

        let empty = Molecule::from_parts(&[], &[]);
        assert_eq!(
            complexity(&empty),
            Err(ComplexityError::TooFewAtoms { atoms: 0 })
        );
    }

    #[test]
    fn fewer_than_two_bonds_score_zero() {
        let ethane = chain(2);
        let report = complexity_search(&ethane, ParallelMode::None).unwrap();
        assert_eq!(report.score(), 0.0);
        assert_eq!(report.bmax(), 0);
        assert!(report.levels().is_empty());

        let unbonded = Molecule::from_parts(&[Carbon, Oxygen], &[]);
        assert_eq!(complexity(&unbonded), Ok(0.0));
    }

    #[test]
    fn chains_score_zero() {
        for len in 3..=8 {
            let report = complexity_search(&chain(len), ParallelMode::None).unwrap();
            assert_eq!(report.score(), 0.0);
            assert_eq!(report.nmax(), 1);
            assert_eq!(report.bmax(), 1);
        }
    }

    #[test]
    fn propionic_acid_levels() {
        let report = complexity_search(&propionic_acid(), ParallelMode::None).unwrap();
        assert_eq!(report.levels().to_vec(), levels(&[(3, 3), (2, 4), (1, 3)]));
        assert_eq!((report.nmax(), report.bmax()), (4, 2));
        assert!((report.score() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ties_move_bmax_down() {
        // 2-methylheptane: two shapes at every size from 6 down to 3.
        let mut bonds: Vec<(usize, usize, u32, u32)> = (1..7).map(|i| (i - 1, i, 1, 0)).collect();
        bonds.push((1, 7, 1, 0));
        let mol = Molecule::from_parts(&[Carbon; 8], &bonds);

        let report = complexity_search(&mol, ParallelMode::None).unwrap();
        assert_eq!(
            report.levels().to_vec(),
            levels(&[(6, 2), (5, 2), (4, 2), (3, 2), (2, 1)])
        );
        assert_eq!((report.nmax(), report.bmax()), (2, 3));
        assert!((report.score() - 2f64.ln() / 3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn stops_at_first_decrease() {
        // C-C#C-C#C and a detached C-O, with an isolated N. The counts dip at
        // size 2 and rise above the earlier maximum at size 1, which is never
        // reached.
        let atoms = [Carbon, Carbon, Nitrogen, Carbon, Carbon, Carbon, Carbon, Oxygen];
        let bonds: [(usize, usize, u32, u32); 5] = [
            (1, 0, 3, 0),
            (3, 1, 1, 1),
            (5, 0, 1, 1),
            (6, 3, 3, 0),
            (7, 4, 1, 1),
        ];
        let mol = Molecule::from_parts(&atoms, &bonds);

        let report = complexity_search(&mol, ParallelMode::None).unwrap();
        assert_eq!(report.levels().to_vec(), levels(&[(4, 1), (3, 2), (2, 1)]));
        assert_eq!((report.nmax(), report.bmax()), (2, 3));
        assert_eq!(
            distinct_fingerprints(&mol, 1, ParallelMode::None).len(),
            3
        );
        assert!((report.score() - 2f64.ln() / 3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn disconnected_combinations_are_skipped() {
        // Bonds 0 and 2 of butane do not touch.
        let butane = chain(4);
        assert_eq!(distinct_fingerprints(&butane, 2, ParallelMode::None).len(), 1);
        assert_eq!(distinct_fingerprints(&butane, 3, ParallelMode::None).len(), 1);
    }

    #[test]
    fn serial_and_parallel_agree() {
        let atoms: Vec<Element> = [Carbon; 6].into_iter().chain([Oxygen, Nitrogen]).collect();
        let bonds: [(usize, usize, u32, u32); 8] = [
            (0, 1, 1, 0),
            (1, 2, 2, 0),
            (2, 3, 1, 0),
            (3, 4, 2, 0),
            (4, 5, 1, 0),
            (5, 0, 2, 0),
            (0, 6, 1, 1),
            (3, 7, 1, 6),
        ];
        let mol = Molecule::from_parts(&atoms, &bonds);

        let serial = complexity_search(&mol, ParallelMode::None).unwrap();
        let parallel = complexity_search(&mol, ParallelMode::Always).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(serial.score().to_bits(), parallel.score().to_bits());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let mol = propionic_acid();
        let first = complexity(&mol).unwrap();
        for _ in 0..3 {
            assert_eq!(complexity(&mol).unwrap().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn scores_are_non_negative() {
        let molecules = [chain(2), chain(5), propionic_acid()];
        for mol in &molecules {
            assert!(complexity(mol).unwrap() >= 0.0);
        }
    }
}
