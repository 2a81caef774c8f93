//! Graph-theoretic representation of a molecule.
//!
//! Atoms are nodes carrying their [`Element`]; bonds are undirected edges
//! carrying an integer bond order and an opaque configuration (stereo) code.
//! A [`Molecule`] is built once by the [`loader`](crate::loader) and is only
//! read afterwards.

use std::{fmt::Display, str::FromStr};

use petgraph::{
    dot::Dot,
    graph::{Graph, NodeIndex},
    Undirected,
};
use thiserror::Error;

pub(crate) type Index = u32;
pub(crate) type MGraph = Graph<Atom, Bond, Undirected, Index>;

/// Thrown by [`Element::from_str`] if the string does not represent a valid
/// chemical element.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseElementError;

macro_rules! periodic_table {
    ( $(($element:ident, $name:literal, $number:literal),)* ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        /// Represents a chemical element.
        pub enum Element {
            $( $element, )*
        }

        impl Element {
            /// Return this element's atomic number.
            pub fn atomic_number(&self) -> u32 {
                match &self {
                    $( Element::$element => $number, )*
                }
            }

            /// Return the element with atomic number `number`, if any.
            pub fn from_atomic_number(number: u32) -> Option<Self> {
                match number {
                    $( $number => Some(Element::$element), )*
                    _ => None,
                }
            }
        }

        impl Display for Element {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self {
                    $( Element::$element => write!(f, "{}", $name), )*
                }
            }
        }

        impl FromStr for Element {
            type Err = ParseElementError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Element::$element), )*
                    _ => Err(ParseElementError),
                }
            }
        }
    };
}

periodic_table!(
    (Hydrogen, "H", 1),
    (Helium, "He", 2),
    (Lithium, "Li", 3),
    (Beryllium, "Be", 4),
    (Boron, "B", 5),
    (Carbon, "C", 6),
    (Nitrogen, "N", 7),
    (Oxygen, "O", 8),
    (Fluorine, "F", 9),
    (Neon, "Ne", 10),
    (Sodium, "Na", 11),
    (Magnesium, "Mg", 12),
    (Aluminum, "Al", 13),
    (Silicon, "Si", 14),
    (Phosphorus, "P", 15),
    (Sulfur, "S", 16),
    (Chlorine, "Cl", 17),
    (Argon, "Ar", 18),
    (Potassium, "K", 19),
    (Calcium, "Ca", 20),
    (Scandium, "Sc", 21),
    (Titanium, "Ti", 22),
    (Vanadium, "V", 23),
    (Chromium, "Cr", 24),
    (Manganese, "Mn", 25),
    (Iron, "Fe", 26),
    (Cobalt, "Co", 27),
    (Nickel, "Ni", 28),
    (Copper, "Cu", 29),
    (Zinc, "Zn", 30),
    (Gallium, "Ga", 31),
    (Germanium, "Ge", 32),
    (Arsenic, "As", 33),
    (Selenium, "Se", 34),
    (Bromine, "Br", 35),
    (Krypton, "Kr", 36),
    (Rubidium, "Rb", 37),
    (Strontium, "Sr", 38),
    (Yttrium, "Y", 39),
    (Zirconium, "Zr", 40),
    (Niobium, "Nb", 41),
    (Molybdenum, "Mo", 42),
    (Technetium, "Tc", 43),
    (Ruthenium, "Ru", 44),
    (Rhodium, "Rh", 45),
    (Palladium, "Pd", 46),
    (Silver, "Ag", 47),
    (Cadmium, "Cd", 48),
    (Indium, "In", 49),
    (Tin, "Sn", 50),
    (Antimony, "Sb", 51),
    (Tellurium, "Te", 52),
    (Iodine, "I", 53),
    (Xenon, "Xe", 54),
    (Cesium, "Cs", 55),
    (Barium, "Ba", 56),
    (Lanthanum, "La", 57),
    (Cerium, "Ce", 58),
    (Praseodymium, "Pr", 59),
    (Neodymium, "Nd", 60),
    (Promethium, "Pm", 61),
    (Samarium, "Sm", 62),
    (Europium, "Eu", 63),
    (Gadolinium, "Gd", 64),
    (Terbium, "Tb", 65),
    (Dysprosium, "Dy", 66),
    (Holmium, "Ho", 67),
    (Erbium, "Er", 68),
    (Thulium, "Tm", 69),
    (Ytterbium, "Yb", 70),
    (Lutetium, "Lu", 71),
    (Hafnium, "Hf", 72),
    (Tantalum, "Ta", 73),
    (Wolfram, "W", 74),
    (Rhenium, "Re", 75),
    (Osmium, "Os", 76),
    (Iridium, "Ir", 77),
    (Platinum, "Pt", 78),
    (Gold, "Au", 79),
    (Mercury, "Hg", 80),
    (Thallium, "Tl", 81),
    (Lead, "Pb", 82),
    (Bismuth, "Bi", 83),
    (Polonium, "Po", 84),
    (Astatine, "At", 85),
    (Radon, "Rn", 86),
    (Francium, "Fr", 87),
    (Radium, "Ra", 88),
    (Actinium, "Ac", 89),
    (Thorium, "Th", 90),
    (Protactinium, "Pa", 91),
    (Uranium, "U", 92),
    (Neptunium, "Np", 93),
    (Plutonium, "Pu", 94),
    (Americium, "Am", 95),
    (Curium, "Cm", 96),
    (Berkelium, "Bk", 97),
    (Californium, "Cf", 98),
    (Einsteinium, "Es", 99),
    (Fermium, "Fm", 100),
    (Mendelevium, "Md", 101),
    (Nobelium, "No", 102),
    (Lawrencium, "Lr", 103),
    (Rutherfordium, "Rf", 104),
    (Dubnium, "Db", 105),
    (Seaborgium, "Sg", 106),
    (Bohrium, "Bh", 107),
    (Hassium, "Hs", 108),
    (Meitnerium, "Mt", 109),
    (Darmstadtium, "Ds", 110),
    (Roentgenium, "Rg", 111),
    (Copernicium, "Cn", 112),
    (Nihonium, "Nh", 113),
    (Flerovium, "Fl", 114),
    (Moscovium, "Mc", 115),
    (Livermorium, "Lv", 116),
    (Tennessine, "Ts", 117),
    (Oganesson, "Og", 118),);

/// The nodes of a [`Molecule`] graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom {
    element: Element,
}

impl Atom {
    /// Construct an [`Atom`] of type `element`.
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Return this [`Atom`]'s element.
    pub fn element(&self) -> Element {
        self.element
    }

    /// Return the atomic number of this [`Atom`]'s element.
    pub fn atomic_number(&self) -> u32 {
        self.element.atomic_number()
    }
}

/// The edges of a [`Molecule`] graph.
///
/// Both fields are taken verbatim from the bond block. The order is not
/// restricted to single/double/triple, and the configuration code (wedge,
/// hash, either, cis/trans...) is never interpreted; it only takes part in
/// fingerprinting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bond {
    order: u32,
    config: u32,
}

impl Bond {
    pub fn new(order: u32, config: u32) -> Self {
        Self { order, config }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn config(&self) -> u32 {
        self.config
    }
}

/// Tetrahedral configuration of a stereocentre.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Chirality {
    Clockwise,
    CounterClockwise,
}

/// Thrown by [`Molecule::atom_stereo`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum StereoError {
    #[error("stereo assignment beyond raw bond configuration codes is not supported")]
    Unsupported,
}

/// A simple, loopless, undirected graph with [`Atom`]s as nodes and [`Bond`]s
/// as edges. Node `i` is the `i`-th record of the atom block.
#[derive(Debug, Clone)]
pub struct Molecule {
    graph: MGraph,
}

impl Molecule {
    /// Construct a [`Molecule`] from an existing `MGraph`.
    pub(crate) fn from_graph(g: MGraph) -> Self {
        Self { graph: g }
    }

    /// Return a representation of this molecule as an `MGraph`.
    pub(crate) fn graph(&self) -> &MGraph {
        &self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return the atomic number of atom `atom` (0-based), if it exists.
    pub fn atomic_number(&self, atom: usize) -> Option<u32> {
        self.graph
            .node_weight(NodeIndex::new(atom))
            .map(Atom::atomic_number)
    }

    /// Return the bond between atoms `a` and `b` (0-based), if any.
    pub fn bond(&self, a: usize, b: usize) -> Option<Bond> {
        if a >= self.atom_count() || b >= self.atom_count() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|ix| self.graph.edge_weight(ix).copied())
    }

    /// Return a pretty-printable representation of this molecule.
    pub fn info(&self) -> String {
        let dot = Dot::new(&self.graph);
        format!("{dot:?}")
    }

    /// Resolve the tetrahedral configuration of every atom from the bond
    /// configuration codes.
    ///
    /// This is an extension point with no implementation yet: it always
    /// returns [`StereoError::Unsupported`]. The raw codes stay available
    /// through [`Bond::config`].
    pub fn atom_stereo(&self) -> Result<Vec<Option<Chirality>>, StereoError> {
        Err(StereoError::Unsupported)
    }
}

#[cfg(test)]
impl Molecule {
    /// Build a molecule from elements and `(atom, atom, order, config)` bonds
    /// with 0-based atom numbers.
    pub(crate) fn from_parts(atoms: &[Element], bonds: &[(usize, usize, u32, u32)]) -> Self {
        let mut g = MGraph::default();
        for &element in atoms {
            g.add_node(Atom::new(element));
        }
        for &(a, b, order, config) in bonds {
            g.add_edge(NodeIndex::new(a), NodeIndex::new(b), Bond::new(order, config));
        }
        Self::from_graph(g)
    }
}
