// Molecule definition, element table
pub mod molecule;

// Data IO
pub mod loader;

// Canonical labels of sub-structures
pub mod canonize;

// The hard bit: compute the complexity index
pub mod complexity;

// Utility functions
mod utils;
