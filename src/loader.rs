//! Parse V2000 `.mol` files into [`Molecule`]s.
//!
//! Only the fixed-column V2000 dialect is understood. Every record is read at
//! fixed character offsets, and anything that does not fit the layout is
//! rejected instead of guessed at.

use std::{
    fmt::Display,
    fs, io,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use petgraph::graph::NodeIndex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::molecule::{Atom, Bond, Element, MGraph, Molecule};

const COUNTS_LINE: usize = 3;
const COUNTS_LINE_LEN: usize = 39;
const VERSION_TAG: &str = " V2000";
const END_TAG: &str = "M  END";

/// How strictly the input is checked.
///
/// `Lenient` is accepted for forward compatibility but no rule is relaxed by
/// it yet, so both modes parse identically.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum ParseMode {
    #[default]
    Strict,
    Lenient,
}

/// The two record blocks of a molfile.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Block {
    Atom,
    Bond,
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::Atom => write!(f, "atom"),
            Block::Bond => write!(f, "bond"),
        }
    }
}

/// Violations of the V2000 layout. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("no counts line: expected at least 4 lines, got {found}")]
    MissingCountsLine { found: usize },
    #[error(
        "Molfile V2000 expected: counts line length of {expected_len} expected, got {found_len}; \
         '{expected_tag}' expected, got '{found_tag}'"
    )]
    CountsLine {
        expected_len: usize,
        found_len: usize,
        expected_tag: &'static str,
        found_tag: String,
    },
    #[error("no '{expected}' end tag found, got '{found}' instead")]
    EndTag {
        expected: &'static str,
        found: String,
    },
    #[error("{block} block truncated: {expected} records declared, {found} present")]
    TruncatedBlock {
        block: Block,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: columns {start}..{end} do not hold an integer: '{text}'")]
    Integer {
        line: usize,
        start: usize,
        end: usize,
        text: String,
    },
    #[error("line {line}: bond references atom {atom}, but atoms are numbered 1..={atoms}")]
    AtomOutOfRange {
        line: usize,
        atom: usize,
        atoms: usize,
    },
    #[error("line {line}: bond joins atom {atom} to itself")]
    SelfBond { line: usize, atom: usize },
}

/// Thrown by the `parse_molfile*` functions.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("line {line}: unknown element symbol '{symbol}'")]
    UnknownElement { symbol: String, line: usize },
    #[error("could not read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read and parse the molfile at `p`.
pub fn parse_molfile(p: &Path, mode: ParseMode) -> Result<Molecule, ParserError> {
    let contents = fs::read_to_string(p).map_err(|source| ParserError::Io {
        path: p.to_path_buf(),
        source,
    })?;
    parse_molfile_str_with(&contents, mode)
}

/// Parse the contents of a molfile in [`ParseMode::Strict`].
pub fn parse_molfile_str(input: &str) -> Result<Molecule, ParserError> {
    parse_molfile_str_with(input, ParseMode::Strict)
}

/// Parse the contents of a molfile.
///
/// The counts line is validated first, then the `M  END` terminator, then the
/// atom and bond blocks in file order. Atom `i` of the atom block becomes node
/// `i` of the molecule. A bond declared twice on the same pair of atoms keeps
/// the attributes of its last declaration.
pub fn parse_molfile_str_with(input: &str, mode: ParseMode) -> Result<Molecule, ParserError> {
    if mode == ParseMode::Lenient {
        debug!("lenient parsing requested; no relaxed rules are defined, parsing strictly");
    }

    let lines: Vec<&str> = input.lines().collect();
    let (num_atoms, num_bonds) = parse_counts_line(&lines)?;
    check_end_tag(&lines)?;

    // Records must fit between the counts line and the terminator.
    let body_end = lines.len() - 1;
    let atom_start = COUNTS_LINE + 1;
    let atom_end = atom_start + num_atoms;
    if atom_end > body_end {
        return Err(FormatError::TruncatedBlock {
            block: Block::Atom,
            expected: num_atoms,
            found: body_end - atom_start,
        }
        .into());
    }
    let bond_end = atom_end + num_bonds;
    if bond_end > body_end {
        return Err(FormatError::TruncatedBlock {
            block: Block::Bond,
            expected: num_bonds,
            found: body_end - atom_end,
        }
        .into());
    }

    let mut mol_graph = MGraph::with_capacity(num_atoms, num_bonds);

    // Atoms block parse
    for (offset, atom_line) in lines[atom_start..atom_end].iter().enumerate() {
        let line = atom_start + offset + 1;
        let symbol = parse_atom_line(atom_line);
        let element: Element = symbol.parse().map_err(|_| ParserError::UnknownElement {
            symbol: symbol.to_string(),
            line,
        })?;
        mol_graph.add_node(Atom::new(element));
    }

    // Bonds block parse
    for (offset, bond_line) in lines[atom_end..bond_end].iter().enumerate() {
        let line = atom_end + offset + 1;
        let (atom_one, atom_two, order, config) = parse_bond_line(bond_line, line)?;
        let src = atom_index(atom_one, num_atoms, line)?;
        let dst = atom_index(atom_two, num_atoms, line)?;
        if src == dst {
            return Err(FormatError::SelfBond {
                line,
                atom: atom_one,
            }
            .into());
        }

        let bond = Bond::new(order, config);
        if let Some(ix) = mol_graph.find_edge(src, dst) {
            warn!(
                line,
                atom_one, atom_two, "bond declared twice, keeping the later declaration"
            );
            mol_graph[ix] = bond;
        } else {
            mol_graph.add_edge(src, dst, bond);
        }
    }

    Ok(Molecule::from_graph(mol_graph))
}

fn parse_counts_line(lines: &[&str]) -> Result<(usize, usize), FormatError> {
    let Some(counts_line) = lines.get(COUNTS_LINE) else {
        return Err(FormatError::MissingCountsLine { found: lines.len() });
    };

    let found_len = counts_line.chars().count();
    let found_tag: String = counts_line.chars().skip(33).take(6).collect();
    if found_len != COUNTS_LINE_LEN || found_tag != VERSION_TAG {
        return Err(FormatError::CountsLine {
            expected_len: COUNTS_LINE_LEN,
            found_len,
            expected_tag: VERSION_TAG,
            found_tag,
        });
    }

    let line = COUNTS_LINE + 1;
    Ok((
        parse_field(counts_line, line, 0, 3)?,
        parse_field(counts_line, line, 3, 6)?,
    ))
}

fn check_end_tag(lines: &[&str]) -> Result<(), FormatError> {
    match lines.last() {
        Some(&END_TAG) => Ok(()),
        last => Err(FormatError::EndTag {
            expected: END_TAG,
            found: last.copied().unwrap_or_default().to_string(),
        }),
    }
}

fn parse_atom_line(atom_line: &str) -> &str {
    column(atom_line, 31, 34).trim()
}

fn parse_bond_line(bond_line: &str, line: usize) -> Result<(usize, usize, u32, u32), FormatError> {
    Ok((
        parse_field(bond_line, line, 0, 3)?,
        parse_field(bond_line, line, 3, 6)?,
        parse_field(bond_line, line, 6, 9)?,
        parse_field(bond_line, line, 9, 12)?,
    ))
}

/// Convert a 1-based atom number from the bond block into a node index.
fn atom_index(atom: usize, num_atoms: usize, line: usize) -> Result<NodeIndex<u32>, FormatError> {
    if atom == 0 || atom > num_atoms {
        return Err(FormatError::AtomOutOfRange {
            line,
            atom,
            atoms: num_atoms,
        });
    }
    Ok(NodeIndex::new(atom - 1))
}

/// Characters `start..end` of `line`, cut short if the line is.
fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start.min(end)..end).unwrap_or_default()
}

fn parse_field<T: std::str::FromStr>(
    record: &str,
    line: usize,
    start: usize,
    end: usize,
) -> Result<T, FormatError> {
    let text = column(record, start, end);
    text.trim().parse().map_err(|_| FormatError::Integer {
        line,
        start,
        end,
        text: text.to_string(),
    })
}
