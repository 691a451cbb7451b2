//! Library linking for compiled contract bytecode.
//!
//! Contracts that call external libraries compile with placeholder slots in
//! their bytecode, one slot per call site. The artifact's link-reference map
//! declares where those slots sit. Linking validates the caller's bindings
//! against that map and writes each library address over its slots.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, Address};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use evm_harness_kit::artifacts::{ContractArtifact, Offsets};
use evm_harness_kit::indexmap::IndexMap;

use crate::errors::LinkError;

/// How a binding names its library. The bare form matches on library name
/// alone; the qualified `"<source>:<library>"` form pins the source file too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LibraryId {
    Bare(String),
    FullyQualified { source_name: String, library_name: String },
}

impl LibraryId {
    /// Splits on the last `:` so Windows-style source paths keep working.
    pub fn parse(id: &str) -> Self {
        match id.rsplit_once(':') {
            Some((source_name, library_name)) => LibraryId::FullyQualified {
                source_name: source_name.to_string(),
                library_name: library_name.to_string(),
            },
            None => LibraryId::Bare(id.to_string()),
        }
    }

    fn matches(&self, needed: &NeededLibrary) -> bool {
        match self {
            LibraryId::Bare(library_name) => needed.library_name.eq(library_name),
            LibraryId::FullyQualified { source_name, library_name } => {
                needed.source_name.eq(source_name) && needed.library_name.eq(library_name)
            }
        }
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryId::Bare(library_name) => write!(f, "{}", library_name),
            LibraryId::FullyQualified { source_name, library_name } => {
                write!(f, "{}:{}", source_name, library_name)
            }
        }
    }
}

impl Serialize for LibraryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LibraryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LibraryId::parse(&raw))
    }
}

/// One caller supplied `(library, address)` pair. Bindings are applied in
/// the order they are given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryBinding {
    pub id: LibraryId,
    pub address: String,
}

impl LibraryBinding {
    pub fn new(id: &str, address: impl Into<String>) -> Self {
        Self { id: LibraryId::parse(id), address: address.into() }
    }
}

/// One distinct library declared by an artifact's link references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeededLibrary {
    pub source_name: String,
    pub library_name: String,
}

impl NeededLibrary {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.library_name)
    }
}

/// A binding matched to exactly one declared library, address parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLink {
    pub source_name: String,
    pub library_name: String,
    pub address: Address,
}

impl ResolvedLink {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.library_name)
    }
}

/// Flattens an artifact's link references into the ordered list of distinct
/// libraries its bytecode needs.
pub fn needed_libraries(artifact: &ContractArtifact) -> Vec<NeededLibrary> {
    let mut needed = vec![];
    for (source_name, libraries) in artifact.link_references.iter() {
        for library_name in libraries.keys() {
            needed.push(NeededLibrary {
                source_name: source_name.clone(),
                library_name: library_name.clone(),
            });
        }
    }
    needed
}

/// Validates bindings against the artifact's link references. Every binding
/// must name exactly one declared library, no library may be bound twice, and
/// every declared library must end up bound.
pub fn resolve_links(
    artifact: &ContractArtifact,
    bindings: &[LibraryBinding],
) -> Result<Vec<ResolvedLink>, LinkError> {
    let needed = needed_libraries(artifact);
    let mut resolved: IndexMap<String, ResolvedLink> = IndexMap::new();

    for binding in bindings.iter() {
        let address =
            Address::from_str(&binding.address).map_err(|_| LinkError::InvalidAddress {
                id: binding.id.to_string(),
                address: binding.address.clone(),
            })?;

        let matches: Vec<&NeededLibrary> =
            needed.iter().filter(|entry| binding.id.matches(entry)).collect();

        let entry = match matches.as_slice() {
            [] => {
                return Err(LinkError::UnknownLibrary {
                    id: binding.id.to_string(),
                    needed: describe_needed(&needed),
                })
            }
            [entry] => *entry,
            candidates => {
                return Err(LinkError::AmbiguousLibraryName {
                    id: binding.id.to_string(),
                    candidates: candidates
                        .iter()
                        .map(|entry| entry.fully_qualified_name())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        };

        let fully_qualified_name = entry.fully_qualified_name();
        if resolved.contains_key(&fully_qualified_name) {
            return Err(LinkError::DuplicateLinkEntry(fully_qualified_name));
        }
        resolved.insert(
            fully_qualified_name,
            ResolvedLink {
                source_name: entry.source_name.clone(),
                library_name: entry.library_name.clone(),
                address,
            },
        );
    }

    if resolved.len() < needed.len() {
        let missing = needed
            .iter()
            .filter(|entry| !resolved.contains_key(&entry.fully_qualified_name()))
            .map(|entry| entry.fully_qualified_name())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(LinkError::MissingLibraries(missing));
    }

    Ok(resolved.into_values().collect())
}

/// Resolves the bindings and writes each library address over every slot the
/// artifact declares for it. Returns the linked bytecode hex; the artifact
/// itself is left untouched. With no link references and no bindings the
/// bytecode comes back byte for byte identical.
pub fn link_bytecode(
    artifact: &ContractArtifact,
    bindings: &[LibraryBinding],
) -> Result<String, LinkError> {
    let resolved = resolve_links(artifact, bindings)?;

    let mut bytecode = artifact.bytecode.clone();
    let base = if bytecode.starts_with("0x") { 2 } else { 0 };

    for link in resolved.iter() {
        let slots = artifact
            .link_references
            .get(&link.source_name)
            .and_then(|libraries| libraries.get(&link.library_name))
            .map(|slots| slots.as_slice())
            .unwrap_or_default();

        let address_hex = hex::encode(link.address.as_slice());

        for slot in slots.iter() {
            patch_slot(&mut bytecode, base, slot, &address_hex, &link.fully_qualified_name())?;
        }
    }

    Ok(bytecode)
}

fn patch_slot(
    bytecode: &mut String,
    base: usize,
    slot: &Offsets,
    address_hex: &str,
    fully_qualified_name: &str,
) -> Result<(), LinkError> {
    let start = base + (slot.start as usize) * 2;
    let end = base + (slot.start as usize + slot.length as usize) * 2;
    if end > bytecode.len() {
        return Err(LinkError::SlotOutOfRange {
            fully_qualified_name: fully_qualified_name.to_string(),
            start: slot.start,
            length: slot.length,
            bytecode_bytes: bytecode.len().saturating_sub(base) / 2,
        });
    }
    bytecode.replace_range(start..end, address_hex);
    Ok(())
}

fn describe_needed(needed: &[NeededLibrary]) -> String {
    if needed.is_empty() {
        "none".to_string()
    } else {
        needed
            .iter()
            .map(|entry| entry.fully_qualified_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
