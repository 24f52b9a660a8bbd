//! Bulk region import from a line-based text format.
//!
//! One region per line: `CODE,terrain,owner,upgrade|upgrade|...`. The owner
//! is a faction slot number or empty/`-` for unowned land; the upgrade list
//! may be empty. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! # code,terrain,owner,upgrades
//! A1,plains,1,Farm|Farm|Town
//! B4,mountains,-,Mine|Keep
//! C2,coastal,,
//! ```
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use thiserror::Error;

use crate::buildings::{Building, UnknownBuilding};
use crate::faction::{FactionId, RegionId};
use crate::region::Region;
use crate::terrain::{Terrain, UnknownTerrain};

const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ImportError {
    pub line: usize,
    pub kind: ImportErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportErrorKind {
    #[error("expected {FIELD_COUNT} comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("`{0}` is not a region code (letters then digits, e.g. C7)")]
    InvalidCode(String),
    #[error("region {0} appears more than once")]
    DuplicateCode(String),
    #[error(transparent)]
    Terrain(#[from] UnknownTerrain),
    #[error("`{0}` is not a faction slot")]
    InvalidOwner(String),
    #[error(transparent)]
    Building(#[from] UnknownBuilding),
    #[error("{building} not allowed: {reason}")]
    Rule { building: Building, reason: String },
}

fn region_code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z]{1,2}[0-9]{1,3}$").ok())
        .as_ref()
}

#[must_use]
pub fn is_region_code_valid(code: &str) -> bool {
    region_code_pattern().is_some_and(|re| re.is_match(code))
}

/// Parse every region in `input`, stopping at the first bad line.
///
/// Upgrades are applied in order through the terrain rules, so a listed
/// Town replaces an earlier Village just as building it would.
///
/// # Errors
///
/// Returns `ImportError` carrying the 1-based line number.
pub fn import_regions(input: &str) -> Result<Vec<Region>, ImportError> {
    let mut regions = Vec::new();
    let mut seen = BTreeSet::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let region = parse_line(trimmed).map_err(|kind| ImportError { line, kind })?;
        if !seen.insert(region.code.clone()) {
            return Err(ImportError {
                line,
                kind: ImportErrorKind::DuplicateCode(region.code),
            });
        }
        regions.push(region);
    }
    Ok(regions)
}

fn parse_line(line: &str) -> Result<Region, ImportErrorKind> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [code, terrain, owner, upgrades] = fields.as_slice() else {
        return Err(ImportErrorKind::FieldCount(fields.len()));
    };

    let code = code.to_ascii_uppercase();
    if !is_region_code_valid(&code) {
        return Err(ImportErrorKind::InvalidCode(code));
    }
    let terrain: Terrain = terrain.parse()?;
    let owner = parse_owner(owner)?;

    let mut region = Region::new(RegionId::new(format!("region-{code}")), code, terrain);
    region.owner = owner;
    for token in upgrades.split('|').map(str::trim).filter(|t| !t.is_empty()) {
        let building: Building = token.parse()?;
        let check = region.try_build(building);
        if !check.allowed {
            return Err(ImportErrorKind::Rule {
                building,
                reason: check.reason,
            });
        }
    }
    Ok(region)
}

fn parse_owner(raw: &str) -> Result<Option<FactionId>, ImportErrorKind> {
    if raw.is_empty() || raw == "-" {
        return Ok(None);
    }
    match raw.parse::<u8>() {
        Ok(slot) if slot > 0 => Ok(Some(FactionId(slot))),
        _ => Err(ImportErrorKind::InvalidOwner(raw.to_string())),
    }
}
