//! Signature scanning over a captured module image.

use tracing::debug;

use crate::error::{Error, Result};
use crate::offset::signature::{ResolveMode, SignatureSpec};
use crate::process::{ModuleImage, Pattern};

/// Offset within the image of the first (lowest) match of `pattern`.
pub fn find_pattern(image: &ModuleImage, pattern: &Pattern) -> Option<usize> {
    pattern.find_in(image.bytes())
}

/// Recover a module-relative data offset from an instruction that references
/// it through a 32-bit displacement.
///
/// Reads the displacement at `match_address + operand_offset` and computes
/// `(match_address - base) + instruction_len + displacement + fixup`.
pub fn resolve_relative_offset(
    image: &ModuleImage,
    match_address: u64,
    operand_offset: i64,
    instruction_len: i64,
    fixup: i64,
) -> Result<u64> {
    let match_offset = match_address.wrapping_sub(image.base()) as i64;
    let displacement = read_displacement(image, match_offset, operand_offset)?;
    Ok((match_offset + instruction_len + displacement + fixup) as u64)
}

/// Module offset stored directly in an instruction operand, plus `fixup`.
pub fn resolve_absolute_offset(
    image: &ModuleImage,
    match_address: u64,
    operand_offset: i64,
    fixup: i64,
) -> Result<u64> {
    let match_offset = match_address.wrapping_sub(image.base()) as i64;
    let displacement = read_displacement(image, match_offset, operand_offset)?;
    Ok((displacement + fixup) as u64)
}

fn read_displacement(image: &ModuleImage, match_offset: i64, operand_offset: i64) -> Result<i64> {
    let operand = match_offset + operand_offset;
    if operand < 0 {
        return Err(Error::decode(
            image.base().wrapping_add_signed(operand),
            "operand lies before the module image",
        ));
    }
    Ok(image.read_i32_at(operand as usize)? as i64)
}

/// Scan for one signature and derive its module-relative offset.
pub fn resolve_signature(image: &ModuleImage, spec: &SignatureSpec) -> Result<u64> {
    let pattern = spec.parsed_pattern()?;
    let found = find_pattern(image, &pattern).ok_or_else(|| Error::SignatureNotFound {
        name: spec.name.clone(),
    })?;
    let match_address = image.base() + found as u64;
    debug!(
        "  {}: pattern matched at +{:#x} ({})",
        spec.name, found, spec.mode
    );

    match spec.mode {
        ResolveMode::Relative => resolve_relative_offset(
            image,
            match_address,
            spec.operand_offset,
            spec.instruction_len,
            spec.fixup,
        ),
        ResolveMode::Absolute => {
            resolve_absolute_offset(image, match_address, spec.operand_offset, spec.fixup)
        }
    }
}
