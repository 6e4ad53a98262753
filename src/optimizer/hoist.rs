// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Branch-target hoisting.
//!
//! When a branch is followed by a delay-slot `nop` and its target label
//! starts with a single-cycle instruction, that instruction can serve as
//! the delay-slot payload of every branch to the label: each branch gets a
//! clone of it in place of the nop and its annul bit set, so the payload
//! executes only on the taken path. The original instruction moves to just
//! above the label declaration, keeping it on every fall-through path into
//! the block.
//!
//! The rewrite is all-or-nothing per label: every branch to it must be
//! un-annulled and still carry its `nop`, the label must not be exported
//! via `.global`, and the target block must not consist of a lone final
//! instruction. Once a label is rewritten its block starts differently, so
//! the hoist never fires twice for the same label.

use std::collections::HashSet;

use crate::core::error::SourceError;
use crate::sparc::opcodes::Opcode;
use crate::syntax::ast::{Item, ItemId, Unit};

pub(super) fn run(unit: &mut Unit, globals: &HashSet<String>) -> Result<(), SourceError> {
    let mut pinned: HashSet<ItemId> = HashSet::new();
    while let Some(nop) = super::next_candidate_nop(unit, &pinned) {
        if !step(unit, nop, globals)? {
            pinned.insert(nop);
        }
    }
    Ok(())
}

/// Attempt the rewrite for one candidate nop. `Ok(false)` pins the nop for
/// the rest of this pass; the fill pass reconsiders it later.
fn step(unit: &mut Unit, nop: ItemId, globals: &HashSet<String>) -> Result<bool, SourceError> {
    let Some(branch_id) = unit.prev(nop) else {
        return Ok(false);
    };
    let decl_id = {
        let Some(inst) = unit.as_instr(branch_id) else {
            return Ok(false);
        };
        if !inst.op.is_branch() || inst.annulled {
            return Ok(false);
        }
        let Some(target) = inst.target() else {
            return Ok(false);
        };
        match target.decl.get() {
            Some(decl) => decl,
            None => return Ok(false),
        }
    };
    let Item::LabelDecl { name } = unit.item(decl_id) else {
        return Ok(false);
    };
    let name = name.clone();
    if globals.contains(&name) {
        return Ok(false);
    }

    let Some(first_id) = unit.next(decl_id) else {
        return Ok(false);
    };
    {
        let Some(first) = unit.as_instr(first_id) else {
            return Ok(false);
        };
        if first.op.is_two_cycle() {
            return Ok(false);
        }
    }
    // Lifting the block's only remaining instruction would leave the label
    // dangling at the end of the unit; leave such blocks alone.
    match unit.next(first_id) {
        None => return Ok(false),
        Some(after) if matches!(unit.item(after), Item::Eof) => return Ok(false),
        Some(_) => {}
    }

    // Every branch to the label takes part in the rewrite, so each must
    // still have its slot nop and must not already be annulled.
    let mut branches = Vec::new();
    for id in unit.iter() {
        let Some(inst) = unit.as_instr(id) else {
            continue;
        };
        if !inst.op.is_branch() {
            continue;
        }
        let Some(target) = inst.target() else {
            continue;
        };
        if target.name != name {
            continue;
        }
        if inst.annulled {
            return Ok(false);
        }
        let slot_is_nop = unit
            .next(id)
            .and_then(|slot| unit.as_instr(slot))
            .map(|slot| slot.op == Opcode::Nop)
            .unwrap_or(false);
        if !slot_is_nop {
            return Ok(false);
        }
        branches.push(id);
    }

    unit.unlink(first_id);
    unit.insert_before(decl_id, first_id);
    for branch_id in branches {
        let slot = unit
            .next(branch_id)
            .filter(|&slot| {
                unit.as_instr(slot)
                    .map(|inst| inst.op == Opcode::Nop)
                    .unwrap_or(false)
            })
            .ok_or_else(|| SourceError::internal("expected nop after branch"))?;
        unit.unlink(slot);
        let clone = unit
            .clone_instr(first_id)
            .ok_or_else(|| SourceError::internal("hoisted item is not an instruction"))?;
        unit.insert_after(branch_id, clone);
        let blank = unit.alloc(Item::Blank);
        unit.insert_after(clone, blank);
        if let Item::Instr(inst) = unit.item_mut(branch_id) {
            inst.annulled = true;
        }
    }
    Ok(true)
}
