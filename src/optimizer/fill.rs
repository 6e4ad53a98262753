// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Basic-block delay-slot filling.
//!
//! For each `nop` sitting in the delay slot of a preceding instruction,
//! walk backwards through the basic block looking for a single-cycle
//! instruction that can legally move into the slot. An instruction
//! qualifies when neither its reads nor its writes intersect the set of
//! registers touched between its position and the slot; when the slotted
//! instruction is a branch, the branch's own source registers are poisoned
//! from the start, so nothing that writes them can slide past it. The walk
//! never crosses a label declaration or another branch.
//!
//! A `nop` that does not sit in a delay slot at all fills nothing and is
//! simply dropped.

use std::collections::HashSet;

use crate::sparc::effects::{reads, writes};
use crate::sparc::registers::RegSet;
use crate::syntax::ast::{Item, ItemId, Unit};

pub(super) fn run(unit: &mut Unit) {
    let mut pinned: HashSet<ItemId> = HashSet::new();
    while let Some(nop) = super::next_candidate_nop(unit, &pinned) {
        step(unit, nop, &mut pinned);
    }
}

fn step(unit: &mut Unit, nop: ItemId, pinned: &mut HashSet<ItemId>) {
    let prev = unit.prev(nop);
    let slotted = prev.and_then(|id| {
        unit.as_instr(id).map(|inst| {
            (
                inst.op.has_delay_slot(),
                inst.annulled,
                if inst.op.is_branch() {
                    reads(inst)
                } else {
                    RegSet::new()
                },
            )
        })
    });

    let Some((has_delay_slot, annulled, forbidden)) = slotted else {
        // Not preceded by an instruction: a gratuitous nop.
        unit.unlink(nop);
        return;
    };
    if !has_delay_slot {
        unit.unlink(nop);
        return;
    }
    if annulled {
        // An annulled slot executes only on the taken path; an instruction
        // hoisted from above would wrongly vanish from the fall-through.
        pinned.insert(nop);
        return;
    }

    match find_filler(unit, prev.expect("slotted instruction exists"), forbidden) {
        Some(filler) => {
            unit.unlink(filler);
            unit.insert_before(nop, filler);
            let blank = unit.alloc(Item::Blank);
            unit.insert_after(filler, blank);
            unit.unlink(nop);
        }
        None => {
            pinned.insert(nop);
        }
    }
}

/// Walk backwards from the item before `slotted`, growing the tainted set,
/// until a safe filler, a label, a branch, or the list head stops the scan.
fn find_filler(unit: &Unit, slotted: ItemId, mut tainted: RegSet) -> Option<ItemId> {
    let mut cursor = unit.prev(slotted);
    while let Some(id) = cursor {
        match unit.item(id) {
            Item::LabelDecl { .. } => return None,
            Item::Instr(inst) => {
                if inst.op.is_branch() {
                    return None;
                }
                // An instruction already sitting in a delay slot belongs to
                // that slot's owner and cannot be taken from it.
                let occupies_slot = unit
                    .prev(id)
                    .and_then(|p| unit.as_instr(p))
                    .map(|p| p.op.has_delay_slot())
                    .unwrap_or(false);
                let inst_reads = reads(inst);
                let inst_writes = writes(inst);
                if !inst.op.is_two_cycle()
                    && !occupies_slot
                    && inst_reads.is_disjoint(&tainted)
                    && inst_writes.is_disjoint(&tainted)
                {
                    return Some(id);
                }
                tainted.extend(inst_reads);
                tainted.extend(inst_writes);
            }
            // Comments, blanks, declarations and directives neither move
            // nor constrain data flow.
            _ => {}
        }
        cursor = unit.prev(id);
    }
    None
}
