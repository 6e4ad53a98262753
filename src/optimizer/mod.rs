// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Delay-slot optimization passes.
//!
//! Two passes run over the root list, in a fixed order: branch-target
//! hoisting first (it needs the un-filled nop after each branch), then
//! basic-block delay-slot filling. Both scan forward for `nop`
//! instructions and keep a per-pass set of nops proven unoptimizable, so
//! each pass terminates once every remaining nop is pinned. Within a pass
//! the forward scan order is the only processing order; the whole
//! optimizer is deterministic.

mod fill;
mod hoist;

use std::collections::HashSet;

use crate::core::error::SourceError;
use crate::sparc::opcodes::Opcode;
use crate::syntax::ast::{DirectiveArg, Item, ItemId, Unit};

/// Optimize `unit` in place. Expects parsing and label resolution to have
/// completed. Only returns an error on an internal invariant violation.
pub fn run(unit: &mut Unit) -> Result<(), SourceError> {
    let globals = global_names(unit);
    hoist::run(unit, &globals)?;
    fill::run(unit);
    Ok(())
}

/// Names declared externally visible by a `.global` directive. Their label
/// blocks must keep their shape, so the hoist pass skips them.
fn global_names(unit: &Unit) -> HashSet<String> {
    unit.iter()
        .filter_map(|id| match unit.item(id) {
            Item::Directive(directive) if directive.name == "global" => {
                match &directive.arg {
                    DirectiveArg::Name(name) => Some(name.clone()),
                    DirectiveArg::Str(_) => None,
                }
            }
            _ => None,
        })
        .collect()
}

/// First `nop` in root-list order that has not been pinned by this pass.
fn next_candidate_nop(unit: &Unit, pinned: &HashSet<ItemId>) -> Option<ItemId> {
    unit.iter().find(|&id| {
        !pinned.contains(&id)
            && unit
                .as_instr(id)
                .map(|inst| inst.op == Opcode::Nop)
                .unwrap_or(false)
    })
}
