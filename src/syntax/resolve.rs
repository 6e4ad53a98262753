// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Label back-reference fix-up.
//!
//! Runs once after parsing: every label operand gets the item id of its
//! declaration when the unit defines one. References to labels the unit
//! does not define stay unresolved; they name external code and simply
//! make their branch or call ineligible for target hoisting.

use crate::syntax::ast::{Item, Operand, Unit};

pub fn resolve_labels(unit: &Unit) {
    for id in unit.iter() {
        let Item::Instr(inst) = unit.item(id) else {
            continue;
        };
        for arg in &inst.args {
            if let Operand::Label(label) = arg.as_ref() {
                if let Some(&decl) = unit.labels.get(&label.name) {
                    label.decl.set(Some(decl));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_labels;
    use crate::syntax::ast::{Item, Operand};
    use crate::syntax::parser::parse;

    #[test]
    fn references_attach_to_their_declarations() {
        let unit = parse(None, "\tba done\n\tnop\ndone:\n\tnop").expect("parse");
        resolve_labels(&unit);
        let branch = unit
            .iter()
            .find_map(|id| unit.as_instr(id))
            .expect("branch");
        let target = branch.target().expect("label operand");
        let decl = target.decl.get().expect("resolved");
        assert!(matches!(unit.item(decl), Item::LabelDecl { name } if name == "done"));
    }

    #[test]
    fn external_references_stay_unresolved() {
        let unit = parse(None, "\tcall .mul\n\tnop").expect("parse");
        resolve_labels(&unit);
        for id in unit.iter() {
            let Some(inst) = unit.as_instr(id) else {
                continue;
            };
            for arg in &inst.args {
                if let Operand::Label(label) = arg.as_ref() {
                    assert_eq!(label.decl.get(), None);
                    assert_eq!(label.name, ".mul");
                }
            }
        }
    }
}
