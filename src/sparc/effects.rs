// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-instruction register effect model.
//!
//! [`reads`] and [`writes`] return the registers an instruction logically
//! consumes and produces. The model is conservative where the hardware is
//! complicated: `save` writes the entire register window, `call` reads all
//! six outgoing argument registers, and `cmp`/branches communicate through
//! the `%nzvc` pseudo register.

use crate::sparc::opcodes::Opcode;
use crate::sparc::registers::{call_argument_regs, window_regs, Reg, RegSet};
use crate::syntax::ast::{Addr, AddrOffset, Inst, Operand};

/// Registers read by `inst`, traversing address operands transitively.
pub fn reads(inst: &Inst) -> RegSet {
    let mut set = RegSet::new();
    match inst.op {
        Opcode::Nop | Opcode::Ret | Opcode::Restore => {}
        Opcode::Mov | Opcode::Set => collect(&mut set, inst.args.first()),
        Opcode::Save
        | Opcode::Cmp
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Srl
        | Opcode::Sll
        | Opcode::Sra => {
            collect(&mut set, inst.args.first());
            collect(&mut set, inst.args.get(1));
        }
        Opcode::Call => set.extend(call_argument_regs()),
        Opcode::Bne
        | Opcode::Be
        | Opcode::Ba
        | Opcode::Bn
        | Opcode::Bge
        | Opcode::Bg
        | Opcode::Ble
        | Opcode::Bl => {
            set.insert(Reg::nzvc());
        }
        // Loads read the registers their address names.
        Opcode::Ld | Opcode::Ldub | Opcode::Ldsb | Opcode::Lduh | Opcode::Ldsh => {
            collect(&mut set, inst.args.first());
        }
        // Stores read the data register and the address registers.
        Opcode::St | Opcode::Sth | Opcode::Stb => {
            collect(&mut set, inst.args.first());
            collect(&mut set, inst.args.get(1));
        }
    }
    set
}

/// Registers written by `inst`.
pub fn writes(inst: &Inst) -> RegSet {
    let mut set = RegSet::new();
    match inst.op {
        Opcode::Nop | Opcode::Ret | Opcode::Restore => {}
        Opcode::Mov | Opcode::Set => collect_reg(&mut set, inst.args.get(1)),
        Opcode::Save => {
            collect_reg(&mut set, inst.args.get(2));
            set.extend(window_regs());
        }
        Opcode::Add | Opcode::Sub | Opcode::Srl | Opcode::Sll | Opcode::Sra => {
            collect_reg(&mut set, inst.args.get(2));
        }
        Opcode::Call => {
            set.insert(Reg::out(0));
        }
        Opcode::Cmp => {
            set.insert(Reg::nzvc());
        }
        Opcode::Bne
        | Opcode::Be
        | Opcode::Ba
        | Opcode::Bn
        | Opcode::Bge
        | Opcode::Bg
        | Opcode::Ble
        | Opcode::Bl => {}
        // Loads write their destination register; stores write memory only.
        Opcode::Ld | Opcode::Ldub | Opcode::Ldsb | Opcode::Lduh | Opcode::Ldsh => {
            collect_reg(&mut set, inst.args.get(1));
        }
        Opcode::St | Opcode::Sth | Opcode::Stb => {}
    }
    set
}

fn collect(set: &mut RegSet, operand: Option<&std::rc::Rc<Operand>>) {
    let Some(operand) = operand else { return };
    match operand.as_ref() {
        Operand::Reg(reg) => {
            set.insert(reg.clone());
        }
        Operand::Addr(Addr { base, offset, .. }) => {
            set.insert(base.clone());
            if let Some(AddrOffset::Reg(reg)) = offset {
                set.insert(reg.clone());
            }
        }
        Operand::Imm(_) | Operand::Label(_) => {}
    }
}

fn collect_reg(set: &mut RegSet, operand: Option<&std::rc::Rc<Operand>>) {
    if let Some(operand) = operand {
        if let Operand::Reg(reg) = operand.as_ref() {
            set.insert(reg.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{reads, writes};
    use crate::sparc::registers::Reg;
    use crate::syntax::parser::parse;

    fn effect_sets(source: &str) -> (Vec<String>, Vec<String>) {
        let unit = parse(None, source).expect("parse");
        let id = unit
            .iter()
            .find(|id| unit.as_instr(*id).is_some())
            .expect("one instruction");
        let inst = unit.as_instr(id).expect("instr");
        let mut r: Vec<String> = reads(inst).iter().map(|r| r.name().to_string()).collect();
        let mut w: Vec<String> = writes(inst).iter().map(|r| r.name().to_string()).collect();
        r.sort();
        w.sort();
        (r, w)
    }

    #[test]
    fn mov_reads_source_and_writes_destination() {
        let (r, w) = effect_sets("\tmov %l1, %o0");
        assert_eq!(r, vec!["l1"]);
        assert_eq!(w, vec!["o0"]);

        let (r, w) = effect_sets("\tmov 2, %l3");
        assert!(r.is_empty());
        assert_eq!(w, vec!["l3"]);
    }

    #[test]
    fn cmp_and_branches_meet_in_the_condition_codes() {
        let (r, w) = effect_sets("\tcmp %l0, %l1");
        assert_eq!(r, vec!["l0", "l1"]);
        assert_eq!(w, vec!["nzvc"]);

        let (r, w) = effect_sets("\tbge somewhere");
        assert_eq!(r, vec!["nzvc"]);
        assert!(w.is_empty());
    }

    #[test]
    fn call_reads_argument_registers_and_writes_the_result() {
        let (r, w) = effect_sets("\tcall .mul");
        assert_eq!(r, vec!["o0", "o1", "o2", "o3", "o4", "o5"]);
        assert_eq!(w, vec!["o0"]);
    }

    #[test]
    fn save_writes_the_whole_register_window() {
        let (r, w) = effect_sets("\tsave %sp, -96, %sp");
        assert_eq!(r, vec!["sp"]);
        assert_eq!(w.len(), 27 + 1);
        assert!(w.contains(&"sp".to_string()));
        assert!(w.contains(&"i8".to_string()));
        assert!(w.contains(&"o0".to_string()));
    }

    #[test]
    fn alu_ops_write_only_the_third_argument() {
        let (r, w) = effect_sets("\tadd %l0, %l1, %l2");
        assert_eq!(r, vec!["l0", "l1"]);
        assert_eq!(w, vec!["l2"]);

        let (r, w) = effect_sets("\tsll %l0, 2, %l2");
        assert_eq!(r, vec!["l0"]);
        assert_eq!(w, vec!["l2"]);
    }

    #[test]
    fn loads_read_the_address_and_write_the_destination() {
        let (r, w) = effect_sets("\tld [%l0 + %l1], %o2");
        assert_eq!(r, vec!["l0", "l1"]);
        assert_eq!(w, vec!["o2"]);

        let (r, w) = effect_sets("\tldub [%fp - 4], %l3");
        assert_eq!(r, vec!["fp"]);
        assert_eq!(w, vec!["l3"]);
    }

    #[test]
    fn stores_read_both_operands_and_write_no_register() {
        let (r, w) = effect_sets("\tst %o0, [%fp + %l1]");
        assert_eq!(r, vec!["fp", "l1", "o0"]);
        assert!(w.is_empty());
    }

    #[test]
    fn no_argument_ops_touch_nothing() {
        for source in ["\tnop", "\tret", "\trestore"] {
            let (r, w) = effect_sets(source);
            assert!(r.is_empty(), "{source}");
            assert!(w.is_empty(), "{source}");
        }
    }
}
