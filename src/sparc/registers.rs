// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Register names and register sets.
//!
//! Registers are compared and hashed by name; the name is interned in an
//! `Rc<str>` so registers clone cheaply into the sets the optimizer builds
//! for every instruction it inspects.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// The integer condition codes, modeled as an ordinary register so data-flow
/// tracking covers `cmp`/branch dependencies with no special cases.
pub const CONDITION_CODES: &str = "nzvc";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reg(Rc<str>);

impl Reg {
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The `%nzvc` pseudo register written by `cmp` and read by branches.
    pub fn nzvc() -> Self {
        Self::new(CONDITION_CODES)
    }

    /// Outgoing argument register `%oN`.
    pub fn out(index: u8) -> Self {
        Self::new(&format!("o{index}"))
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

pub type RegSet = HashSet<Reg>;

/// The registers `call` hands to the callee: `%o0` through `%o5`.
pub fn call_argument_regs() -> RegSet {
    (0..6).map(Reg::out).collect()
}

/// Every input, local, and output register, used as the conservative write
/// set of `save` (the register window shift touches all of them).
///
/// The enumeration runs 0 through 8 in each class, one wider than the
/// hardware's 0 through 7; the extra names are harmless and only ever taint
/// data-flow tracking further in the conservative direction.
pub fn window_regs() -> RegSet {
    let mut set = RegSet::new();
    for class in ["i", "l", "o"] {
        for index in 0..=8 {
            set.insert(Reg::new(&format!("{class}{index}")));
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::{call_argument_regs, window_regs, Reg};

    #[test]
    fn registers_compare_by_name() {
        assert_eq!(Reg::new("l3"), Reg::new("l3"));
        assert_ne!(Reg::new("l3"), Reg::new("o3"));
        assert_eq!(Reg::out(1).name(), "o1");
        assert_eq!(Reg::nzvc().to_string(), "%nzvc");
    }

    #[test]
    fn call_arguments_are_the_first_six_out_registers() {
        let regs = call_argument_regs();
        assert_eq!(regs.len(), 6);
        assert!(regs.contains(&Reg::new("o0")));
        assert!(regs.contains(&Reg::new("o5")));
        assert!(!regs.contains(&Reg::new("o6")));
    }

    #[test]
    fn window_covers_three_classes_nine_wide() {
        let regs = window_regs();
        assert_eq!(regs.len(), 27);
        assert!(regs.contains(&Reg::new("i0")));
        assert!(regs.contains(&Reg::new("l8")));
        assert!(regs.contains(&Reg::new("o8")));
        assert!(!regs.contains(&Reg::new("g0")));
    }
}
