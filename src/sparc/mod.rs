// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! SPARC instruction-set knowledge: registers, the opcode table, and the
//! per-instruction register effect model the optimizer relies on.

pub mod effects;
pub mod opcodes;
pub mod registers;
