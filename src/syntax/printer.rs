// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Deterministic text rendering of a compilation unit.
//!
//! Every root item ends its own output line. Instructions render with a
//! leading tab, the mnemonic (plus `,a` when annulled), a tab, and the
//! arguments joined by `,\t`; label declarations get a blank line above
//! them. Number literals keep the spelling they had in the source. The
//! rendering is whitespace-normalized, not byte-identical to the input.

use std::fmt::Write as _;

use crate::syntax::ast::{
    Addr, AddrOffset, DirectiveArg, Expr, Inst, Item, Operand, Sign, Unit,
};

pub fn render(unit: &Unit) -> String {
    let mut out = String::new();
    for id in unit.iter() {
        match unit.item(id) {
            Item::Comment(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Item::Directive(directive) => {
                let arg = match &directive.arg {
                    DirectiveArg::Str(text) => format!("\"{text}\""),
                    DirectiveArg::Name(name) => name.clone(),
                };
                let _ = writeln!(out, "\t.{} {}", directive.name, arg);
            }
            Item::LabelDecl { name } => {
                let _ = writeln!(out, "\n{name}:");
            }
            Item::ConstDecl { name, value } => {
                let _ = writeln!(out, "{name} = {}", render_expr(value));
            }
            Item::Instr(inst) => {
                out.push_str(&render_inst(inst));
                out.push('\n');
            }
            Item::Blank => out.push('\n'),
            Item::Eof => {}
        }
    }
    out
}

fn render_inst(inst: &Inst) -> String {
    let mut line = String::from("\t");
    line.push_str(inst.op.mnemonic());
    if inst.annulled {
        line.push_str(",a");
    }
    if !inst.args.is_empty() {
        line.push('\t');
        let args: Vec<String> = inst.args.iter().map(|a| render_operand(a)).collect();
        line.push_str(&args.join(",\t"));
    }
    line
}

fn render_operand(operand: &Operand) -> String {
    match operand {
        Operand::Reg(reg) => reg.to_string(),
        Operand::Imm(expr) => render_expr(expr),
        Operand::Label(label) => label.name.clone(),
        Operand::Addr(addr) => render_addr(addr),
    }
}

fn render_addr(addr: &Addr) -> String {
    let mut out = format!("[{}", addr.base);
    if let (Some(sign), Some(offset)) = (&addr.sign, &addr.offset) {
        out.push_str(match sign {
            Sign::Plus => " + ",
            Sign::Minus => " - ",
        });
        match offset {
            AddrOffset::Reg(reg) => out.push_str(&reg.to_string()),
            AddrOffset::Imm(expr) => out.push_str(&render_expr(expr)),
        }
    }
    out.push(']');
    out
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Num { text, .. } => text.clone(),
        Expr::Str(text) => format!("\"{text}\""),
        Expr::Char(ch) => format!("'{ch}'"),
        Expr::ConstRef { name, .. } => name.clone(),
        Expr::Neg(inner) => format!("-{}", render_expr(inner)),
        Expr::Paren(inner) => format!("({})", render_expr(inner)),
        Expr::Bin { op, left, right } => format!(
            "{} {} {}",
            render_expr(left),
            op.symbol(),
            render_expr(right)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::syntax::parser::parse;

    fn round_trip(source: &str) -> String {
        render(&parse(None, source).expect("parse"))
    }

    fn stripped(text: &str) -> String {
        text.chars().filter(|ch| !ch.is_whitespace()).collect()
    }

    #[test]
    fn instructions_render_tab_separated_with_comma_tab_arguments() {
        let out = round_trip("\tmov 2, %l3");
        assert_eq!(out, "\tmov\t2,\t%l3\n");

        let out = round_trip("\tadd %l0, %l1, %l2");
        assert_eq!(out, "\tadd\t%l0,\t%l1,\t%l2\n");
    }

    #[test]
    fn annulled_branches_render_the_marker_on_the_mnemonic() {
        let out = round_trip("\tbne,a out");
        assert_eq!(out, "\tbne,a\tout\n");
    }

    #[test]
    fn labels_get_a_leading_blank_line() {
        let out = round_trip("main:\n\tnop");
        assert_eq!(out, "\nmain:\n\tnop\n");
    }

    #[test]
    fn number_spelling_survives_rendering() {
        let out = round_trip("\tset 0xFFFF, %l1");
        assert!(out.contains("0xFFFF"));
        let out = round_trip("\tmov 42, %l1");
        assert!(out.contains("42"));
    }

    #[test]
    fn comments_directives_and_constants_render_in_place() {
        let source = "! header\n\t.section \"text\"\nsize = 4\n\t.global main\nmain:\n\tnop";
        let out = round_trip(source);
        assert_eq!(
            stripped(&out),
            stripped("! header\n\t.section \"text\"\nsize = 4\n\t.global main\nmain:\n\tnop")
        );
        assert!(out.contains("! header\n"));
        assert!(out.contains("\t.section \"text\"\n"));
        assert!(out.contains("size = 4\n"));
    }

    #[test]
    fn addresses_render_base_sign_offset() {
        let out = round_trip("\tld [%l0], %l1\n\tld [%l0 + %l1], %l2\n\tst %l2, [%fp - 8]");
        assert!(out.contains("[%l0]"));
        assert!(out.contains("[%l0 + %l1]"));
        assert!(out.contains("[%fp - 8]"));
    }

    #[test]
    fn rendering_is_stable_under_reparse() {
        let source = "main:\n\tset 0xFF | 0x1, %l1\n\tcmp %l0, %l1\n\tble main\n\tnop";
        let once = round_trip(source);
        let twice = round_trip(&once);
        assert_eq!(once, twice);
    }
}
