// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Recursive-descent parser for the restricted SPARC assembly dialect.
//!
//! One token of lookahead everywhere, plus a single snapshot/restore to
//! tell `ident :` (label declaration) and `ident =` (constant declaration)
//! apart from an opcode or directive at the start of an item. The first
//! error aborts parsing.
//!
//! Constants must be declared before use, so constant references resolve
//! here; label references are fixed up afterwards by [`crate::syntax::resolve`].

use std::rc::Rc;

use crate::core::error::{ErrorKind, SourceError};
use crate::core::tokenizer::{Token, TokenKind, TokenStream};
use crate::sparc::opcodes::{ArgSchema, Opcode, OpcodeEntry};
use crate::sparc::registers::Reg;
use crate::syntax::ast::{
    Addr, AddrOffset, BinOp, Directive, DirectiveArg, Expr, Inst, Item, LabelRef, Operand, Sign,
    Unit,
};

/// Parse a full compilation unit. The returned unit's root list always
/// terminates in an `Eof` item; its label and constant tables have disjoint
/// key sets.
pub fn parse(file: Option<&str>, source: &str) -> Result<Unit, SourceError> {
    let ts = TokenStream::lex(source).map_err(|err| err.with_file(file.map(str::to_string)))?;
    let parser = Parser {
        ts,
        unit: Unit::new(file.map(str::to_string)),
    };
    parser
        .run()
        .map_err(|err| err.with_file(file.map(str::to_string)))
}

struct Parser {
    ts: TokenStream,
    unit: Unit,
}

fn syntax_error(message: impl Into<String>, tok: &Token) -> SourceError {
    SourceError::new(ErrorKind::Syntax, message).with_span(tok.span)
}

fn semantic_error(message: impl Into<String>, tok: &Token) -> SourceError {
    SourceError::new(ErrorKind::Semantic, message).with_span(tok.span)
}

impl Parser {
    fn run(mut self) -> Result<Unit, SourceError> {
        loop {
            match self.ts.peek().kind {
                TokenKind::Eof => {
                    self.unit.push_back(Item::Eof);
                    return Ok(self.unit);
                }
                TokenKind::Comment => {
                    let tok = self.ts.advance();
                    self.unit.push_back(Item::Comment(tok.text));
                }
                TokenKind::Ident => self.item()?,
                _ => {
                    let tok = self.ts.peek();
                    return Err(syntax_error(
                        format!(
                            "expected a label, directive, or instruction, found {}",
                            tok.kind.describe()
                        ),
                        tok,
                    ));
                }
            }
        }
    }

    fn item(&mut self) -> Result<(), SourceError> {
        let mark = self.ts.snapshot();
        let name = self.ts.advance();
        match self.ts.peek().kind {
            TokenKind::Colon => {
                self.ts.advance();
                self.label_decl(name)
            }
            TokenKind::Assign => {
                self.ts.advance();
                self.const_decl(name)
            }
            _ => {
                self.ts.restore(mark);
                self.opcode_or_directive()
            }
        }
    }

    fn label_decl(&mut self, name: Token) -> Result<(), SourceError> {
        if self.unit.labels.contains_key(&name.text) {
            return Err(semantic_error(
                format!("duplicate label: `{}`", name.text),
                &name,
            ));
        }
        if self.unit.consts.contains_key(&name.text) {
            return Err(semantic_error(
                format!("label `{}` collides with a constant of the same name", name.text),
                &name,
            ));
        }
        let id = self.unit.push_back(Item::LabelDecl {
            name: name.text.clone(),
        });
        self.unit.labels.insert(name.text, id);
        Ok(())
    }

    fn const_decl(&mut self, name: Token) -> Result<(), SourceError> {
        if self.unit.consts.contains_key(&name.text) {
            return Err(semantic_error(
                format!("duplicate constant: `{}`", name.text),
                &name,
            ));
        }
        if self.unit.labels.contains_key(&name.text) {
            return Err(semantic_error(
                format!("constant `{}` collides with a label of the same name", name.text),
                &name,
            ));
        }
        let value = self.imm()?;
        let id = self.unit.push_back(Item::ConstDecl {
            name: name.text.clone(),
            value,
        });
        self.unit.consts.insert(name.text, id);
        Ok(())
    }

    fn opcode_or_directive(&mut self) -> Result<(), SourceError> {
        let name = self.ts.advance();
        if let Some(entry) = Opcode::lookup(&name.text) {
            self.instruction(entry)
        } else if name.text.starts_with('.') {
            self.directive(name)
        } else {
            Err(syntax_error(
                format!("unknown opcode: `{}`", name.text),
                &name,
            ))
        }
    }

    fn directive(&mut self, name: Token) -> Result<(), SourceError> {
        let arg = match name.text.as_str() {
            ".section" => {
                let tok = self.expect(TokenKind::Str, "a section name string")?;
                DirectiveArg::Str(strip_quotes(&tok.text))
            }
            ".global" => {
                let tok = self.expect(TokenKind::Ident, "a label name")?;
                DirectiveArg::Name(tok.text)
            }
            ".align" => {
                return Err(syntax_error("directive not supported: `.align`", &name));
            }
            _ => {
                return Err(syntax_error(
                    format!("unknown directive: `{}`", name.text),
                    &name,
                ));
            }
        };
        self.unit.push_back(Item::Directive(Directive {
            name: name.text[1..].to_string(),
            arg,
        }));
        Ok(())
    }

    fn instruction(&mut self, entry: &'static OpcodeEntry) -> Result<(), SourceError> {
        let mut annulled = false;
        if entry.branch && self.ts.peek().kind == TokenKind::Comma {
            self.ts.advance();
            let tok = self.ts.advance();
            if tok.kind != TokenKind::Ident || tok.text != "a" {
                return Err(syntax_error(
                    format!("expected `a` after `,`, found `{}`", tok.text),
                    &tok,
                ));
            }
            annulled = true;
        }

        let args = match entry.schema {
            ArgSchema::None => Vec::new(),
            ArgSchema::RegOrImmThenReg => {
                let a = self.reg_or_imm()?;
                self.comma()?;
                let b = self.register_operand()?;
                vec![a, b]
            }
            ArgSchema::ImmThenReg => {
                let a = Rc::new(Operand::Imm(self.imm()?));
                self.comma()?;
                let b = self.register_operand()?;
                vec![a, b]
            }
            ArgSchema::RegThenRegOrImm => {
                let a = self.register_operand()?;
                self.comma()?;
                let b = self.reg_or_imm()?;
                vec![a, b]
            }
            ArgSchema::RegRegOrImmReg => {
                let a = self.register_operand()?;
                self.comma()?;
                let b = self.reg_or_imm()?;
                self.comma()?;
                let c = self.register_operand()?;
                vec![a, b, c]
            }
            ArgSchema::Target => vec![self.label_operand()?],
            ArgSchema::AddrThenReg => {
                let a = self.addr_operand()?;
                self.comma()?;
                let b = self.register_operand()?;
                vec![a, b]
            }
            ArgSchema::RegThenAddr => {
                let a = self.register_operand()?;
                self.comma()?;
                let b = self.addr_operand()?;
                vec![a, b]
            }
        };

        let mut inst = Inst::new(entry.op, args);
        inst.annulled = annulled;
        self.unit.push_back(Item::Instr(inst));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operands

    fn register(&mut self) -> Result<Reg, SourceError> {
        self.expect(TokenKind::Percent, "`%`")?;
        let tok = self.expect(TokenKind::Ident, "a register name")?;
        Ok(Reg::new(&tok.text))
    }

    fn register_operand(&mut self) -> Result<Rc<Operand>, SourceError> {
        Ok(Rc::new(Operand::Reg(self.register()?)))
    }

    fn reg_or_imm(&mut self) -> Result<Rc<Operand>, SourceError> {
        if self.ts.peek().kind == TokenKind::Percent {
            self.register_operand()
        } else {
            Ok(Rc::new(Operand::Imm(self.imm()?)))
        }
    }

    fn label_operand(&mut self) -> Result<Rc<Operand>, SourceError> {
        let tok = self.expect(TokenKind::Ident, "a label")?;
        if self.unit.consts.contains_key(&tok.text) {
            return Err(syntax_error(
                format!("expected a label, `{}` names a constant", tok.text),
                &tok,
            ));
        }
        Ok(Rc::new(Operand::Label(LabelRef::new(tok.text))))
    }

    fn addr_operand(&mut self) -> Result<Rc<Operand>, SourceError> {
        self.expect(TokenKind::LBracket, "`[`")?;
        let base = self.register()?;
        let mut sign = None;
        let mut offset = None;
        match self.ts.peek().kind {
            TokenKind::Plus => {
                self.ts.advance();
                sign = Some(Sign::Plus);
            }
            TokenKind::Minus => {
                self.ts.advance();
                sign = Some(Sign::Minus);
            }
            _ => {}
        }
        if sign.is_some() {
            offset = Some(if self.ts.peek().kind == TokenKind::Percent {
                AddrOffset::Reg(self.register()?)
            } else {
                AddrOffset::Imm(self.imm()?)
            });
        }
        self.expect(TokenKind::RBracket, "`]`")?;
        Ok(Rc::new(Operand::Addr(Addr { base, sign, offset })))
    }

    // ------------------------------------------------------------------
    // Immediate expressions
    //
    // Precedence, loosest first: `|`, `^`, `&`, `+`/`-`, unary `-`, atoms.

    fn imm(&mut self) -> Result<Expr, SourceError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, SourceError> {
        let mut ret = self.xor_expr()?;
        while self.ts.peek().kind == TokenKind::Pipe {
            self.ts.advance();
            let rhs = self.xor_expr()?;
            ret = Expr::Bin {
                op: BinOp::Or,
                left: Box::new(ret),
                right: Box::new(rhs),
            };
        }
        Ok(ret)
    }

    fn xor_expr(&mut self) -> Result<Expr, SourceError> {
        let mut ret = self.and_expr()?;
        while self.ts.peek().kind == TokenKind::Caret {
            self.ts.advance();
            let rhs = self.and_expr()?;
            ret = Expr::Bin {
                op: BinOp::Xor,
                left: Box::new(ret),
                right: Box::new(rhs),
            };
        }
        Ok(ret)
    }

    fn and_expr(&mut self) -> Result<Expr, SourceError> {
        let mut ret = self.sum_expr()?;
        while self.ts.peek().kind == TokenKind::Ampersand {
            self.ts.advance();
            let rhs = self.sum_expr()?;
            ret = Expr::Bin {
                op: BinOp::And,
                left: Box::new(ret),
                right: Box::new(rhs),
            };
        }
        Ok(ret)
    }

    // Sum chains accumulate into the right child with the freshly parsed
    // operand on the left. Rendering follows the stored shape, so `a + b`
    // round-trips as `b + a`.
    fn sum_expr(&mut self) -> Result<Expr, SourceError> {
        let mut ret = self.pre_unary()?;
        loop {
            let op = match self.ts.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.ts.advance();
            let operand = self.pre_unary()?;
            ret = Expr::Bin {
                op,
                left: Box::new(operand),
                right: Box::new(ret),
            };
        }
        Ok(ret)
    }

    fn pre_unary(&mut self) -> Result<Expr, SourceError> {
        if self.ts.peek().kind == TokenKind::Minus {
            self.ts.advance();
            return Ok(Expr::Neg(Box::new(self.pre_unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, SourceError> {
        let tok = self.ts.peek().clone();
        match tok.kind {
            TokenKind::LParen => {
                self.ts.advance();
                let inner = self.imm()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenKind::Number => {
                self.ts.advance();
                Ok(Expr::Num {
                    value: tok.value.unwrap_or_default(),
                    text: tok.text,
                })
            }
            TokenKind::Str => {
                self.ts.advance();
                Ok(Expr::Str(strip_quotes(&tok.text)))
            }
            TokenKind::Char => {
                self.ts.advance();
                Ok(Expr::Char(tok.text.chars().nth(1).unwrap_or_default()))
            }
            TokenKind::Ident => {
                self.ts.advance();
                match self.unit.consts.get(&tok.text) {
                    Some(&decl) => Ok(Expr::ConstRef {
                        name: tok.text,
                        decl,
                    }),
                    None => Err(syntax_error(
                        format!("unknown constant: `{}`", tok.text),
                        &tok,
                    )),
                }
            }
            _ => Err(syntax_error(
                format!(
                    "expected an immediate expression, found {}",
                    tok.kind.describe()
                ),
                &tok,
            )),
        }
    }

    // ------------------------------------------------------------------

    fn comma(&mut self) -> Result<(), SourceError> {
        self.expect(TokenKind::Comma, "`,`")?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, SourceError> {
        let tok = self.ts.advance();
        if tok.kind != kind {
            return Err(syntax_error(
                format!("expected {what}, found {}", tok.kind.describe()),
                &tok,
            ));
        }
        Ok(tok)
    }
}

fn strip_quotes(text: &str) -> String {
    text[1..text.len().saturating_sub(1)].to_string()
}
