// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types carried from lexing through optimization.
//!
//! Every user-facing failure is a [`SourceError`]: a kind, a message, and
//! (when known) the offending span plus source file name. The first error
//! aborts the run; there is no recovery or multi-error collection.

use std::fmt;

use crate::core::tokenizer::Span;

/// Categories of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexical errors: bad characters, unterminated literals.
    Lex,
    /// Syntactic errors: unexpected tokens, unknown opcodes or directives,
    /// wrong argument shapes.
    Syntax,
    /// Semantic errors: duplicate or colliding declarations.
    Semantic,
    /// File system failures in the driver.
    Io,
    /// Invariant violations inside the optimizer. These indicate a
    /// programmer error, not a problem with the input.
    Internal,
}

#[derive(Debug, Clone)]
pub struct SourceError {
    kind: ErrorKind,
    message: String,
    file: Option<String>,
    span: Option<Span>,
}

impl SourceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            span: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == ErrorKind::Internal {
            write!(f, "internal error: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SourceError {}
