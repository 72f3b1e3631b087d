//! The statement driver: blocks, `if`/`else`, expression statements with
//! automatic semicolon insertion, and the empty statement.
//!
//! Every statement-level error is recovered in place: the failing
//! expression has already rewound itself to a boundary via
//! [`eval::skip_expr`] before returning `Err`, so the driver only needs to
//! reset the scratch slot and move on to the next statement. Recovery lets
//! later statements still run, but the first error encountered is
//! remembered and returned once the whole script has been parsed, so a
//! failed top-level evaluation is never silently reported as success. A
//! `skip` flag threads through every statement form so an untaken
//! `if`/`else` branch is parsed structurally (balanced braces, balanced
//! parens) but never evaluated.

use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::eval;
use crate::host::{Buffer, CommandRegistry, VariableBroker};
use crate::token::{Prec, Token};

/// Parses and executes every statement up to EOF: each statement is its
/// own recovery unit, and only the final statement's scratch slot is
/// preserved for the caller. The first error encountered is captured and
/// returned at the end, after every remaining statement has still had a
/// chance to run.
pub fn run_all(
    ctx: &mut Context,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    let mut first_error = None;
    while !matches!(ctx.token(), Token::Eof) {
        match statement(ctx, false, broker, commands, buffer) {
            Ok(()) => {
                if !matches!(ctx.token(), Token::Eof) {
                    ctx.stack_reset_from(0);
                }
            }
            Err(e) => {
                recover(ctx, false)?;
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Resyncs to the next statement boundary after a failing statement.
/// `skip_expr` is idempotent when the cursor already sits on a boundary
/// (the common case, since the failing expression already rewound
/// itself), so calling it unconditionally here is cheap insurance rather
/// than a second parse.
fn recover(ctx: &mut Context, skip: bool) -> Result<()> {
    eval::skip_expr(ctx)?;
    if !skip {
        ctx.stack_reset_from(0);
    }
    Ok(())
}

/// Parses one statement. `skip` suppresses evaluation for an untaken
/// `if`/`else` branch, threading down into nested blocks and `if`s.
fn statement(
    ctx: &mut Context,
    skip: bool,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    match ctx.token() {
        Token::Op(op) if *op == "{" => block(ctx, skip, broker, commands, buffer),
        Token::Op(op) if *op == ";" => {
            ctx.advance()?;
            Ok(())
        }
        Token::If => if_stmt(ctx, skip, broker, commands, buffer),
        _ => expr_statement(ctx, skip, broker, commands, buffer),
    }
}

/// `{ ... }`: a sequence of statements terminated by a matching `}`.
/// Each inner statement is its own recovery unit, and the scratch slot is
/// reset after every one — a block never surfaces a value to its caller.
fn block(
    ctx: &mut Context,
    skip: bool,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    ctx.advance()?; // consume '{'
    loop {
        if ctx.eat_op("}")? {
            return Ok(());
        }
        if matches!(ctx.token(), Token::Eof) {
            return Err(ctx.error(ErrorKind::MissingBrace));
        }
        match statement(ctx, skip, broker, commands, buffer) {
            Ok(()) => {
                if !skip {
                    ctx.stack_reset_from(0);
                }
            }
            Err(_) => recover(ctx, skip)?,
        }
    }
}

/// `if (expr) stmt [else stmt]`: the condition is evaluated with
/// `getvalue`, then exactly one branch runs; the other is parsed in skip
/// mode so it consumes tokens without side effects.
fn if_stmt(
    ctx: &mut Context,
    skip: bool,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    ctx.advance()?; // consume 'if'
    ctx.expect_op("(")?;
    eval::expr(ctx, 0, Prec::Expression, skip, broker, commands, buffer)?;
    ctx.expect_op(")")?;

    let truth = if skip {
        false
    } else {
        let cond = ctx.stack_take(0);
        let cond = eval::getvalue(ctx, broker, cond)?;
        cond.is_truthy()
    };

    statement(ctx, skip || !truth, broker, commands, buffer)?;
    if matches!(ctx.token(), Token::Else) {
        ctx.advance()?;
        statement(ctx, skip || truth, broker, commands, buffer)?;
    }
    Ok(())
}

/// An expression statement, terminated by an explicit `;`, EOF, a closing
/// `}`, or a newline before the next token (automatic semicolon
/// insertion). Anything else is a "missing ';'" error.
fn expr_statement(
    ctx: &mut Context,
    skip: bool,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    eval::expr(ctx, 0, Prec::Expression, skip, broker, commands, buffer)?;

    if ctx.eat_op(";")? {
        return Ok(());
    }
    if matches!(ctx.token(), Token::Eof) || ctx.token().is_op("}") || ctx.newline_seen() {
        return Ok(());
    }
    Err(ctx.error(ErrorKind::MissingSemicolon))
}
