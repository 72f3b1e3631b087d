//! Value conversions, operator semantics, and the precedence-climbing
//! expression evaluator.

use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::host::{Buffer, CommandRegistry, IntDefault, VariableBroker, VarValue, SetValue, NO_ARG};
use crate::lexer::parse_c_int_str;
use crate::token::{Prec, Token};
use crate::value::Value;

/// Resolves an identifier slot to a concrete value by querying the host
/// variable broker. Non-identifier values pass through unchanged.
pub fn getvalue(ctx: &mut Context, broker: &dyn VariableBroker, value: Value) -> Result<Value> {
    match value {
        Value::Ident(name) => match broker.get(&name) {
            VarValue::Unknown => Err(ctx.error(ErrorKind::NoVariable(name))),
            VarValue::Number(n) => Ok(Value::Number(n)),
            VarValue::Str(s) | VarValue::Chars(s) => Ok(Value::Str(s)),
        },
        other => Ok(other),
    }
}

/// `getvalue` then coerce to a number: strings reparse as a C integer,
/// chars retag, everything else becomes `0`.
pub fn tonum(ctx: &mut Context, broker: &dyn VariableBroker, value: Value) -> Result<i64> {
    Ok(match getvalue(ctx, broker, value)? {
        Value::Number(n) => n,
        Value::Str(s) => parse_c_int_str(&s),
        Value::Char(c) => c as i64,
        _ => 0,
    })
}

/// `getvalue` then coerce to a string: numbers format as decimal, chars
/// UTF-8 encode, everything else becomes the empty string.
pub fn tostr(ctx: &mut Context, broker: &dyn VariableBroker, value: Value) -> Result<String> {
    Ok(match getvalue(ctx, broker, value)? {
        Value::Str(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Char(c) => char::from_u32(c).map(|ch| ch.to_string()).unwrap_or_default(),
        _ => String::new(),
    })
}

/// `getvalue` then coerce to a character: a string decodes its first
/// UTF-8 scalar, numeric tags retag, everything else becomes `0`.
pub fn tochar(ctx: &mut Context, broker: &dyn VariableBroker, value: Value) -> Result<u32> {
    Ok(match getvalue(ctx, broker, value)? {
        Value::Str(s) => s.chars().next().map(|c| c as u32).unwrap_or(0),
        Value::Number(n) => n as u32,
        Value::Char(c) => c,
        _ => 0,
    })
}

/// Strings and chars are always truthy; numbers are truthy iff nonzero;
/// void is falsy. Applied to an already-`getvalue`d value.
fn is_truthy(value: &Value) -> bool {
    value.is_truthy()
}

/// Parses and evaluates an expression into `slot`, consuming tokens up to
/// and including operators whose precedence is at least `min_prec`. When
/// `skip` is true, tokens are consumed without evaluation (see
/// [`skip_expr`]) — used for untaken `if`/ternary branches.
pub fn expr(
    ctx: &mut Context,
    slot: usize,
    min_prec: Prec,
    skip: bool,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    if skip {
        return skip_expr(ctx);
    }
    if slot >= crate::context::STACK_SIZE {
        let _ = ctx.error(ErrorKind::StackOverflow);
        skip_expr(ctx)?;
        return Err(ctx.error(ErrorKind::StackOverflow));
    }

    match prefix(ctx, slot, broker, commands, buffer) {
        Ok(()) => {}
        Err(e) => {
            ctx.rewind_to_token_start();
            let _ = ctx.advance();
            skip_expr(ctx)?;
            return Err(e);
        }
    }

    match loop_ops(ctx, slot, min_prec, broker, commands, buffer) {
        Ok(()) => Ok(()),
        Err(e) => {
            ctx.rewind_to_token_start();
            let _ = ctx.advance();
            skip_expr(ctx)?;
            Err(e)
        }
    }
}

/// Parses the prefix position of an expression (unary operators, atoms)
/// into `slot`.
fn prefix(
    ctx: &mut Context,
    slot: usize,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    match ctx.token().clone() {
        Token::Op(op) if op == "(" => {
            ctx.advance()?;
            expr(ctx, slot, Prec::Expression, false, broker, commands, buffer)?;
            ctx.expect_op(")")?;
        }
        Token::Op(op) if op == "-" => {
            ctx.advance()?;
            expr(ctx, slot, Prec::Postfix, false, broker, commands, buffer)?;
            let v = ctx.stack_take(slot);
            let n = tonum(ctx, broker, v)?;
            ctx.stack_set(slot, Value::Number(n.wrapping_neg()));
        }
        Token::Op(op) if op == "+" => {
            ctx.advance()?;
            expr(ctx, slot, Prec::Postfix, false, broker, commands, buffer)?;
            let v = ctx.stack_take(slot);
            let n = tonum(ctx, broker, v)?;
            ctx.stack_set(slot, Value::Number(n));
        }
        Token::Op(op) if op == "~" => {
            ctx.advance()?;
            expr(ctx, slot, Prec::Postfix, false, broker, commands, buffer)?;
            let v = ctx.stack_take(slot);
            let n = tonum(ctx, broker, v)?;
            ctx.stack_set(slot, Value::Number(!n));
        }
        Token::Op(op) if op == "!" => {
            ctx.advance()?;
            expr(ctx, slot, Prec::Postfix, false, broker, commands, buffer)?;
            let v = ctx.stack_take(slot);
            let v = getvalue(ctx, broker, v)?;
            let n = match &v {
                Value::Str(_) => 0,
                other => !other.is_truthy() as i64,
            };
            ctx.stack_set(slot, Value::Number(n));
        }
        Token::Op(op) if op == "++" || op == "--" => {
            ctx.advance()?;
            expr(ctx, slot, Prec::Postfix, false, broker, commands, buffer)?;
            check_lvalue(ctx, slot)?;
            ctx.stack_set(slot + 1, Value::Number(1));
            assign(ctx, slot, &op, broker)?;
            let v = ctx.stack_take(slot);
            let v = getvalue(ctx, broker, v)?;
            ctx.stack_set(slot, v);
        }
        Token::Number(n) => {
            ctx.stack_set(slot, Value::Number(n));
            ctx.advance()?;
        }
        Token::String(s) => {
            ctx.stack_set(slot, Value::Str(s));
            ctx.advance()?;
        }
        Token::Id(name) => {
            ctx.stack_set(slot, Value::Ident(name));
            ctx.advance()?;
        }
        Token::Char(lexeme) => {
            let c = lexeme.chars().next().map(|c| c as u32).unwrap_or(0);
            ctx.stack_set(slot, Value::Char(c));
            ctx.advance()?;
        }
        _ => {
            ctx.stack_set(slot, Value::Void);
            return Err(ctx.error(ErrorKind::InvalidExpression));
        }
    }
    Ok(())
}

fn check_lvalue(ctx: &Context, slot: usize) -> Result<()> {
    if ctx.stack_get(slot).is_ident() {
        Ok(())
    } else {
        Err(ctx.error(ErrorKind::NotLvalue))
    }
}

/// The operator loop: while the current token's precedence is at least
/// `min_prec`, dispatches to comma, ternary, postfix, assignment, or
/// general binary handling.
fn loop_ops(
    ctx: &mut Context,
    slot: usize,
    min_prec: Prec,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    loop {
        let prec = ctx.prec();
        let op = match ctx.token() {
            Token::Op(s) => *s,
            _ => return Ok(()),
        };
        if prec < min_prec {
            return Ok(());
        }
        ctx.advance()?;

        if op == "," {
            prefix(ctx, slot, broker, commands, buffer)?;
            continue;
        }

        if op == "?" {
            let cond = ctx.stack_take(slot);
            let cond = getvalue(ctx, broker, cond)?;
            let truth = is_truthy(&cond);
            expr(ctx, slot, Prec::Expression, !truth, broker, commands, buffer)?;
            ctx.expect_op(":")?;
            expr(ctx, slot, Prec::Conditional, truth, broker, commands, buffer)?;
            continue;
        }

        if prec == Prec::Postfix {
            postfix(ctx, slot, op, broker, commands, buffer)?;
            continue;
        }

        if prec == Prec::Assignment {
            expr(ctx, slot + 1, Prec::Assignment, false, broker, commands, buffer)?;
            assign(ctx, slot, op, broker)?;
            continue;
        }

        // Short-circuit logical operators: only evaluate the RHS when the
        // LHS does not already determine the result.
        if op == "&&" || op == "||" {
            let lhs = ctx.stack_take(slot);
            let lhs = getvalue(ctx, broker, lhs)?;
            let lhs_truthy = is_truthy(&lhs);
            let decided = (op == "&&" && !lhs_truthy) || (op == "||" && lhs_truthy);
            if decided {
                // LHS already decided the result; skip the RHS tokens
                // without evaluating them (no side effects).
                skip_expr(ctx)?;
                ctx.stack_set(slot, Value::Number(lhs_truthy as i64));
            } else {
                expr(ctx, slot + 1, prec.tighter(), false, broker, commands, buffer)?;
                let rhs = ctx.stack_take(slot + 1);
                let rhs = getvalue(ctx, broker, rhs)?;
                ctx.stack_set(slot, Value::Number(is_truthy(&rhs) as i64));
            }
            continue;
        }

        // A string left-hand side with `%` formats against a tuple of
        // arguments (one stack slot each) rather than a single collapsed
        // comma value, so a format string with several conversions reads
        // a distinct argument for each.
        if op == "%" {
            let lhs = ctx.stack_take(slot);
            let lhs = getvalue(ctx, broker, lhs)?;
            if let Value::Str(fmt) = lhs {
                let argc = parse_format_args(ctx, slot + 1, broker, commands, buffer)?;
                let formatted = format_string(ctx, slot + 1, argc, &fmt, broker)?;
                ctx.stack_set(slot, Value::Str(formatted));
            } else {
                ctx.stack_set(slot, lhs);
                expr(ctx, slot + 1, prec.tighter(), false, broker, commands, buffer)?;
                op_apply(ctx, slot, "%", broker)?;
            }
            continue;
        }

        expr(ctx, slot + 1, prec.tighter(), false, broker, commands, buffer)?;
        let lhs = ctx.stack_take(slot);
        let lhs = getvalue(ctx, broker, lhs)?;
        ctx.stack_set(slot, lhs);
        op_apply(ctx, slot, op, broker)?;
    }
}

/// Handles the postfix-precedence operators: call, post inc/dec, index,
/// and member access.
fn postfix(
    ctx: &mut Context,
    slot: usize,
    op: &'static str,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    match op {
        "(" => {
            let callee = ctx.stack_get(slot).clone();
            match callee {
                Value::Ident(name) => {
                    crate::dispatch::call(ctx, slot, &name, broker, commands, buffer)?;
                }
                _ => return Err(ctx.error(ErrorKind::InvalidFunctionCall)),
            }
            Ok(())
        }
        "++" | "--" => {
            check_lvalue(ctx, slot)?;
            let current = ctx.stack_get(slot).clone();
            ctx.stack_set(slot + 1, current);
            let v = ctx.stack_take(slot);
            let v = getvalue(ctx, broker, v)?;
            ctx.stack_set(slot, v);
            ctx.stack_set(slot + 2, Value::Number(1));
            let assign_op = if op == "++" { "+=" } else { "-=" };
            assign(ctx, slot + 1, assign_op, broker)
        }
        "[" => {
            expr(ctx, slot + 1, Prec::Expression, false, broker, commands, buffer)?;
            ctx.expect_op("]")?;
            op_apply(ctx, slot, "[", broker)
        }
        "." => {
            let name = match ctx.token() {
                Token::Id(n) => n.clone(),
                _ => return Err(ctx.error(ErrorKind::ExpectedPropertyName)),
            };
            let v = ctx.stack_take(slot);
            let v = getvalue(ctx, broker, v)?;
            match &v {
                Value::Str(s) if name == "length" => {
                    let len = s.len() as i64;
                    ctx.stack_set(slot, Value::Number(len));
                    ctx.advance()?;
                    Ok(())
                }
                _ => {
                    ctx.stack_set(slot, v);
                    Err(ctx.error(ErrorKind::NoSuchProperty(name)))
                }
            }
        }
        _ => Err(ctx.error(ErrorKind::UnsupportedOperator(op.chars().next().unwrap_or('?')))),
    }
}

/// Applies a binary operator to `slot`/`slot+1`, per §4.3: string-headed
/// dispatch, otherwise numeric.
fn op_apply(ctx: &mut Context, slot: usize, op: &'static str, broker: &mut dyn VariableBroker) -> Result<()> {
    if matches!(ctx.stack_get(slot), Value::Str(_)) {
        return string_op(ctx, slot, op, broker);
    }
    let lhs = ctx.stack_take(slot);
    let lhs = tonum(ctx, broker, lhs)?;
    let rhs = ctx.stack_take(slot + 1);
    let rhs = tonum(ctx, broker, rhs)?;
    let result = numeric_op(ctx, op, lhs, rhs)?;
    ctx.stack_set(slot, Value::Number(result));
    Ok(())
}

fn string_op(ctx: &mut Context, slot: usize, op: &'static str, broker: &mut dyn VariableBroker) -> Result<()> {
    let lhs_str = match ctx.stack_get(slot).clone() {
        Value::Str(s) => s,
        _ => unreachable!("string_op requires a string LHS"),
    };
    match op {
        "<" | ">" | "<=" | ">=" | "==" | "!=" => {
            let rhs = ctx.stack_take(slot + 1);
            let rhs = tostr(ctx, broker, rhs)?;
            let cmp = lhs_str.as_str().cmp(rhs.as_str()) as i64;
            let result = match op {
                "<" => cmp < 0,
                ">" => cmp > 0,
                "<=" => cmp <= 0,
                ">=" => cmp >= 0,
                "==" => cmp == 0,
                _ => cmp != 0,
            };
            ctx.stack_set(slot, Value::Number(result as i64));
            Ok(())
        }
        "+" | "+=" => {
            let rhs = ctx.stack_take(slot + 1);
            let rhs = tostr(ctx, broker, rhs)?;
            let mut combined = lhs_str;
            combined.push_str(&rhs);
            ctx.stack_set(slot, Value::Str(combined));
            Ok(())
        }
        "[" => {
            let rhs = ctx.stack_take(slot + 1);
            let index = tonum(ctx, broker, rhs)?;
            let value = if index >= 0 && (index as usize) < lhs_str.len() {
                Value::Char(lhs_str.as_bytes()[index as usize] as u32)
            } else {
                Value::Void
            };
            ctx.stack_set(slot, value);
            Ok(())
        }
        _ => Err(ctx.error(ErrorKind::InvalidStringOperator(
            op.chars().next().unwrap_or('?'),
        ))),
    }
}

/// Parses the argument list on the right of a `%` format operator into
/// successive stack slots starting at `first_slot`: a parenthesized,
/// comma-separated tuple `(a, b, ...)` yields one slot per element; a
/// bare expression yields a single argument. Returns the argument count.
fn parse_format_args(
    ctx: &mut Context,
    first_slot: usize,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<usize> {
    if ctx.eat_op("(")? {
        let mut count = 0;
        loop {
            if ctx.eat_op(")")? {
                break;
            }
            if count > 0 {
                ctx.expect_op(",")?;
            }
            expr(ctx, first_slot + count, Prec::Assignment, false, broker, commands, buffer)?;
            count += 1;
        }
        Ok(count)
    } else {
        expr(ctx, first_slot, Prec::Assignment, false, broker, commands, buffer)?;
        Ok(1)
    }
}

/// Printf-style formatting for `"fmt" % (args...)`, supporting the
/// reference interpreter's subset of conversions (`d i o u x X c s`) with
/// flag/width/precision characters passed through to Rust formatting
/// where a direct analogue exists, decimal otherwise. Each conversion
/// consumes its own argument slot (`first_slot + 0`, `+ 1`, ...), so a
/// format string with several conversions reads several distinct values
/// rather than reformatting a single one repeatedly.
fn format_string(
    ctx: &mut Context,
    first_slot: usize,
    argc: usize,
    fmt: &str,
    broker: &mut dyn VariableBroker,
) -> Result<String> {
    let mut out = String::new();
    let mut chars = fmt.char_indices().peekable();
    let mut next_arg = 0;
    while let Some((i, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if fmt[i..].starts_with("%%") {
            out.push('%');
            chars.next();
            continue;
        }
        // Skip flag/width/precision characters; the reference scans
        // "0123456789+- #." before the conversion character.
        while let Some(&(_, fc)) = chars.peek() {
            if "0123456789+- #.".contains(fc) {
                chars.next();
            } else {
                break;
            }
        }
        let Some((_, conv)) = chars.next() else {
            break;
        };
        if next_arg >= argc {
            break;
        }
        let arg = ctx.stack_take(first_slot + next_arg);
        next_arg += 1;
        match conv {
            'd' | 'i' | 'u' => out.push_str(&tonum(ctx, broker, arg)?.to_string()),
            'o' => out.push_str(&format!("{:o}", tonum(ctx, broker, arg)?)),
            'x' => out.push_str(&format!("{:x}", tonum(ctx, broker, arg)?)),
            'X' => out.push_str(&format!("{:X}", tonum(ctx, broker, arg)?)),
            'c' => {
                let ch = tochar(ctx, broker, arg)?;
                out.push(char::from_u32(ch).unwrap_or('\u{FFFD}'));
            }
            's' => out.push_str(&tostr(ctx, broker, arg)?),
            _ => {}
        }
    }
    Ok(out)
}

fn numeric_op(ctx: &Context, op: &'static str, lhs: i64, rhs: i64) -> Result<i64> {
    Ok(match op {
        "*" | "*=" => lhs.wrapping_mul(rhs),
        "/" | "/=" | "%" | "%=" => {
            if rhs == 0 || (lhs == i64::MIN && rhs == -1) {
                return Err(ctx.error(ErrorKind::DivisionOverflow));
            }
            if op == "/" || op == "/=" {
                lhs / rhs
            } else {
                lhs % rhs
            }
        }
        "+" | "+=" | "++" => lhs.wrapping_add(rhs),
        "-" | "-=" | "--" => lhs.wrapping_sub(rhs),
        "<<" | "<<=" => lhs.wrapping_shl(rhs as u32),
        ">>" | ">>=" => lhs.wrapping_shr(rhs as u32),
        "<" => (lhs < rhs) as i64,
        ">" => (lhs > rhs) as i64,
        "<=" => (lhs <= rhs) as i64,
        ">=" => (lhs >= rhs) as i64,
        "==" => (lhs == rhs) as i64,
        "!=" => (lhs != rhs) as i64,
        "&" | "&=" => lhs & rhs,
        "^" | "^=" => lhs ^ rhs,
        "|" | "|=" => lhs | rhs,
        "," => rhs,
        _ => {
            return Err(ctx.error(ErrorKind::InvalidNumericOperator(
                op.chars().next().unwrap_or('?'),
            )))
        }
    })
}

/// Assigns the value at `slot+1` into the lvalue at `slot` (identifier
/// required), applying a compound operator first when `op` isn't plain
/// `=`. After assignment the slot is left holding the identifier again
/// (not the computed value), matching the reference interpreter — a
/// later `getvalue` re-reads the variable if the result is needed
/// further up the expression.
fn assign(ctx: &mut Context, slot: usize, op: &str, broker: &mut dyn VariableBroker) -> Result<()> {
    check_lvalue(ctx, slot)?;
    let name = match ctx.stack_get(slot) {
        Value::Ident(n) => n.clone(),
        _ => unreachable!("check_lvalue already confirmed an identifier"),
    };

    let rhs = ctx.stack_take(slot + 1);
    let rhs = getvalue(ctx, broker, rhs)?;
    ctx.stack_set(slot + 1, rhs);

    let computed = if op == "=" {
        ctx.stack_take(slot + 1)
    } else {
        let current = getvalue(ctx, broker, Value::Ident(name.clone()))?;
        ctx.stack_set(slot, current);
        op_apply(ctx, slot, plain_op(op), broker)?;
        ctx.stack_take(slot)
    };

    set_variable(ctx, broker, &name, computed)?;
    ctx.stack_set(slot, Value::Ident(name));
    Ok(())
}

/// Maps a compound-assignment or increment/decrement spelling back to
/// the plain operator spelling [`numeric_op`]/[`string_op`] understand.
fn plain_op(op: &str) -> &'static str {
    match op {
        "+=" | "++" => "+",
        "-=" | "--" => "-",
        "*=" => "*",
        "/=" => "/",
        "%=" => "%",
        "<<=" => "<<",
        ">>=" => ">>",
        "&=" => "&",
        "^=" => "^",
        "|=" => "|",
        _ => "=",
    }
}

/// Consumes tokens without evaluating, matching bracket depth (not kind)
/// until reaching a statement boundary: `;`, a closing bracket, `:`, or
/// EOF, at depth zero.
pub fn skip_expr(ctx: &mut Context) -> Result<()> {
    let mut depth: i32 = 0;
    loop {
        match ctx.token() {
            Token::Eof => return Ok(()),
            Token::Op(op) => match *op {
                "?" | "{" | "[" | "(" => depth += 1,
                ":" | "}" | "]" | ")" => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                ";" => {
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            },
            _ => {}
        }
        ctx.advance()?;
    }
}

pub(crate) fn default_int(buffer: &dyn Buffer, kind: IntDefault) -> i64 {
    match kind {
        IntDefault::Required => 0,
        IntDefault::NoArg => NO_ARG,
        IntDefault::One => 1,
        IntDefault::NegOne => -1,
        IntDefault::Mark => buffer.mark(),
        IntDefault::Point => buffer.point(),
        IntDefault::Zero => 0,
        IntDefault::BufferSize => buffer.total_size(),
    }
}

pub(crate) fn set_variable(ctx: &mut Context, broker: &mut dyn VariableBroker, name: &str, value: Value) -> Result<()> {
    let set = match value {
        Value::Str(s) => SetValue::Str(s),
        Value::Number(n) => SetValue::Number(n),
        Value::Char(c) => SetValue::Number(c as i64),
        _ => SetValue::Number(0),
    };
    broker
        .set(name, set)
        .map_err(|_| ctx.error(ErrorKind::NoVariable(name.to_string())))
}
