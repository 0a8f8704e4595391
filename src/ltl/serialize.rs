// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use super::{Context, Formula, FormulaRef};
use std::io::Write;

pub trait SerializableFormula {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()>;
    fn serialize_to_str(&self, ctx: &Context) -> String {
        let mut buf = Vec::new();
        self.serialize(ctx, &mut buf)
            .expect("Failed to write to string!");
        String::from_utf8(buf).expect("Failed to read string we wrote!")
    }
}

impl SerializableFormula for FormulaRef {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()> {
        serialize_formula(ctx, *self, writer)
    }
}

fn serialize_formula<W: Write>(
    ctx: &Context,
    e: FormulaRef,
    writer: &mut W,
) -> std::io::Result<()> {
    match *ctx.get(e) {
        Formula::True => write!(writer, "true"),
        Formula::False => write!(writer, "false"),
        Formula::Atom(name) => write!(writer, "{}", ctx.get_str(name)),
        Formula::Not(inner) => {
            write!(writer, "!")?;
            serialize_child(ctx, inner, writer)
        }
        Formula::Next(inner) => {
            write!(writer, "X ")?;
            serialize_child(ctx, inner, writer)
        }
        Formula::And(_, _) => {
            let conjuncts = ctx.conjuncts(e);
            for (ii, c) in conjuncts.iter().enumerate() {
                if ii > 0 {
                    write!(writer, " & ")?;
                }
                serialize_child(ctx, *c, writer)?;
            }
            Ok(())
        }
        Formula::Or(_, _) => {
            let disjuncts = ctx.disjuncts(e);
            for (ii, d) in disjuncts.iter().enumerate() {
                if ii > 0 {
                    write!(writer, " | ")?;
                }
                serialize_child(ctx, *d, writer)?;
            }
            Ok(())
        }
        Formula::Until(a, b) => {
            if a == ctx.tru() {
                write!(writer, "F ")?;
                serialize_child(ctx, b, writer)
            } else {
                serialize_child(ctx, a, writer)?;
                write!(writer, " U ")?;
                serialize_child(ctx, b, writer)
            }
        }
        Formula::Release(a, b) => {
            if a == ctx.fals() {
                write!(writer, "G ")?;
                serialize_child(ctx, b, writer)
            } else {
                serialize_child(ctx, a, writer)?;
                write!(writer, " R ")?;
                serialize_child(ctx, b, writer)
            }
        }
    }
}

/// Parenthesizes binary operators, leaves atoms and unary operators bare.
fn serialize_child<W: Write>(ctx: &Context, e: FormulaRef, writer: &mut W) -> std::io::Result<()> {
    let needs_parens = matches!(
        ctx.get(e),
        Formula::And(_, _) | Formula::Or(_, _) | Formula::Until(_, _) | Formula::Release(_, _)
    );
    if needs_parens {
        write!(writer, "(")?;
        serialize_formula(ctx, e, writer)?;
        write!(writer, ")")
    } else {
        serialize_formula(ctx, e, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_formulas() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let not_b = ctx.not(b);
        let u = ctx.until(a, not_b);
        insta::assert_snapshot!(u.serialize_to_str(&ctx), @"a U !b");
        let g = ctx.globally(u);
        insta::assert_snapshot!(g.serialize_to_str(&ctx), @"G (a U !b)");
        let f = ctx.eventually(a);
        insta::assert_snapshot!(f.serialize_to_str(&ctx), @"F a");
        let xa = ctx.next(a);
        let conj = ctx.and_set([a, xa]);
        insta::assert_snapshot!(conj.serialize_to_str(&ctx), @"a & X a");
    }

    #[test]
    fn nested_operators() {
        let mut ctx = Context::default();
        let a = ctx.ap("a");
        let b = ctx.ap("b");
        let c = ctx.ap("c");
        let bc = ctx.or(b, c);
        let f = ctx.and(a, bc);
        insta::assert_snapshot!(f.serialize_to_str(&ctx), @"a & (b | c)");
    }
}
