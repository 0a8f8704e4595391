// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use clap::Parser;
use sibyl::check::{check, CheckResult, CheckerOptions};
use sibyl::ltl::{Context, FormulaRef, SerializableFormula};

#[derive(Parser, Debug)]
#[command(name = "check")]
#[command(author = "Kevin Laeufer <laeufer@cornell.edu>")]
#[command(version)]
#[command(about = "Checks a built-in LTL formula for satisfiability.", long_about = None)]
struct Args {
    #[arg(short, long)]
    verbose: bool,
    #[arg(
        value_name = "FORMULA",
        index = 1,
        help = "Name of a built-in formula, or `all`."
    )]
    name: String,
}

fn catalog(ctx: &mut Context) -> Vec<(&'static str, FormulaRef)> {
    let a = ctx.ap("a");
    let b = ctx.ap("b");
    let not_a = ctx.not(a);
    let not_b = ctx.not(b);

    let until = ctx.until(a, b);
    let fa = ctx.eventually(a);
    let gfa = ctx.globally(fa);
    let gnb = ctx.globally(not_b);
    let trapped = ctx.and(until, gnb);
    let ga = ctx.globally(a);
    let gna = ctx.globally(not_a);
    let clash = ctx.and(ga, gna);
    let xb = ctx.next(b);
    let ab = ctx.implies(a, xb);
    let gab = ctx.globally(ab);
    let alternating = ctx.and(gab, a);

    vec![
        ("until", until),
        ("recurring", gfa),
        ("trapped", trapped),
        ("clash", clash),
        ("alternating", alternating),
    ]
}

fn main() {
    let args = Args::parse();
    let mut ctx = Context::default();
    let formulas = catalog(&mut ctx);
    let selected: Vec<_> = if args.name == "all" {
        formulas
    } else {
        formulas
            .into_iter()
            .filter(|(name, _)| *name == args.name)
            .collect()
    };
    if selected.is_empty() {
        eprintln!("unknown formula name: {}", args.name);
        std::process::exit(1);
    }

    let options = CheckerOptions::default();
    for (name, formula) in selected {
        println!("{name}: {}", formula.serialize_to_str(&ctx));
        let start = std::time::Instant::now();
        let result = check(&mut ctx, formula, &options);
        let elapsed = start.elapsed();
        match result {
            CheckResult::Unsat => println!("  unsat ({elapsed:?})"),
            CheckResult::Sat(witness) => {
                println!("  sat ({elapsed:?})");
                if args.verbose {
                    for (ii, step) in witness.prefix.iter().enumerate() {
                        println!("  {ii}: {:?}", step.atoms(&ctx));
                    }
                    for (ii, step) in witness.cycle.iter().enumerate() {
                        println!("  loop {ii}: {:?}", step.atoms(&ctx));
                    }
                }
            }
        }
    }
}
