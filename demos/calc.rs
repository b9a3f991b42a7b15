use miette::Report;
use strand::combinators::{or, recursive, seq};
use strand::primitives::{integer, symbol};
use strand::{parse_complete, Parser};

/// expr   ::= term { ("+" | "-") term }
/// term   ::= factor { ("*" | "/") factor }
/// factor ::= integer | "(" expr ")"
fn calculator() -> Parser<i64> {
    recursive(|expr: Parser<i64>| {
        let parens = symbol("(").ignore_then(&expr).then_ignore(&symbol(")"));
        let factor = or(&integer(), &parens).labelled("factor");

        let mul_op = or(&symbol("*"), &symbol("/"));
        let term = factor
            .then(&mul_op.then(&factor).many())
            .try_map(|p| {
                let (head, rest) = p.into_parts();
                rest.into_iter().try_fold(head, |acc, step| {
                    let (op, rhs) = step.into_parts();
                    if op == "*" {
                        Ok(acc * rhs)
                    } else {
                        acc.checked_div(rhs)
                            .ok_or_else(|| format!("cannot divide {acc} by {rhs}"))
                    }
                })
            })
            .labelled("term");

        let add_op = or(&symbol("+"), &symbol("-"));
        seq(&term, &add_op.then(&term).many(), |head, rest| {
            rest.into_iter().fold(head, |acc, step| {
                let (op, rhs) = step.into_parts();
                if op == "+" {
                    acc + rhs
                } else {
                    acc - rhs
                }
            })
        })
        .labelled("expr")
    })
}

fn main() {
    let calc = calculator();

    let inputs = [
        "1 + 2 * 3",
        "(1 + 2) * 3",
        "10 / (4 - 2) - -3",
        "2 * (3 + )",
        "7 / (2 - 2)",
    ];
    for input in inputs {
        match parse_complete(&calc, input, "calc") {
            Ok(value) => println!("{input} = {value}"),
            Err(e) => eprintln!("{:?}", Report::new(e)),
        }
    }

    println!("\ngrammar:\n{}", calc.meta().render_tree());
}
