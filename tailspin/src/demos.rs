//! Demonstration programs for `tailspin run`
//!
//! Every demo is a chain of `n` marked tail calls. With `--trace` the final
//! callee returns `stackTrace()` instead of its result.

use tailspin_runtime::ast::*;

pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    /// Global function called with the iteration count
    pub entry: &'static str,
    build: fn(bool) -> Program,
}

impl Demo {
    pub fn program(&self, trace: bool) -> Program {
        (self.build)(trace)
    }
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "countdown",
        description: "a function that tail-calls itself n times",
        entry: "countdown",
        build: countdown,
    },
    Demo {
        name: "ping-pong",
        description: "two functions tail-calling each other",
        entry: "ping",
        build: ping_pong,
    },
    Demo {
        name: "bound-accumulate",
        description: "tail calls through a bound target that supplies the step size",
        entry: "accumulate",
        build: bound_accumulate,
    },
    Demo {
        name: "finally",
        description: "tail calls deferred until a finally block has counted them",
        entry: "cleanup",
        build: finally_chain,
    },
];

pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|demo| demo.name == name)
}

fn finish(trace: bool, value: Expr) -> Expr {
    if trace {
        call(ident("stackTrace"), vec![])
    } else {
        value
    }
}

fn is_zero(name: &str) -> Expr {
    strict_eq(ident(name), num(0))
}

fn decrement(name: &str) -> Expr {
    sub(ident(name), num(1))
}

/// `countdown(n) { return n === 0 ? "liftoff" : continue countdown(n - 1); }`
fn countdown(trace: bool) -> Program {
    Program::new(vec![function(
        "countdown",
        &["n"],
        vec![ret(conditional(
            is_zero("n"),
            finish(trace, string("liftoff")),
            tail_call(ident("countdown"), vec![decrement("n")]),
        ))],
    )])
}

/// `ping(n) { return n === 0 ? "ping" : continue pong(n - 1); }` and back
fn ping_pong(trace: bool) -> Program {
    let player = |name: &str, other: &str| {
        function(
            name,
            &["n"],
            vec![ret(conditional(
                is_zero("n"),
                finish(trace, string(name)),
                tail_call(ident(other), vec![decrement("n")]),
            ))],
        )
    };
    Program::new(vec![player("ping", "pong"), player("pong", "ping")])
}

/// ```text
/// step(next, n, total) {
///     return n === 0 ? total : continue next(next, n - 1, total + this.increment);
/// }
/// accumulate(n) {
///     var next = bind(step, {increment: 2});
///     return continue next(next, n, 0);
/// }
/// ```
fn bound_accumulate(trace: bool) -> Program {
    Program::new(vec![
        function(
            "step",
            &["next", "n", "total"],
            vec![ret(conditional(
                is_zero("n"),
                finish(trace, ident("total")),
                tail_call(
                    ident("next"),
                    vec![
                        ident("next"),
                        decrement("n"),
                        add(ident("total"), member(this(), "increment")),
                    ],
                ),
            ))],
        ),
        function(
            "accumulate",
            &["n"],
            vec![
                var(
                    "next",
                    call(
                        ident("bind"),
                        vec![ident("step"), object(vec![("increment", num(2))])],
                    ),
                ),
                ret(tail_call(
                    ident("next"),
                    vec![ident("next"), ident("n"), num(0)],
                )),
            ],
        ),
    ])
}

/// ```text
/// cleanup(n) {
///     var cleaned = 0;
///     var hop = (k) => {
///         try { return k === 0 ? cleaned : continue hop(k - 1); }
///         finally { cleaned = cleaned + 1; }
///     };
///     return continue hop(n);
/// }
/// ```
fn finally_chain(trace: bool) -> Program {
    Program::new(vec![function(
        "cleanup",
        &["n"],
        vec![
            var("cleaned", num(0)),
            var(
                "hop",
                arrow(
                    &["k"],
                    vec![try_finally(
                        vec![ret(conditional(
                            is_zero("k"),
                            finish(trace, ident("cleaned")),
                            tail_call(ident("hop"), vec![decrement("k")]),
                        ))],
                        vec![expr_stmt(assign(
                            "cleaned",
                            add(ident("cleaned"), num(1)),
                        ))],
                    )],
                ),
            ),
            ret(tail_call(ident("hop"), vec![ident("n")])),
        ],
    )])
}
