use criterion::{criterion_group, criterion_main, Criterion};
use slrkit::{language, Grammar, Recognizer, Token};
use std::{env, path::PathBuf};

criterion_main!(benches);
criterion_group!(benches, bench_construction, bench_recognize);

fn bench_construction(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic");
    bench_table_gen(c, "lists");

    let grammar = language::grammar().unwrap();
    c.bench_function("language", |b| {
        b.iter(|| Recognizer::new(grammar.clone()).unwrap());
    });
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar =
        Grammar::from_file(project_root.join(format!("tests/{}.grammar", grammar_name))).unwrap();

    c.bench_function(grammar_name, |b| {
        b.iter(|| Recognizer::new(grammar.clone()).unwrap());
    });
}

fn bench_recognize(c: &mut Criterion) {
    let recognizer = Recognizer::from_rules([
        "E -> E + T | T",
        "T -> T * F | F",
        "F -> ( E ) | id",
    ])
    .unwrap();

    // ( id + id * id ) + ( id + id * id ) + ...
    let mut tokens = vec![];
    for i in 0..1000 {
        if i > 0 {
            tokens.push(Token::new("+", "+", 1, tokens.len() + 1));
        }
        for kind in ["(", "id", "+", "id", "*", "id", ")"] {
            tokens.push(Token::new(kind, kind, 1, tokens.len() + 1));
        }
    }

    c.bench_function("recognize", |b| {
        b.iter(|| recognizer.recognize(tokens.iter().cloned()).unwrap());
    });
}
