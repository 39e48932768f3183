use slrkit::{table::ConflictKind, ErrorKind, Grammar, Recognizer, Token};
use std::{env, path::PathBuf};
use tracing_subscriber::EnvFilter;

fn load(name: &str) -> Recognizer {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let grammar = Grammar::from_file(
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
            .join(format!("tests/{}.grammar", name)),
    )
    .unwrap();
    Recognizer::new(grammar).unwrap()
}

fn tokens(source: &str) -> Vec<Token> {
    source
        .split_whitespace()
        .enumerate()
        .map(|(i, kind)| Token::new(kind, kind, 1, i + 1))
        .collect()
}

macro_rules! define_tests {
    ($($name:ident => [$($kind:ident),*]),*$(,)?) => {$(
        #[test]
        fn $name() {
            let recognizer = load(stringify!($name));
            let kinds: Vec<ConflictKind> =
                recognizer.conflicts().iter().map(|c| c.kind()).collect();
            let expected: Vec<ConflictKind> = vec![$(ConflictKind::$kind),*];
            assert_eq!(kinds, expected);
        }
    )*};
}

define_tests! {
    arithmetic => [],
    nullable => [],
    lists => [],
    dangling_else => [ShiftReduce],
    reduce_reduce => [ReduceReduce],
    // LALR(1) but not SLR(1).
    assignment => [ShiftReduce],
}

#[test]
fn arithmetic_sentences() {
    let r = load("arithmetic");
    for accepted in ["id", "id + id * id", "( ( id ) )", "id * ( id + id ) * id"] {
        r.recognize(tokens(accepted)).unwrap();
    }
    for rejected in ["", "id id", "( id", "id + * id", ")"] {
        let err = r.recognize(tokens(rejected)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "{}", rejected);
    }
}

#[test]
fn nullable_sentences() {
    let r = load("nullable");
    for accepted in ["", "a b", "a a b b", "c", "a b c", "d d a b"] {
        r.recognize(tokens(accepted)).unwrap();
    }
    for rejected in ["b", "a a b", "c c", "a c b"] {
        assert!(r.recognize(tokens(rejected)).is_err(), "{}", rejected);
    }
}

#[test]
fn list_sentences() {
    let r = load("lists");
    for accepted in ["num", "[ ]", "[ num ]", "[ num , [ ] , [ num , num ] ]"] {
        r.recognize(tokens(accepted)).unwrap();
    }
    for rejected in ["[ num , ]", "[ , num ]", "[ num num ]"] {
        assert!(r.recognize(tokens(rejected)).is_err(), "{}", rejected);
    }
}
