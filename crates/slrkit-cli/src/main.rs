use anyhow::Context as _;
use clap::Parser;
use slrkit::{language, Config, Grammar, Recognizer, Token};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    #[arg(required_unless_present = "builtin")]
    input: Option<PathBuf>,

    /// Use the bundled grammar of the imperative language.
    #[arg(long, conflicts_with = "input")]
    builtin: bool,

    /// The token file to recognize, one `KIND LINE COLUMN [LEXEME...]` per line.
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Print the augmented grammar.
    #[arg(long)]
    dump_grammar: bool,

    /// Print the LR(0) item sets and their transitions.
    #[arg(long)]
    dump_automaton: bool,

    /// Print the FIRST and FOLLOW sets.
    #[arg(long)]
    dump_sets: bool,

    /// Print the ACTION and GOTO tables.
    #[arg(long)]
    dump_table: bool,

    /// The upper bound on the number of LR(0) states.
    #[arg(long)]
    max_states: Option<usize>,

    /// The upper bound on the number of reductions between two shifts.
    #[arg(long)]
    reduce_limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let grammar = match &args.input {
        Some(input) => Grammar::from_file(input)
            .with_context(|| format!("failed to load the grammar from {}", input.display()))?,
        None => language::grammar().context("failed to load the bundled grammar")?,
    };

    let mut config = Config::new();
    if let Some(max_states) = args.max_states {
        config = config.max_states(max_states);
    }
    if let Some(reduce_limit) = args.reduce_limit {
        config = config.reduce_limit(reduce_limit);
    }
    let recognizer = Recognizer::with_config(grammar, config)?;
    let g = recognizer.grammar();

    if args.dump_grammar {
        println!("{}", g);
    }
    if args.dump_automaton {
        println!("{}", recognizer.automaton().display(g));
    }
    if args.dump_sets {
        print!("{}", recognizer.first_sets().display(g));
        println!("{}", recognizer.follow_sets().display(g));
    }
    if args.dump_table {
        println!("{}", recognizer.table().display(g));
    }

    let conflicts = recognizer.conflicts();
    if !conflicts.is_empty() {
        let suffix = if conflicts.len() == 1 { "" } else { "s" };
        println!(
            "[warning] The grammar is not SLR(1): {} conflict{} detected.",
            conflicts.len(),
            suffix
        );
        for conflict in conflicts {
            println!("  - {}", conflict.display(g));
        }
    }

    if let Some(path) = &args.tokens {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read the token file {}", path.display()))?;
        let tokens = read_tokens(&source)
            .with_context(|| format!("malformed token file {}", path.display()))?;
        recognizer.recognize(tokens)?;
        println!("accepted");
    }

    Ok(())
}

/// Read tokens in the form of `KIND LINE COLUMN [LEXEME...]`.
fn read_tokens(source: &str) -> anyhow::Result<Vec<Token>> {
    let mut tokens = vec![];
    for (i, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(kind), Some(lineno), Some(column)) = (fields.next(), fields.next(), fields.next())
        else {
            anyhow::bail!("line {}: expected `KIND LINE COLUMN [LEXEME...]'", i + 1);
        };
        let lineno = lineno
            .parse()
            .with_context(|| format!("line {}: invalid line number `{}'", i + 1, lineno))?;
        let column = column
            .parse()
            .with_context(|| format!("line {}: invalid column number `{}'", i + 1, column))?;
        let lexeme = fields.collect::<Vec<_>>().join(" ");
        tokens.push(Token::new(kind, lexeme, lineno, column));
    }
    Ok(tokens)
}
