//! CLI shell around the grammar-equivalence core. Argument handling, file
//! I/O and pretty-printing live here and only here — per spec §1 these sit
//! outside the core's tested surface.

use std::fs;
use std::process::ExitCode;

use clap::{Parser as ClapParser, ValueEnum as ClapValueEnum};
use log::info;

use cfgeq::cnf::to_cnf;
use cfgeq::cyk::CykIndex;
use cfgeq::error::CfgError;
use cfgeq::generator::GenSettings;
use cfgeq::grammar::Grammar;
use cfgeq::parser::Parser as GrammarParser;
use cfgeq::tester::find_counter_example;

/// Decide whether two context-free grammars accept the same language.
#[derive(ClapParser, Debug)]
#[command(name = "cfgeq", version, about)]
struct Args {
    /// First grammar source file
    grammar_file_1: String,
    /// Second grammar source file
    grammar_file_2: String,

    /// Number of generation attempts per grammar direction
    #[arg(long, default_value_t = 5000)]
    trials: usize,
    /// PRNG seed for the differential tester
    #[arg(long, default_value_t = 1_874_592)]
    seed: u64,
    /// Hard ceiling on expansion steps per generation attempt
    #[arg(long = "max-steps", default_value_t = 200)]
    max_steps: usize,
    /// Hard ceiling on terminal count in a generated witness
    #[arg(long = "max-len", default_value_t = 40)]
    max_len: usize,
    /// Soft lower bound of the length corridor the generator favors
    #[arg(long = "target-min", default_value_t = 1)]
    target_min: usize,
    /// Soft upper bound of the length corridor the generator favors
    #[arg(long = "target-max", default_value_t = 20)]
    target_max: usize,
    /// Probability of expanding the leftmost nonterminal at each step
    #[arg(long = "p-leftmost", default_value_t = 0.8)]
    p_leftmost: f64,

    /// Report format for the final result
    #[arg(long = "format", default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ClapValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    Text,
    Yaml,
}

fn load_grammar(path: &str) -> Result<Grammar, CfgError> {
    println!("Attempting to open grammar file '{path}'...");
    let source = fs::read_to_string(path)?;
    println!("{path} opened successfully!");

    println!("Parsing grammar from {path}...");
    let grammar = GrammarParser::new(&source).parse_grammar()?;
    println!("Grammar parsed successfully!");
    Ok(grammar)
}

fn convert_to_cnf(g: Grammar, label: &str) -> Result<Grammar, CfgError> {
    println!("Converting {label} into Chomsky Normal Form...");
    let cnf = to_cnf(g)?;
    println!("{label} converted successfully!");
    Ok(cnf)
}

fn run(args: &Args) -> Result<(), CfgError> {
    let g1 = load_grammar(&args.grammar_file_1)?;
    let g2 = load_grammar(&args.grammar_file_2)?;

    let g1 = convert_to_cnf(g1, "grammar 1")?;
    let g2 = convert_to_cnf(g2, "grammar 2")?;

    println!("Building CYK index for grammar 1...");
    let idx1 = CykIndex::build(&g1);
    println!("Index for grammar 1 built successfully!");

    println!("Building CYK index for grammar 2...");
    let idx2 = CykIndex::build(&g2);
    println!("Index for grammar 2 built successfully!");
    info!(
        "grammar 1: {} nonterminals, grammar 2: {} nonterminals",
        g1.nonterminals.len(),
        g2.nonterminals.len()
    );

    let cfg = GenSettings {
        max_steps: args.max_steps,
        max_len: args.max_len,
        target_min: args.target_min,
        target_max: args.target_max,
        p_leftmost: args.p_leftmost,
    };

    println!("Attempting to find equivalence counterexamples...");
    let result = find_counter_example(&g1, &idx1, &g2, &idx2, args.trials, args.seed, &cfg);

    match args.format {
        OutputFormat::Text => {
            if result.found {
                println!("Grammars are NOT equivalent.");
                println!("Witness: {}", result.witness);
                println!("G1 accepts: {}", result.g1_accepts);
                println!("G2 accepts: {}", result.g2_accepts);
            } else {
                println!("No counterexample found in budget.");
            }
        }
        OutputFormat::Yaml => {
            let report = serde_yaml::to_string(&result)
                .map_err(|e| CfgError::Semantic(format!("failed to render yaml report: {e}")))?;
            print!("{report}");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // `--help`/`--version` surface as an `Err` too, but they're a
        // successful early exit (code 0) with their own stream/formatting;
        // only a genuine usage error should hit spec §6's exit-1 path, so
        // let clap's own `exit()` pick the right code for each `ErrorKind`.
        Err(e) => e.exit(),
    };

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
