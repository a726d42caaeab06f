//! Command-line interface for rubyle
//!
//! Usage:
//!   rubyle play [--reference `<file>`]                        - Play in the terminal
//!   rubyle diff `<guess|->` [--reference `<file>`] [--format `<format>`] - Highlight one guess
//!   rubyle hints [--reference `<file>`]                       - Print the reference hints
//!   rubyle ast `<file|->` [--format `<format>`]               - Dump a parsed snippet
mod play;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rubyle::config::{Loader, RubyleConfig};
use rubyle::formats::{self, HighlightFormat};
use rubyle::logging::{init_logging, LogTarget};
use rubyle::parser::parse;
use rubyle::session::Session;
use std::io::Read;
use std::path::PathBuf;

/// Project-local configuration picked up when present
const LOCAL_CONFIG: &str = "rubyle.toml";

fn reference_arg() -> Arg {
    Arg::new("reference")
        .long("reference")
        .short('r')
        .help("Ruby file holding the snippet to guess")
        .value_parser(value_parser!(PathBuf))
}

fn cli() -> Command {
    Command::new("rubyle")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Guess the Ruby snippet, scored by syntax-tree structure")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the defaults")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More logging (repeatable)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .global(true)
                .help("Write logs to this file instead of stderr")
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("play")
                .about("Play interactively in the terminal")
                .arg(reference_arg()),
        )
        .subcommand(
            Command::new("diff")
                .about("Highlight a guess against the reference")
                .arg(
                    Arg::new("guess")
                        .help("Guess text, or '-' to read it from stdin")
                        .required(true)
                        .index(1),
                )
                .arg(reference_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format")
                        .value_parser(["ansi", "tag", "json"])
                        .default_value("ansi"),
                ),
        )
        .subcommand(
            Command::new("hints")
                .about("Print the symbols and length of the reference")
                .arg(reference_arg()),
        )
        .subcommand(
            Command::new("ast")
                .about("Dump the syntax tree of a Ruby snippet")
                .arg(
                    Arg::new("path")
                        .help("Ruby file, or '-' for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format")
                        .value_parser(["sexp", "json"])
                        .default_value("sexp"),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("no command given");
    };

    let target = match matches.get_one::<PathBuf>("log-file") {
        Some(path) => LogTarget::File(path.clone()),
        // The terminal belongs to the game UI
        None if name == "play" => LogTarget::Discard,
        None => LogTarget::Stderr,
    };
    init_logging(matches.get_count("verbose"), target).context("failed to set up logging")?;

    let config = load_config(matches, sub)?;
    match name {
        "play" => handle_play_command(&config),
        "diff" => handle_diff_command(&config, sub),
        "hints" => handle_hints_command(&config),
        "ast" => handle_ast_command(&config, sub),
        other => bail!("unknown command '{other}'"),
    }
}

fn load_config(matches: &ArgMatches, sub: &ArgMatches) -> Result<RubyleConfig> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG);
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_file(path);
    }
    if let Some(path) = sub.try_get_one::<PathBuf>("reference").ok().flatten() {
        loader = loader.set_override("game.reference_file", path.display().to_string())?;
    }
    loader.build().context("invalid configuration")
}

fn start_session(config: &RubyleConfig) -> Result<Session> {
    let reference = config.game.reference_source()?;
    Ok(Session::start(&reference, &config.settings())?)
}

/// Read a file argument, with `-` meaning stdin
fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(arg).with_context(|| format!("failed to read {arg}"))
}

fn handle_play_command(config: &RubyleConfig) -> Result<()> {
    let session = start_session(config)?;
    play::run(session).context("terminal error")
}

fn handle_diff_command(config: &RubyleConfig, matches: &ArgMatches) -> Result<()> {
    let session = start_session(config)?;
    let guess = match matches.get_one::<String>("guess").map(String::as_str) {
        Some("-") => read_input("-")?,
        Some(text) => text.to_string(),
        None => bail!("missing guess"),
    };
    let format: HighlightFormat = matches
        .get_one::<String>("format")
        .map_or(Ok(HighlightFormat::default()), |name| name.parse())?;

    let spans = session.render_guess(&guess)?;
    println!("{}", format.render(&guess, &spans)?);
    Ok(())
}

fn handle_hints_command(config: &RubyleConfig) -> Result<()> {
    let session = start_session(config)?;
    let symbols: Vec<&str> = session.symbols().iter().map(String::as_str).collect();
    println!("symbols: {}", symbols.join(" "));
    println!("code length: {}", session.code_length());
    Ok(())
}

fn handle_ast_command(config: &RubyleConfig, matches: &ArgMatches) -> Result<()> {
    let Some(path) = matches.get_one::<String>("path") else {
        bail!("missing path");
    };
    let source = read_input(path)?;
    let ast = parse(&source, &config.parser)?;
    let output = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => formats::tree_to_json(ast.root())?,
        _ => formats::to_sexp(ast.root()),
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["rubyle", "diff", "fibo 10", "-vv", "--format", "tag"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "diff");
        assert_eq!(sub.get_one::<String>("format").unwrap(), "tag");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["rubyle", "ast", "-", "--format", "xml"])
            .is_err());
    }

    #[test]
    fn test_reference_flag_overrides_config() {
        let path = std::env::temp_dir().join(format!("rubyle-cli-{}.rb", std::process::id()));
        std::fs::write(&path, "puts 1\n").unwrap();
        let matches = cli()
            .try_get_matches_from(["rubyle", "hints", "--reference", path.to_str().unwrap()])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let config = load_config(&matches, sub).unwrap();
        assert_eq!(config.game.reference_source().unwrap(), "puts 1\n");
        std::fs::remove_file(&path).ok();
    }
}
