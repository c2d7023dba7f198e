use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

use termsage_core::ollama::DEFAULT_URL;
use termsage_core::{ClientConfig, Ollama};

mod session;

const ARG_HOST: &str = "host";
const ARG_MODEL: &str = "model";
const ARG_SYSTEM: &str = "system";
const ARG_TIMEOUT: &str = "timeout";
const ARG_LOG_REQUESTS: &str = "log-requests";
const ARG_LOG_REPLIES: &str = "log-replies";
const ARG_VERBOSE: &str = "verbose";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

fn build_cli_args() -> Command {
    Command::new("termsage")
        .about("Chat with a local Ollama server from the terminal")
        .arg(
            Arg::new(ARG_HOST)
                .help("Ollama server URL")
                .num_args(1)
                .value_name("URL")
                .long("host")
                .default_value(DEFAULT_URL),
        )
        .arg(
            Arg::new(ARG_MODEL)
                .help("model to chat with, skipping the selection prompt")
                .num_args(1)
                .value_name("NAME")
                .long("model")
                .short('m'),
        )
        .arg(
            Arg::new(ARG_SYSTEM)
                .help("system prompt placed at the start of the history")
                .num_args(1)
                .value_name("TEXT")
                .long("system")
                .default_value(DEFAULT_SYSTEM_PROMPT),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .help("read timeout in seconds")
                .num_args(1)
                .value_name("SECONDS")
                .long("timeout")
                .value_parser(value_parser!(u64))
                .default_value("120"),
        )
        .arg(
            Arg::new(ARG_LOG_REQUESTS)
                .help("log every request body")
                .long(ARG_LOG_REQUESTS)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_LOG_REPLIES)
                .help("log every reply body")
                .long(ARG_LOG_REPLIES)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v'),
        )
}

fn init_logging(args: &ArgMatches) {
    let verbose = args.get_one::<u8>(ARG_VERBOSE).copied().unwrap_or_default();
    let dumps = args.get_flag(ARG_LOG_REQUESTS) || args.get_flag(ARG_LOG_REPLIES);
    let level = match verbose {
        0 if dumps => Level::INFO,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn connect(args: &ArgMatches) -> anyhow::Result<Ollama> {
    let url = args
        .get_one::<String>(ARG_HOST)
        .map(String::as_str)
        .unwrap_or(DEFAULT_URL);
    let timeout = args.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(120);
    let config = ClientConfig::default()
        .read_timeout(Duration::from_secs(timeout))
        .log_requests(args.get_flag(ARG_LOG_REQUESTS))
        .log_replies(args.get_flag(ARG_LOG_REPLIES));
    Ollama::with_config(url, config).with_context(|| format!("cannot use server url {url}"))
}

fn run(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let ollama = connect(args)?;

    if !ollama.is_running() {
        println!("Ollama server is not running. Please start it first with 'ollama serve'.");
        return Ok(ExitCode::FAILURE);
    }
    println!("Connected to Ollama server.");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let model = match args.get_one::<String>(ARG_MODEL) {
        Some(model) => model.clone(),
        None => {
            let models = ollama.list_models().context("failed to list models")?;
            if models.is_empty() {
                println!(
                    "  No models found. Please pull at least one model (e.g., 'ollama pull llama3')."
                );
                return Ok(ExitCode::FAILURE);
            }
            match session::choose_model(&models, &mut input, &mut output)? {
                Some(model) => model,
                None => return Ok(ExitCode::SUCCESS),
            }
        }
    };

    let system = args
        .get_one::<String>(ARG_SYSTEM)
        .map(String::as_str)
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    session::chat_loop(&ollama, &model, system, &mut input, &mut output)?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let args = build_cli_args().get_matches();
    init_logging(&args);
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        build_cli_args().debug_assert();
    }

    #[test]
    fn defaults_apply() {
        let args = build_cli_args().get_matches_from(["termsage"]);
        assert_eq!(args.get_one::<String>(ARG_HOST).unwrap(), DEFAULT_URL);
        assert_eq!(*args.get_one::<u64>(ARG_TIMEOUT).unwrap(), 120);
        assert!(args.get_one::<String>(ARG_MODEL).is_none());
        assert!(!args.get_flag(ARG_LOG_REQUESTS));
    }

    #[test]
    fn connect_rejects_tls_url() {
        let args = build_cli_args().get_matches_from(["termsage", "--host", "https://example.com"]);
        assert!(connect(&args).is_err());
    }

    #[test]
    fn connect_applies_timeout() {
        let args = build_cli_args().get_matches_from([
            "termsage",
            "--host",
            "http://127.0.0.1:9",
            "--timeout",
            "3",
        ]);
        let ollama = connect(&args).unwrap();
        assert_eq!(ollama.http().config().get_read_timeout(), Duration::from_secs(3));
        assert_eq!(ollama.http().endpoint().port(), 9);
    }
}
