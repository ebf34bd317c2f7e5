use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use semgen_agent::{RunRequest, ValidationPolicy};
use semgen_cli::{commands, logging, Overrides, SemgenConfig, VERSION};
use semgen_osi::OsiSpecProvider;
use std::path::PathBuf;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Path to a semgen.toml configuration file");
    let offline_arg = Arg::new("offline")
        .long("offline")
        .action(ArgAction::SetTrue)
        .help("Use the bundled OSI specification without fetching");

    Command::new("semgen")
        .version(VERSION)
        .about("Generate OSI semantic models from database schemas")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("run")
                .about("Generate a semantic model from a catalog snapshot")
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON snapshot of the tables to model"),
                )
                .arg(
                    Arg::new("tables")
                        .long("tables")
                        .value_delimiter(',')
                        .help("Comma separated tables to model (default: all)"),
                )
                .arg(
                    Arg::new("instructions")
                        .long("instructions")
                        .help("Extra guidance passed to the model"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for model records"),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .value_parser(["structural", "llm"])
                        .help("Validation gate"),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .help("Chat model name"),
                )
                .arg(config_arg.clone())
                .arg(offline_arg.clone()),
        )
        .subcommand(
            Command::new("validate")
                .about("Structurally validate a semantic model file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Semantic model JSON"),
                ),
        )
        .subcommand(
            Command::new("spec")
                .about("Show which OSI specification the agent would use")
                .arg(
                    Arg::new("refresh")
                        .long("refresh")
                        .action(ArgAction::SetTrue)
                        .help("Bypass the cache"),
                )
                .arg(
                    Arg::new("print")
                        .long("print")
                        .action(ArgAction::SetTrue)
                        .help("Include the full specification text"),
                )
                .arg(config_arg)
                .arg(offline_arg),
        )
}

fn load_config(args: &ArgMatches, overrides: Overrides) -> Result<SemgenConfig> {
    let path = args.get_one::<PathBuf>("config");
    let config = SemgenConfig::load(path.map(PathBuf::as_path))?;
    Ok(config.with_overrides(overrides))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn dispatch(matches: ArgMatches) -> Result<i32> {
    match matches.subcommand() {
        Some(("run", args)) => {
            let policy = match args.get_one::<String>("policy").map(String::as_str) {
                Some("llm") => Some(ValidationPolicy::LlmGate),
                Some(_) => Some(ValidationPolicy::StructuralGate),
                None => None,
            };
            let config = load_config(
                args,
                Overrides {
                    output_dir: args.get_one::<PathBuf>("output").cloned(),
                    validation_policy: policy,
                    offline: args.get_flag("offline"),
                    model: args.get_one::<String>("model").cloned(),
                },
            )?;

            let mut request = RunRequest::new();
            if let Some(tables) = args.get_many::<String>("tables") {
                request = request.with_tables(tables.map(|t| t.trim().to_string()));
            }
            if let Some(instructions) = args.get_one::<String>("instructions") {
                request = request.with_instructions(instructions.clone());
            }

            let catalog = args
                .get_one::<PathBuf>("catalog")
                .context("--catalog is required")?;
            let summary = commands::run(&config, catalog, request).await?;
            print_json(&summary)?;
            Ok(summary.exit_code())
        }
        Some(("validate", args)) => {
            let file = args.get_one::<PathBuf>("file").context("model file is required")?;
            let report = commands::validate(file)?;
            print_json(&report)?;
            Ok(if report.is_valid { 0 } else { 1 })
        }
        Some(("spec", args)) => {
            let config = load_config(
                args,
                Overrides {
                    offline: args.get_flag("offline"),
                    ..Overrides::default()
                },
            )?;
            let provider = OsiSpecProvider::from_config(&config.osi)?;
            let summary =
                commands::spec(&provider, args.get_flag("refresh"), args.get_flag("print")).await;
            print_json(&summary)?;
            Ok(0)
        }
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"), "info");

    match dispatch(matches).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
