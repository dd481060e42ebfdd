use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use formprobe_cli::{classify_files, dry_run, inspect, policy_skips, render_inspect};
use formprobe_engine::EngineConfig;
use formprobe_policy::{ActionContext, ActionKind, SkipPolicy, SkipRegistry};
use formprobe_schema::Template;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn action_arg() -> Arg {
    Arg::new("action")
        .long("action")
        .default_value("update")
        .value_parser(|s: &str| s.parse::<ActionKind>())
        .help("Action kind: create, update, inactivate or revise")
}

fn template_arg(required: bool) -> Arg {
    Arg::new("template")
        .long("template")
        .required(required)
        .value_parser(value_parser!(PathBuf))
        .help("Template JSON file")
}

fn cli() -> Command {
    Command::new("formprobe")
        .version(formprobe_engine::VERSION)
        .about("Template-driven form field exerciser")
        .arg_required_else_help(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show which fields an action would touch")
                .arg(template_arg(true))
                .arg(action_arg()),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify two snapshot files into a difference report")
                .arg(
                    Arg::new("before")
                        .long("before")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot taken before filling"),
                )
                .arg(
                    Arg::new("after")
                        .long("after")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot taken after saving"),
                )
                .arg(template_arg(false))
                .arg(action_arg())
                .arg(
                    Arg::new("entity")
                        .long("entity")
                        .default_value("form")
                        .help("Entity name recorded in the report"),
                )
                .arg(
                    Arg::new("only")
                        .long("only")
                        .action(ArgAction::Append)
                        .help("Restrict updated and unable rows to these qids"),
                ),
        )
        .subcommand(
            Command::new("dry-run")
                .about("Exercise a template against an in-memory rendering")
                .arg(template_arg(true))
                .arg(action_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine configuration TOML"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn action_of(args: &ArgMatches) -> ActionKind {
    args.get_one::<ActionKind>("action")
        .copied()
        .unwrap_or(ActionKind::Update)
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))
}

fn run_inspect(args: &ArgMatches) -> Result<()> {
    let template = Template::from_path(required_path(args, "template")?)?;
    let action = ActionContext::for_kind(action_of(args));
    let lines = inspect(&template, &action, &SkipPolicy::new());
    print!("{}", render_inspect(&lines));
    Ok(())
}

fn run_classify(args: &ArgMatches) -> Result<()> {
    let action = action_of(args);
    let skips = match args.get_one::<PathBuf>("template") {
        Some(path) => policy_skips(
            &Template::from_path(path)?,
            &ActionContext::for_kind(action),
            &SkipPolicy::new(),
        ),
        None => SkipRegistry::new(),
    };
    let only: Option<Vec<String>> = args
        .get_many::<String>("only")
        .map(|qids| qids.cloned().collect());
    let entity = args
        .get_one::<String>("entity")
        .map_or("form", String::as_str);

    let report = classify_files(
        required_path(args, "before")?,
        required_path(args, "after")?,
        &skips,
        only.as_deref(),
        entity,
        action,
    )?;
    println!("{}", report.to_json_pretty()?);
    Ok(())
}

async fn run_dry(args: &ArgMatches) -> Result<()> {
    let template = Template::from_path(required_path(args, "template")?)?;
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.with_rng_seed(*seed);
    }

    let run = dry_run(&template, ActionContext::for_kind(action_of(args)), config).await?;
    for diagnostic in &run.diagnostics {
        eprintln!("{diagnostic}");
    }
    println!("{}", run.report.to_json_pretty()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("inspect", args)) => run_inspect(args),
        Some(("classify", args)) => run_classify(args),
        Some(("dry-run", args)) => run_dry(args).await,
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}
