use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pagekit_core::{DataContext, Error as CoreError, SaveDraft, StateKeys};

/// Exit status when the editor state cannot be saved at all.
const EXIT_UNRECOVERABLE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "pagekit",
    about = "Sanitize page builder state and preview live-data bindings",
    version
)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Validate, repair and serialize an editor node map
    Sanitize(SanitizeArgs),
    /// Resolve {{tokens}} in a template against a data context
    Resolve(ResolveArgs),
    /// Print the bound text of every heading and text node
    Render(RenderArgs),
    /// List the token paths used in a template
    Tokens(TokensArgs),
    /// Build the save form fields for a node map
    Save(SaveArgs),
}

#[derive(ClapArgs, Debug)]
struct StateArgs {
    /// Node map JSON (identity -> record)
    state: PathBuf,
    /// JSON file overriding envelope key names
    #[arg(long)]
    keys: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct SanitizeArgs {
    #[command(flatten)]
    state: StateArgs,
    /// Write the serialized state here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Pretty-print the serialized state
    #[arg(long, default_value_t = false)]
    pretty: bool,
    /// Print the validation report as JSON on stderr
    #[arg(long, default_value_t = false)]
    report: bool,
}

#[derive(ClapArgs, Debug)]
struct ResolveArgs {
    /// Data context JSON
    #[arg(long)]
    context: Option<PathBuf>,
    /// Template text; read from FILE when not given
    #[arg(long, short)]
    template: Option<String>,
    /// File holding the template text
    file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct RenderArgs {
    #[command(flatten)]
    state: StateArgs,
    /// Data context JSON
    #[arg(long)]
    context: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct TokensArgs {
    template: String,
}

#[derive(ClapArgs, Debug)]
struct SaveArgs {
    #[command(flatten)]
    state: StateArgs,
    #[arg(long)]
    title: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    slug: Option<String>,
    #[arg(long, default_value = "draft")]
    status: String,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let res = match cli.cmd {
        Cmd::Sanitize(a) => cmd_sanitize(a),
        Cmd::Resolve(a) => cmd_resolve(a),
        Cmd::Render(a) => cmd_render(a),
        Cmd::Tokens(a) => cmd_tokens(a),
        Cmd::Save(a) => cmd_save(a),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(CoreError::UnrecoverableState { report }) = e.downcast_ref::<CoreError>() {
                for v in report.iter().filter(|v| !v.repaired) {
                    eprintln!("error: {}", v);
                }
                eprintln!("error: {}", e);
                return ExitCode::from(EXIT_UNRECOVERABLE);
            }
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_state(args: &StateArgs) -> Result<(serde_json::Map<String, serde_json::Value>, StateKeys)> {
    let keys = match &args.keys {
        Some(p) => StateKeys::from_file(p).with_context(|| format!("loading keys {}", p.display()))?,
        None => StateKeys::default(),
    };
    let value = pagekit_core::json::read_json_file(&args.state)
        .with_context(|| format!("loading state {}", args.state.display()))?;
    let serde_json::Value::Object(nodes) = value else {
        bail!("{}: node map must be a JSON object", args.state.display());
    };
    Ok((nodes, keys))
}

fn load_context(path: Option<&Path>) -> Result<DataContext> {
    match path {
        Some(p) => DataContext::from_file(p).with_context(|| format!("loading context {}", p.display())),
        None => Ok(DataContext::default()),
    }
}

fn cmd_sanitize(args: SanitizeArgs) -> Result<()> {
    let (nodes, keys) = load_state(&args.state)?;
    let out = pagekit_core::sanitize_and_serialize(&nodes, &keys)?;
    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&out.report)?);
    }
    let text = if args.pretty {
        serde_json::to_string_pretty(&out.nodes)?
    } else {
        out.json
    };
    match args.out {
        Some(p) => std::fs::write(&p, text).with_context(|| format!("writing {}", p.display()))?,
        None => println!("{}", text),
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let ctx = load_context(args.context.as_deref())?;
    let template = match (args.template, args.file) {
        (Some(t), _) => t,
        (None, Some(f)) => std::fs::read_to_string(&f).with_context(|| format!("reading {}", f.display()))?,
        (None, None) => bail!("either --template or a template file is required"),
    };
    print!("{}", pagekit_core::resolve(&template, &ctx));
    if !template.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let (nodes, keys) = load_state(&args.state)?;
    let ctx = load_context(args.context.as_deref())?;
    for r in pagekit_core::render_all(&nodes, &keys, &ctx) {
        let text = match &r.text {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("{}\t{:?}\t{}", r.node_id, r.component, text);
        for path in &r.unresolved {
            tracing::warn!("{}: unresolved token {{{{{}}}}}", r.node_id, path);
        }
    }
    Ok(())
}

fn cmd_tokens(args: TokensArgs) -> Result<()> {
    for path in pagekit_core::tokens(&args.template) {
        println!("{}", pagekit_core::parse_path(path).join("\t"));
    }
    Ok(())
}

fn cmd_save(args: SaveArgs) -> Result<()> {
    let (nodes, keys) = load_state(&args.state)?;
    let draft = SaveDraft {
        title: args.title,
        category_id: args.category,
        slug: args.slug,
        status: args.status,
    };
    let req = pagekit_core::prepare_save(&draft, &nodes, &keys)?;
    if let Some(msg) = req.report().summary() {
        eprintln!("warning: {}", msg);
    }
    let fields: serde_json::Map<String, serde_json::Value> = req
        .form_fields()
        .into_iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
        .collect();
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}
