mod avatar;
mod cli;
mod config;
mod export;
mod journal;
mod source;
mod store;
mod user;
mod view;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "userdash", about = "Browse and edit a remote user list from the terminal")]
pub struct Args {
    #[arg(long, env = "USERDASH_URL", help = "Endpoint returning the JSON user list")]
    pub url: Option<String>,

    #[arg(long, value_name = "N", help = "Rows per page (default: 10)")]
    pub page_size: Option<usize>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Session journal directory")]
    pub journal_dir: Option<PathBuf>,

    #[arg(long, help = "Directory the CSV export is written to")]
    pub export_dir: Option<PathBuf>,

    #[arg(
        short = 'c',
        long = "command",
        value_name = "CMD",
        action = clap::ArgAction::Append,
        help = "Run a command and exit (repeatable, e.g. -c '/export')"
    )]
    pub commands: Vec<String>,

    #[arg(long, help = "Start with an empty list instead of fetching")]
    pub no_load: bool,

    #[arg(long, help = "Delete without asking for confirmation")]
    pub yes: bool,

    #[arg(long, help = "Verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Debug output (print settings and timings)")]
    pub debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load()?
    };

    // CLI flags override every config layer
    if let Some(url) = &args.url {
        cfg.source.url = url.clone();
    }
    if let Some(page_size) = args.page_size {
        cfg.view.page_size = page_size;
    }
    if let Some(dir) = &args.export_dir {
        cfg.export.dir = Some(dir.clone());
    }
    if let Some(dir) = &args.journal_dir {
        cfg.journal_dir = Some(dir.clone());
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error {}", error);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} error(s))",
            errors.len()
        ));
    }

    if args.debug {
        eprintln!("[DEBUG] Source: {}", cfg.source.url);
        eprintln!("[DEBUG] Timeout: {} ms", cfg.source.timeout_ms);
        eprintln!("[DEBUG] Page size: {}", cfg.view.page_size);
        eprintln!("[DEBUG] Export: {:?} / {}", cfg.export.dir, cfg.export.file_name);
    }

    let root = std::env::current_dir()?;
    let journal_dir = cfg
        .journal_dir
        .clone()
        .unwrap_or_else(|| root.join(".userdash").join("sessions"));
    std::fs::create_dir_all(&journal_dir)?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let journal_path = journal_dir.join(format!("{}.jsonl", session_id));
    let journal = journal::Journal::new(&journal_path, &session_id)?;

    let http = source::HttpSource::new(&cfg.source.url, cfg.source.timeout_ms);
    let one_shot = !args.commands.is_empty();

    let ctx = cli::Context {
        session_id,
        source: Box::new(http),
        store: RefCell::new(store::UserStore::new()),
        load_state: RefCell::new(source::LoadState::Idle),
        pager: RefCell::new(view::Pager::new(cfg.view.page_size)),
        sort: RefCell::new(None),
        journal: RefCell::new(journal),
        export_dir: cfg.export.dir.clone().unwrap_or(root),
        export_name: cfg.export.file_name.clone(),
        interactive: !one_shot,
        assume_yes: args.yes,
        verbose: args.verbose,
        debug: args.debug,
    };

    if cfg.source.load_on_start && !args.no_load {
        if let Err(e) = cli::reload(&ctx) {
            eprintln!("{}", e);
        }
    }

    if one_shot {
        cli::run_once(&ctx, &args.commands)
    } else {
        cli::run_repl(ctx)
    }
}
