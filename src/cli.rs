use crate::{
    avatar,
    export,
    journal::Journal,
    source::{self, LoadState, UserSource},
    store::UserStore,
    user::{self, NewUser, UserPatch},
    view::{self, Pager, Sort, SortColumn, SortOrder},
};
use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct Context {
    pub session_id: String,
    pub source: Box<dyn UserSource>,
    pub store: RefCell<UserStore>,
    pub load_state: RefCell<LoadState>,
    pub pager: RefCell<Pager>,
    pub sort: RefCell<Option<Sort>>,
    pub journal: RefCell<Journal>,
    pub export_dir: PathBuf,
    pub export_name: String,
    /// Prompt before destructive commands; off in one-shot mode
    pub interactive: bool,
    /// Skip delete confirmation
    pub assume_yes: bool,
    pub verbose: bool,
    pub debug: bool,
}

/// What the caller should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

fn verbose(ctx: &Context, message: &str) {
    if ctx.verbose || ctx.debug {
        eprintln!("[VERBOSE] {}", message);
    }
}

fn debug(ctx: &Context, message: &str) {
    if ctx.debug {
        eprintln!("[DEBUG] {}", message);
    }
}

/// Fetch from the source and replace the store. Failure is reported but
/// never fatal; the previous contents stay visible.
pub fn reload(ctx: &Context) -> Result<()> {
    let url = ctx.source.describe();
    verbose(ctx, &format!("Loading users from {}", url));
    let started = std::time::Instant::now();

    let result = source::load_into(
        &mut ctx.store.borrow_mut(),
        ctx.source.as_ref(),
        &mut ctx.load_state.borrow_mut(),
    );
    debug(
        ctx,
        &format!("Load finished in {} ms", started.elapsed().as_millis()),
    );

    match result {
        Ok(count) => {
            let page_count = ctx.store.borrow().page_count(ctx.pager.borrow().page_size());
            ctx.pager.borrow_mut().clamp(page_count);
            let _ = ctx.journal.borrow_mut().load_ok(&url, count);
            println!("Loaded {} users", count);
            Ok(())
        }
        Err(e) => {
            let _ = ctx.journal.borrow_mut().load_failed(&url, &e.to_string());
            Err(anyhow!("Load failed: {}", e))
        }
    }
}

pub fn run_once(ctx: &Context, commands: &[String]) -> Result<()> {
    for command in commands {
        if execute(ctx, command)? == Flow::Exit {
            break;
        }
    }
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("userdash - type /help for commands, /exit to quit");
    print_page(&ctx);

    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match execute(&ctx, line) {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Parse and run one command line
pub fn execute(ctx: &Context, line: &str) -> Result<Flow> {
    let words = shell_words::split(line.trim())
        .map_err(|e| anyhow!("Could not parse command: {}", e))?;
    let Some((cmd, rest)) = words.split_first() else {
        return Ok(Flow::Continue);
    };
    let cmd = cmd.strip_prefix('/').unwrap_or(cmd);

    match cmd {
        "exit" | "quit" => return Ok(Flow::Exit),
        "help" => print_help(),
        "list" | "ls" => print_page(ctx),
        "page" => {
            let n = parse_number(rest.first(), "page number")?;
            let count = page_count(ctx);
            if ctx.pager.borrow_mut().goto(n as usize, count) {
                print_page(ctx);
            } else {
                println!("No page {} (pages: {})", n, count);
            }
        }
        "next" => {
            let count = page_count(ctx);
            if ctx.pager.borrow_mut().next(count) {
                print_page(ctx);
            } else {
                println!("Already on the last page");
            }
        }
        "prev" => {
            if ctx.pager.borrow_mut().prev() {
                print_page(ctx);
            } else {
                println!("Already on the first page");
            }
        }
        "add" => handle_add(ctx, rest)?,
        "edit" => handle_edit(ctx, rest)?,
        "rm" | "delete" => handle_remove(ctx, rest)?,
        "export" => handle_export(ctx, rest)?,
        "reload" => {
            reload(ctx)?;
            print_page(ctx);
        }
        "sort" => handle_sort(ctx, rest)?,
        "status" => print_status(ctx),
        other => println!("Unknown command: /{}", other),
    }
    Ok(Flow::Continue)
}

fn print_help() {
    println!("Commands:");
    println!("  /exit                     - quit");
    println!("  /help                     - show commands");
    println!("  /status                   - show load state and session info");
    println!("Browsing:");
    println!("  /list                     - show the current page");
    println!("  /page <n>                 - go to page n");
    println!("  /next, /prev              - move one page");
    println!("  /sort <column> [asc|desc] - sort rows by name, status, role or last-login");
    println!("  /sort off                 - back to store order");
    println!("Editing (local only, never sent to the server):");
    println!("  /add <name> <email> <role> [active|inactive] [avatar-file]");
    println!("  /edit <id> [--name V] [--email V] [--role V] [--status active|inactive] [--avatar FILE]");
    println!("  /rm <id> [--yes]          - delete a user");
    println!("Data:");
    println!("  /export [dir]             - write the CSV file");
    println!("  /reload                   - fetch users from the source again");
}

fn page_count(ctx: &Context) -> usize {
    ctx.store.borrow().page_count(ctx.pager.borrow().page_size())
}

fn print_page(ctx: &Context) {
    let store = ctx.store.borrow();
    let pager = *ctx.pager.borrow();
    let sort = *ctx.sort.borrow();
    let count = store.page_count(pager.page_size());

    println!("{}", view::render_menu());
    println!("{}", view::header_summary(store.len()));
    let state = ctx.load_state.borrow();
    if state.is_stale() {
        println!("! {}", state.describe());
    }
    let rows = view::rows_for(store.page(pager.page(), pager.page_size()), sort);
    println!("{}", view::render_table(&rows, sort));
    println!("{}", view::render_pager(&pager, count));
}

fn print_status(ctx: &Context) {
    let store = ctx.store.borrow();
    let pager = ctx.pager.borrow();
    println!("Session: {}", ctx.session_id);
    println!("Source: {}", ctx.source.describe());
    println!("Load: {}", ctx.load_state.borrow().describe());
    println!("Users: {}", store.len());
    println!(
        "Page: {} of {} ({} per page)",
        pager.page(),
        store.page_count(pager.page_size()),
        pager.page_size()
    );
    match store.next_id() {
        Some(id) => println!("Next id: {}", id),
        None => println!("Next id: none left"),
    }
    println!("Journal: {:?}", ctx.journal.borrow().path);
}

fn parse_number(word: Option<&String>, what: &str) -> Result<u64> {
    let word = word.ok_or_else(|| anyhow!("Missing {}", what))?;
    word.parse::<u64>()
        .map_err(|_| anyhow!("Invalid {}: {}", what, word))
}

fn parse_status_word(word: &str) -> Result<bool> {
    user::parse_status(word).ok_or_else(|| anyhow!("Invalid status '{}'. Use: active, inactive", word))
}

fn handle_add(ctx: &Context, args: &[String]) -> Result<()> {
    if args.len() < 3 {
        println!("Usage: /add <name> <email> <role> [active|inactive] [avatar-file]");
        return Ok(());
    }
    let status = match args.get(3) {
        Some(word) => parse_status_word(word)?,
        None => false,
    };
    let avatar = match args.get(4) {
        Some(path) => Some(avatar::data_uri_from_file(Path::new(path))?),
        None => None,
    };
    let new_user = NewUser {
        name: args[0].clone(),
        email: args[1].clone(),
        role: args[2].clone(),
        status,
        avatar,
    };

    let id = {
        let mut store = ctx.store.borrow_mut();
        let id = store
            .next_id()
            .ok_or_else(|| anyhow!("No user ids left; remove the user with the largest id first"))?;
        store.add(new_user.into_record(id, chrono::Utc::now()));
        id
    };
    let _ = ctx.journal.borrow_mut().user_added(id);
    println!("Added user {}", id);
    Ok(())
}

fn handle_edit(ctx: &Context, args: &[String]) -> Result<()> {
    let id = parse_number(args.first(), "user id")?;
    let mut patch = UserPatch::default();

    let mut iter = args[1..].iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--name" => patch.name = Some(value.clone()),
            "--email" => patch.email = Some(value.clone()),
            "--role" => patch.role = Some(value.clone()),
            "--status" => patch.status = Some(parse_status_word(value)?),
            "--avatar" => patch.avatar = Some(avatar::data_uri_from_file(Path::new(value))?),
            other => return Err(anyhow!("Unknown option: {}", other)),
        }
    }

    if patch.is_empty() {
        println!("Nothing to change. Usage: /edit <id> [--name V] [--email V] [--role V] [--status S] [--avatar FILE]");
        return Ok(());
    }

    let matched = ctx.store.borrow_mut().update(id, &patch);
    let _ = ctx.journal.borrow_mut().user_updated(id, matched);
    if matched {
        println!("Updated user {}", id);
    } else {
        println!("No user with id {}", id);
    }
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let input = input.trim().to_lowercase();
        input == "y" || input == "yes"
    } else {
        false
    }
}

fn handle_remove(ctx: &Context, args: &[String]) -> Result<()> {
    let id = parse_number(args.first(), "user id")?;
    let forced = ctx.assume_yes || args.iter().any(|a| a == "--yes" || a == "-y");

    if ctx.store.borrow().get(id).is_none() {
        println!("No user with id {}", id);
        return Ok(());
    }

    if !forced {
        if !ctx.interactive {
            return Err(anyhow!("Refusing to delete user {} without --yes", id));
        }
        if !confirm("Are you sure you want to delete this user?") {
            println!("Cancelled");
            return Ok(());
        }
    }

    let removed = ctx.store.borrow_mut().remove(id);
    let page_count = page_count(ctx);
    ctx.pager.borrow_mut().clamp(page_count);
    let _ = ctx.journal.borrow_mut().user_removed(id, removed);
    println!("Deleted user {}", id);
    Ok(())
}

fn handle_export(ctx: &Context, args: &[String]) -> Result<()> {
    let dir = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.export_dir.clone());
    let store = ctx.store.borrow();
    if store.is_empty() {
        println!("No users loaded; the file will only contain the header");
    }
    let path = export::write_export(store.records(), &dir, &ctx.export_name)?;
    let _ = ctx.journal.borrow_mut().export(&path, store.len());
    println!("Exported {} users to {}", store.len(), path.display());
    Ok(())
}

fn handle_sort(ctx: &Context, args: &[String]) -> Result<()> {
    let Some(column) = args.first() else {
        match *ctx.sort.borrow() {
            Some(sort) => println!(
                "Sorted by {} ({})",
                sort.column.as_str(),
                if sort.order == SortOrder::Asc { "asc" } else { "desc" }
            ),
            None => println!("Not sorted"),
        }
        return Ok(());
    };

    if column == "off" || column == "none" {
        *ctx.sort.borrow_mut() = None;
        print_page(ctx);
        return Ok(());
    }

    let column = SortColumn::from_str(column)
        .ok_or_else(|| anyhow!("Unknown column '{}'. Use: name, status, role, last-login", column))?;
    let order = match args.get(1) {
        Some(word) => SortOrder::from_str(word)
            .ok_or_else(|| anyhow!("Invalid order '{}'. Use: asc, desc", word))?,
        None => SortOrder::Asc,
    };
    *ctx.sort.borrow_mut() = Some(Sort { column, order });
    print_page(ctx);
    Ok(())
}
