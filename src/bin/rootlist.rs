// Copyright (c) 2026-present, the rootlist-kv authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI tool for extracting a rootlist from a cache directory.

use clap::{ArgAction, Parser};
use rootlist_kv::{decode_rootlist, default_cache_path, extract_rootlist, list_users, Platform};
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};

macro_rules! die {
    ($fmt:literal, $($arg:tt)*) => {{
        eprintln!($fmt, $($arg)*);
        std::process::exit(1);
    }};
    ($msg:literal) => {{
        eprintln!($msg);
        std::process::exit(1);
    }};
}

#[allow(unused_imports)]
use tracing::{debug, info, warn};

/// Extracts and prints a desktop music client's rootlist as JSON.
#[derive(Parser, Debug)]
#[command(name = "rootlist")]
#[command(about = "Extracts a rootlist from a cached key-value store")]
struct Args {
    /// A folder URI, or any string ending in one, to filter the tree to.
    folder: Option<String>,

    /// Which discovered user to target (1-indexed, newest cache first).
    #[arg(short, long, default_value_t = 1)]
    account: usize,

    /// Override the cache root (bypasses platform default / user discovery).
    #[arg(long, value_name = "PATH")]
    cache: Option<PathBuf>,

    /// Print a discoverability summary instead of the tree.
    #[arg(short, long)]
    info: bool,

    /// Suppress all output except for errors. Overrides -v.
    #[arg(short, long)]
    quiet: bool,

    /// Turn on verbose output. Supply multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(quiet: bool, verbose: u8) -> LevelFilter {
    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_log::LogTracer::init().expect("failed to set log tracer");

    let registry = Registry::default();
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("ROOTLIST_LOG")
        .from_env_lossy();

    let subscriber = registry.with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        die!("INTERNAL ERROR: setting default tracing subscriber failed");
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info);
    }));

    level_filter
}

/// Pulls the trailing path/URI segment out of a `--folder` argument, so
/// both a bare id and a full `spotify:user:...:folder:<id>` URI work.
fn folder_id_from_arg(arg: &str) -> &str {
    arg.rsplit([':', '/']).next().unwrap_or(arg)
}

fn main() {
    let args = Args::parse();
    let level_filter = init_tracing(args.quiet, args.verbose);

    info!(
        "starting {} {}, log level: {level_filter}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let cache_dir = match &args.cache {
        Some(path) => path.clone(),
        None => match default_cache_path(Platform::current()) {
            Some(path) => path,
            None => die!("no default cache path known for this platform; pass --cache"),
        },
    };

    if args.info {
        let users = list_users(&cache_dir);
        println!("{} discoverable user cache director{}", users.len(), if users.len() == 1 { "y" } else { "ies" });
        return;
    }

    let users = list_users(&cache_dir);
    let user_hint = if args.cache.is_some() && users.is_empty() {
        // Flat layout: let the locator infer the user from file paths.
        None
    } else {
        match users.get(args.account.saturating_sub(1)) {
            Some(user) => Some(user.clone()),
            None => die!(
                "no discovered user at account index {} (found {} user{})",
                args.account,
                users.len(),
                if users.len() == 1 { "" } else { "s" }
            ),
        }
    };

    let (resolved_user, raw_value) = match extract_rootlist(&cache_dir, user_hint.as_deref()) {
        Ok(result) => result,
        Err(e) => die!("failed to read cache at {cache_dir:?}: {e}"),
    };

    let (resolved_user, raw_value) = match (resolved_user, raw_value) {
        (Some(user), Some(value)) => (user, value),
        _ => die!("no rootlist found in {cache_dir:?}"),
    };

    debug!("resolved user: {resolved_user}");

    let tree = decode_rootlist(&raw_value, &resolved_user);

    let tree = match &args.folder {
        Some(arg) => {
            let id = folder_id_from_arg(arg);
            match tree.find_folder(id) {
                Some(found) => found.clone(),
                None => die!("no folder matching {id:?} in the rootlist"),
            }
        }
        None => tree,
    };

    match serde_json::to_string_pretty(&tree) {
        Ok(json) => println!("{json}"),
        Err(e) => die!("failed to render rootlist as JSON: {e}"),
    }
}
