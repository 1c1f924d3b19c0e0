use anyhow::Result;
use env_logger::{Builder, Env};
use log::debug;

use SnapLine::SnapConfig;

mod cli;
mod util;
mod cmd_list;
mod cmd_streams;
mod cmd_sync;
mod cmd_mount;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт: info.
    // Пример: RUST_LOG=debug snapline push ...
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();

    let mut cfg = SnapConfig::from_env();
    if cli.sudo {
        cfg = cfg.with_sudo(true);
    }
    if cli.verbose {
        cfg = cfg.with_verbose_transfer(true);
    }
    debug!("{cfg}");

    match cli.cmd {
        cli::Cmd::List { catalog, name, parents, details, json } =>
            cmd_list::exec(catalog, name, parents, details, json),

        cli::Cmd::Streams { catalog, name, details, json } =>
            cmd_streams::exec(catalog, name, details, json, &cfg),

        cli::Cmd::Push(args) =>
            cmd_sync::exec(cmd_sync::Direction::Push, args, &cfg),

        cli::Cmd::Pull(args) =>
            cmd_sync::exec(cmd_sync::Direction::Pull, args, &cfg),

        cli::Cmd::Mount { catalog, path, json } =>
            cmd_mount::exec(catalog, path, json),
    }
}
