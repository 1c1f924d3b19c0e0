use anyhow::{anyhow, Result};
use log::{error, info};
use serde::Serialize;

use SnapLine::metrics;
use SnapLine::{
    execute_plan, CloneBase, DestinationMode, Host, Planner, PlanOutcome, PrintExecutor, SnapConfig,
    SyncStep,
};

use crate::cli::SyncArgs;
use crate::util::{load_catalog, print_json};

#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Push,
    Pull,
}

/// Push/pull: построить оба каталога, спланировать и напечатать команды.
///
/// Ничего не выполняется: вывод можно просмотреть и отдать в sh.
pub fn exec(dir: Direction, args: SyncArgs, cfg: &SnapConfig) -> Result<()> {
    let remote_host = Host::parse(&args.host);
    let local = load_catalog(&args.local, Host::Local)?.catalog;
    let remote = load_catalog(&args.remote, remote_host)?.catalog;

    let (source, dest) = match dir {
        Direction::Push => (&local, &remote),
        Direction::Pull => (&remote, &local),
    };

    let mut cfg = cfg.clone();
    if let Some(p) = args.dest_policy.as_deref() {
        let mode: DestinationMode = p.parse().map_err(|e: String| anyhow!(e))?;
        cfg = cfg.with_dest_mode(mode);
    }
    if let Some(b) = args.clone_base.as_deref() {
        let base: CloneBase = b.parse().map_err(|e: String| anyhow!(e))?;
        cfg = cfg.with_clone_base(base);
    }
    if source.host().is_local() && dest.host().is_local() {
        info!("{:?}: both catalogs are local, commands run without ssh", dir);
    }

    let policy = cfg.destination_policy(args.relocate.as_deref());
    let mut planner = Planner::new(source, dest, policy)
        .with_stream_prefix(cfg.stream_prefix.clone())
        .with_clone_base(cfg.clone_base);
    info!(
        "{:?}: {} -> {}, policy {:?}, clone base {}",
        dir,
        source.host(),
        dest.host(),
        planner.policy(),
        cfg.clone_base
    );

    let mut failures = 0usize;
    let steps: Vec<SyncStep> = if let Some(stream) = args.stream.as_deref() {
        let outcome = planner
            .plan_stream(stream)
            .map_err(|e| anyhow!("streamline {}: {}", stream, e))?;
        if args.json {
            return print_json(&StreamReport {
                stream,
                outcome: &outcome,
            });
        }
        outcome.into_steps()
    } else {
        let batch = planner.plan_all(args.name.as_deref());
        if args.json {
            return print_json(&batch);
        }
        for (name, e) in batch.failures() {
            error!("{}: {}", name, e);
            failures += 1;
        }
        batch.steps().cloned().collect()
    };

    if steps.is_empty() && failures == 0 {
        println!("# up to date");
    }

    let stdout = std::io::stdout();
    let mut printer = PrintExecutor::new(stdout.lock());
    execute_plan(&mut printer, &steps, source.host(), dest.host(), &cfg)?;

    let m = metrics::snapshot();
    info!(
        "planned {} step(s) ({} full, {} incremental), {} up to date",
        m.steps_total(),
        m.steps_full,
        m.steps_incremental,
        m.plans_up_to_date
    );
    info!(
        "catalog records: {} ingested, {} skipped ({:.1}%)",
        m.records_ingested,
        m.records_skipped,
        m.skip_ratio() * 100.0
    );

    if failures > 0 {
        return Err(anyhow!("{} dataset(s) could not be planned", failures));
    }
    Ok(())
}

#[derive(Serialize)]
struct StreamReport<'a> {
    stream: &'a str,
    outcome: &'a PlanOutcome,
}
