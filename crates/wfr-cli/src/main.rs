use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wfr_core::{format_scheduler_date, format_wire_time, EntityKind, JobId};
use wfr_reconcile::{Config, Session, SnapshotReconciler, TransitionExpectation};

#[derive(Parser)]
#[command(name = "wfr", version)]
struct Cli {
    /// Config file (default: ~/.wfr/wfr.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if none exists
    Init,

    /// List the bundles of a pipeline, newest first
    Bundles {
        name: String,
        #[arg(long, default_value = "process")]
        kind: EntityKind,
    },

    /// Show the default coordinator of a bundle
    Coordinator {
        bundle: String,
        #[arg(long, default_value = "process")]
        kind: EntityKind,
    },

    /// Print nominal time -> status of a bundle's default coordinator
    Snapshot {
        bundle: String,
        #[arg(long, default_value = "process")]
        kind: EntityKind,
    },

    /// Wait until a bundle has coordinators
    WaitCoordinators { bundle: String },

    /// Print (and optionally create) the input paths a bundle is waiting on
    MissingDeps {
        bundle: String,
        /// Only this action index of each coordinator
        #[arg(long)]
        instance: Option<usize>,
        #[arg(long)]
        materialize: bool,
    },

    /// Check that moving from OLD to NEW kept the scheduled instances
    Verify {
        old: String,
        new: String,
        #[arg(long, default_value = "process")]
        kind: EntityKind,
        /// Bundle whose instances must survive (default: OLD)
        #[arg(long)]
        prior_from: Option<String>,
        /// NEW is expected to be the same bundle as OLD
        #[arg(long)]
        same_bundle: bool,
        /// Every prior instance must appear under OLD or NEW
        #[arg(long)]
        match_instances: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let cfg_path = match cli.config {
        Some(p) => p,
        None => Config::default_path()?,
    };

    if let Command::Init = cli.cmd {
        if Session::init_config(&cfg_path)? {
            println!("Wrote {}", cfg_path.display());
        } else {
            println!("{} already exists", cfg_path.display());
        }
        return Ok(());
    }

    let session = Session::open(&cfg_path).with_context(|| format!("open session from {}", cfg_path.display()))?;
    let walker = session.walker();

    match cli.cmd {
        Command::Init => {}
        Command::Bundles { name, kind } => {
            let ids = walker.bundle_ids(&name, kind)?;
            println!("{} bundle(s) for {}", ids.len(), walker.filter_for(&name, kind));
            for id in ids {
                println!("- {id}");
            }
        }
        Command::Coordinator { bundle, kind } => {
            match walker.default_coordinator(&JobId::from_str(bundle), kind)? {
                Some(c) => {
                    println!("{} [{}] {}", c.id, c.status, c.app_name);
                    if let Some(start) = c.start_time {
                        println!("start: {}", format_scheduler_date(start));
                    }
                    println!("actions: {}", c.actions.len());
                }
                None => println!("no default coordinator"),
            }
        }
        Command::Snapshot { bundle, kind } => {
            let snapshot = SnapshotReconciler::new(&walker).snapshot_nominal_times(&JobId::from_str(bundle), kind)?;
            for (t, status) in snapshot.iter() {
                println!("{}  {}", format_wire_time(*t), status);
            }
        }
        Command::WaitCoordinators { bundle } => {
            let b = walker.wait_for_coordinator_creation(&JobId::from_str(bundle))?;
            println!("{} [{}]", b.id, b.status);
            for c in b.coordinators {
                println!("- {} [{}] {}", c.id, c.status, c.app_name);
            }
        }
        Command::MissingDeps { bundle, instance, materialize } => {
            let resolver = session.resolver(&walker);
            let bundle = JobId::from_str(bundle);
            let paths = match instance {
                Some(i) => resolver.missing_dependencies_for_instance(&bundle, i)?,
                None => resolver.missing_dependencies_for_bundle(&bundle)?,
            };
            for p in &paths {
                println!("{p}");
            }
            if materialize {
                resolver.materialize(&paths)?;
                println!("created {} path(s) under {}", paths.len(), session.cfg.provisioning.root);
            }
        }
        Command::Verify { old, new, kind, prior_from, same_bundle, match_instances } => {
            let reconciler = SnapshotReconciler::new(&walker);
            let old = JobId::from_str(old);
            let new = JobId::from_str(new);
            let prior_bundle = prior_from.map(JobId::from_str).unwrap_or_else(|| old.clone());
            let prior = reconciler.snapshot_nominal_times(&prior_bundle, kind)?.nominal_times();
            let expect = TransitionExpectation::new(!same_bundle, match_instances);
            reconciler.verify_bundle_transition(kind, &old, &new, &prior, expect)?;
            println!("OK: {} prior instance(s) checked", prior.len());
        }
    }

    Ok(())
}
