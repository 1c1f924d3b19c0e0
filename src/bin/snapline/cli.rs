use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI для SnapLine: каталог снапшотов и план репликации.
///
/// Каталоги читаются из дампов
///   zfs get -H -p -o name,property,value -t filesystem origin,mountpoint
///   zfs get -H -p -o name,property,value -t snapshot guid,createtxg
/// (обе выборки в одном файле, "-": stdin).
#[derive(Parser, Debug)]
#[command(name = "snapline", version, about = "ZFS snapshot catalog and replication planner")]
pub struct Cli {
    /// Use sudo when running zfs (ENV SNAP_SUDO)
    #[arg(short = 's', long, global = true, default_value_t = false)]
    pub sudo: bool,
    /// Verbose zfs send/recv (-v) (ENV SNAP_VERBOSE)
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List datasets with their snapshots
    ///
    /// Пример:
    ///   snapline list --catalog ./local.tsv --name pool/vm/Root3 --parents
    List {
        #[arg(long)]
        catalog: PathBuf,
        /// Only this dataset
        #[arg(long)]
        name: Option<String>,
        /// Include origin (parent) datasets
        #[arg(long, default_value_t = false)]
        parents: bool,
        /// Show createtxg and guid of every snapshot
        #[arg(long, default_value_t = false)]
        details: bool,
        /// JSON output
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List streamlines as <name>:<version>
    Streams {
        #[arg(long)]
        catalog: PathBuf,
        /// Only this streamline
        #[arg(long)]
        name: Option<String>,
        /// Show backing dataset of every version
        #[arg(long, default_value_t = false)]
        details: bool,
        /// JSON output
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Push local snapshots to a remote host (prints send/recv commands)
    ///
    /// Пример:
    ///   snapline push --local ./local.tsv --remote ./backup.tsv --host root@backup -d backup/vm
    Push(SyncArgs),
    /// Pull remote snapshots to the local host (prints send/recv commands)
    Pull(SyncArgs),
    /// Find the datasets behind a container private path
    ///
    /// Пример:
    ///   snapline mount --catalog ./local.tsv --path /vz/private/101
    Mount {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        path: String,
        /// JSON output
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Catalog dump of the local host
    #[arg(long)]
    pub local: PathBuf,
    /// Catalog dump of the remote host
    #[arg(long)]
    pub remote: PathBuf,
    /// Remote host ([user@]host, or "local")
    #[arg(long)]
    pub host: String,
    /// Only this dataset (its origins are planned first)
    #[arg(short = 'n', long)]
    pub name: Option<String>,
    /// Plan a streamline instead of datasets
    #[arg(long, conflicts_with = "name")]
    pub stream: Option<String>,
    /// Receive everything under this dataset: <path>/<basename>
    #[arg(short = 'd', long)]
    pub relocate: Option<String>,
    /// Destination naming without -d: mirror | follow (ENV SNAP_DEST_POLICY)
    #[arg(long)]
    pub dest_policy: Option<String>,
    /// Base of a clone's first snapshot: last | origin (ENV SNAP_CLONE_BASE)
    #[arg(long)]
    pub clone_base: Option<String>,
    /// Print the plan as JSON instead of commands
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Cli as Parser>::parse()
    }
}
