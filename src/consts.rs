//! Общие константы (имена свойств, разделители, команды zfs).

// -------- Names --------
/// `pool/fs@label`
pub const SNAPSHOT_SEP: char = '@';
/// `pool/parent/child`
pub const DATASET_SEP: char = '/';
/// `[prefix:]stream:version` inside a snapshot label
pub const STREAM_SEP: char = ':';

/// Value printed by `zfs get` for an unset property.
pub const ABSENT_VALUE: &str = "-";

// -------- Dataset properties --------
pub const PROP_ORIGIN: &str = "origin";
pub const PROP_MOUNTPOINT: &str = "mountpoint";

// -------- Snapshot properties --------
pub const PROP_GUID: &str = "guid";
pub const PROP_CREATETXG: &str = "createtxg";
// Алиас из нейтральной модели данных.
pub const PROP_CREATION_ORDER: &str = "creation_order";

// -------- Streamlines --------
pub const DEFAULT_STREAM_PREFIX: &str = "zfs-vm";

// -------- Host --------
/// Host label for the local machine on the command line.
pub const LOCAL_HOST: &str = "local";

// -------- Commands --------
pub const ZFS_BIN: &str = "zfs";
pub const SSH_BIN: &str = "ssh";
pub const SUDO_BIN: &str = "sudo";
