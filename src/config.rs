//! Centralized configuration and builder for SnapLine.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - SnapConfig::from_env() reads the SNAP_* variables; fluent setters override.
//!
//! Tunables:
//! - use_sudo (ENV SNAP_SUDO): prefix zfs commands with sudo.
//! - verbose_transfer (ENV SNAP_VERBOSE): pass -v to zfs send/recv.
//! - stream_prefix (ENV SNAP_STREAM_PREFIX): label prefix of streamline snapshots.
//! - dest_mode (ENV SNAP_DEST_POLICY = mirror|follow): destination naming when
//!   no relocation path is given.
//! - clone_base (ENV SNAP_CLONE_BASE = last|origin): incremental base of a
//!   clone's first snapshot.

use std::fmt;

use log::warn;

use crate::consts::DEFAULT_STREAM_PREFIX;
use crate::plan::{CloneBase, DestinationMode, DestinationPolicy};

/// Top-level configuration for catalog building, planning and rendering.
#[derive(Clone, Debug)]
pub struct SnapConfig {
    /// Run zfs through sudo (local and remote).
    /// Env: SNAP_SUDO (default false; "1|true|on|yes" => true)
    pub use_sudo: bool,

    /// Add -v to zfs send / zfs recv.
    /// Env: SNAP_VERBOSE (default false)
    pub verbose_transfer: bool,

    /// Snapshot label prefix for streamlines (`<prefix>:<stream>:<version>`).
    /// Env: SNAP_STREAM_PREFIX (default "zfs-vm")
    pub stream_prefix: String,

    /// Destination naming when no relocation path is requested.
    /// Env: SNAP_DEST_POLICY = mirror|follow (default follow)
    pub dest_mode: DestinationMode,

    /// Base of a clone's first snapshot: parent's last or the origin snapshot.
    /// Env: SNAP_CLONE_BASE = last|origin (default last)
    pub clone_base: CloneBase,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            use_sudo: false,
            verbose_transfer: false,
            stream_prefix: DEFAULT_STREAM_PREFIX.to_string(),
            dest_mode: DestinationMode::FollowReceiver,
            clone_base: CloneBase::ParentLast,
        }
    }
}

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl SnapConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SNAP_SUDO") {
            cfg.use_sudo = env_flag(&v);
        }

        if let Ok(v) = std::env::var("SNAP_VERBOSE") {
            cfg.verbose_transfer = env_flag(&v);
        }

        if let Ok(v) = std::env::var("SNAP_STREAM_PREFIX") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.stream_prefix = s.to_string();
            }
        }

        if let Ok(v) = std::env::var("SNAP_DEST_POLICY") {
            match v.parse::<DestinationMode>() {
                Ok(mode) => cfg.dest_mode = mode,
                Err(e) => warn!("SNAP_DEST_POLICY ignored: {e}"),
            }
        }

        if let Ok(v) = std::env::var("SNAP_CLONE_BASE") {
            match v.parse::<CloneBase>() {
                Ok(base) => cfg.clone_base = base,
                Err(e) => warn!("SNAP_CLONE_BASE ignored: {e}"),
            }
        }

        cfg
    }

    pub fn with_sudo(mut self, on: bool) -> Self {
        self.use_sudo = on;
        self
    }

    pub fn with_verbose_transfer(mut self, on: bool) -> Self {
        self.verbose_transfer = on;
        self
    }

    pub fn with_stream_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.stream_prefix = prefix.into();
        self
    }

    pub fn with_dest_mode(mut self, mode: DestinationMode) -> Self {
        self.dest_mode = mode;
        self
    }

    pub fn with_clone_base(mut self, base: CloneBase) -> Self {
        self.clone_base = base;
        self
    }

    /// Policy for one run: an explicit relocation path wins over `dest_mode`.
    pub fn destination_policy(&self, relocate: Option<&str>) -> DestinationPolicy {
        match relocate {
            Some(p) => DestinationPolicy::Relocate(p.trim_end_matches('/').to_string()),
            None => match self.dest_mode {
                DestinationMode::Mirror => DestinationPolicy::Mirror,
                DestinationMode::FollowReceiver => DestinationPolicy::FollowReceiver,
            },
        }
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for SnapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SnapConfig {{ \
             use_sudo: {}, \
             verbose_transfer: {}, \
             stream_prefix: {}, \
             dest_mode: {}, \
             clone_base: {} \
             }}",
            self.use_sudo,
            self.verbose_transfer,
            self.stream_prefix,
            self.dest_mode,
            self.clone_base,
        )
    }
}
