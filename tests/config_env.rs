// tests/config_env.rs
//
// SnapConfig::from_env + fluent-переопределения. Один тест на бинарь:
// переменные окружения общие для процесса.
//
// Запуск:
//   cargo test --test config_env -- --nocapture

use anyhow::Result;

use SnapLine::{CloneBase, DestinationMode, DestinationPolicy, SnapConfig};

#[test]
fn env_then_builder_overrides() -> Result<()> {
    std::env::set_var("SNAP_SUDO", "yes");
    std::env::set_var("SNAP_VERBOSE", "0");
    std::env::set_var("SNAP_STREAM_PREFIX", "  vmsnap ");
    std::env::set_var("SNAP_DEST_POLICY", "mirror");
    std::env::set_var("SNAP_CLONE_BASE", " Origin ");

    let cfg = SnapConfig::from_env();
    assert!(cfg.use_sudo);
    assert!(!cfg.verbose_transfer);
    assert_eq!(cfg.stream_prefix, "vmsnap");
    assert_eq!(cfg.dest_mode, DestinationMode::Mirror);
    assert_eq!(cfg.destination_policy(None), DestinationPolicy::Mirror);
    assert_eq!(cfg.clone_base, CloneBase::Origin);

    // Неизвестная политика игнорируется (остаётся дефолт).
    std::env::set_var("SNAP_DEST_POLICY", "sideways");
    std::env::set_var("SNAP_CLONE_BASE", "newest");
    std::env::remove_var("SNAP_STREAM_PREFIX");
    let cfg = SnapConfig::from_env();
    assert_eq!(cfg.dest_mode, DestinationMode::FollowReceiver);
    assert_eq!(cfg.stream_prefix, "zfs-vm");
    assert_eq!(cfg.clone_base, CloneBase::ParentLast);

    let cfg = cfg
        .with_sudo(false)
        .with_verbose_transfer(true)
        .with_stream_prefix("custom")
        .with_dest_mode(DestinationMode::Mirror)
        .with_clone_base(CloneBase::Origin)
        .build();
    assert!(!cfg.use_sudo);
    assert!(cfg.verbose_transfer);
    assert_eq!(
        cfg.destination_policy(Some("backup/vm//")),
        DestinationPolicy::Relocate("backup/vm".into())
    );

    let shown = cfg.to_string();
    assert!(shown.contains("stream_prefix: custom"), "{shown}");
    assert!(shown.contains("dest_mode: mirror"), "{shown}");
    assert!(shown.contains("clone_base: origin"), "{shown}");

    for k in ["SNAP_SUDO", "SNAP_VERBOSE", "SNAP_DEST_POLICY", "SNAP_CLONE_BASE"] {
        std::env::remove_var(k);
    }
    Ok(())
}
