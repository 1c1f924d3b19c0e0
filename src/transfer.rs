//! transfer: превращение SyncStep в пару команд `zfs send | zfs recv`.
//!
//! Формат:
//!   [ssh <host>] [sudo] zfs send -p -P [-v] [-I <from>] <to>
//!   [ssh <host>] [sudo] zfs recv -F -u [-v] <destination>
//!
//! Сам запуск команд: внешний исполнитель (TransferExecutor). В крейте есть
//! только PrintExecutor: печатает по строке на шаг (режим "print only").

use std::io::Write;

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use crate::catalog::Host;
use crate::config::SnapConfig;
use crate::consts::{SSH_BIN, SUDO_BIN, ZFS_BIN};
use crate::plan::SyncStep;

/// Producer/consumer argument vectors for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferCommand {
    pub send: Vec<String>,
    pub recv: Vec<String>,
}

/// `[ssh host] [sudo] args...`
pub fn host_command(host: &Host, use_sudo: bool, args: &[&str]) -> Vec<String> {
    let mut cmd = Vec::with_capacity(args.len() + 3);
    if let Some(h) = host.ssh_target() {
        cmd.push(SSH_BIN.to_string());
        cmd.push(h.to_string());
    }
    if use_sudo {
        cmd.push(SUDO_BIN.to_string());
    }
    cmd.extend(args.iter().map(|a| a.to_string()));
    cmd
}

impl TransferCommand {
    pub fn render(step: &SyncStep, send_host: &Host, recv_host: &Host, cfg: &SnapConfig) -> Self {
        let mut send_args = vec![ZFS_BIN, "send", "-p", "-P"];
        if cfg.verbose_transfer {
            send_args.push("-v");
        }
        if let Some(from) = &step.from {
            send_args.push("-I");
            send_args.push(&from.name);
        }
        send_args.push(&step.to.name);

        let mut recv_args = vec![ZFS_BIN, "recv", "-F", "-u"];
        if cfg.verbose_transfer {
            recv_args.push("-v");
        }
        recv_args.push(&step.destination);

        Self {
            send: host_command(send_host, cfg.use_sudo, &send_args),
            recv: host_command(recv_host, cfg.use_sudo, &recv_args),
        }
    }

    /// `send | recv`, every argument shell-quoted.
    pub fn shell_line(&self) -> String {
        let q = |v: &[String]| v.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" ");
        format!("{} | {}", q(&self.send), q(&self.recv))
    }
}

/// POSIX shell quoting; safe words are left as is.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r#"'"'"'"#))
    }
}

/// Consumer of a plan. Implementations run, queue or print the commands.
pub trait TransferExecutor {
    fn execute(&mut self, step: &SyncStep, cmd: &TransferCommand) -> Result<()>;
}

/// Prints one shell line per step.
pub struct PrintExecutor<W: Write> {
    out: W,
    printed: usize,
}

impl<W: Write> PrintExecutor<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TransferExecutor for PrintExecutor<W> {
    fn execute(&mut self, _step: &SyncStep, cmd: &TransferCommand) -> Result<()> {
        writeln!(self.out, "{}", cmd.shell_line()).context("write transfer command")?;
        self.printed += 1;
        Ok(())
    }
}

/// Feed `steps` to `exec` in order; stops at the first failing step.
pub fn execute_plan<'s, E, I>(
    exec: &mut E,
    steps: I,
    send_host: &Host,
    recv_host: &Host,
    cfg: &SnapConfig,
) -> Result<usize>
where
    E: TransferExecutor + ?Sized,
    I: IntoIterator<Item = &'s SyncStep>,
{
    let mut n = 0usize;
    for step in steps {
        let cmd = TransferCommand::render(step, send_host, recv_host, cfg);
        debug!("transfer: {}", cmd.shell_line());
        exec.execute(step, &cmd)
            .with_context(|| format!("transfer step {}", step))?;
        n += 1;
    }
    Ok(n)
}
