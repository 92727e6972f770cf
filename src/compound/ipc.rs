//! SysV IPC control commands and message buffers.
//!
//! The shape of the fourth `semctl` argument and of the `msgctl`/`shmctl`
//! buffer depends on the command. Every command the kernel knows is decoded
//! here; anything else is a fatal error rather than a guess.

use anyhow::{Result, bail};

/// Request the 64-bit (`ipc64_*`) control block layouts.
pub const IPC_64: i32 = 0x100;

pub const IPC_RMID: i32 = 0;
pub const IPC_SET: i32 = 1;
pub const IPC_STAT: i32 = 2;
pub const IPC_INFO: i32 = 3;

pub const GETPID: i32 = 11;
pub const GETVAL: i32 = 12;
pub const GETALL: i32 = 13;
pub const GETNCNT: i32 = 14;
pub const GETZCNT: i32 = 15;
pub const SETVAL: i32 = 16;
pub const SETALL: i32 = 17;
pub const SEM_STAT: i32 = 18;
pub const SEM_INFO: i32 = 19;
pub const SEM_STAT_ANY: i32 = 20;

pub const MSG_STAT: i32 = 11;
pub const MSG_INFO: i32 = 12;
pub const MSG_STAT_ANY: i32 = 13;

pub const SHM_LOCK: i32 = 11;
pub const SHM_UNLOCK: i32 = 12;
pub const SHM_STAT: i32 = 13;
pub const SHM_INFO: i32 = 14;
pub const SHM_STAT_ANY: i32 = 15;

/// Drop the `IPC_64` version bit from a command.
pub fn strip_version(cmd: i32) -> i32 {
    cmd & !IPC_64
}

/// What the command-dependent argument holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcPayload {
    /// Unused.
    Nothing,
    /// An integer passed by value (`SETVAL`).
    Scalar,
    /// A `*id_ds` the kernel fills in.
    ReadControl,
    /// A `*id_ds` the kernel reads.
    WriteControl,
    /// The `IPC_INFO` limits record.
    Limits,
    /// The `*_INFO` usage record.
    Usage,
    /// An array of `unsigned short` semaphore values.
    Values,
}

pub fn sem_payload(cmd: i32) -> Result<IpcPayload> {
    Ok(match strip_version(cmd) {
        IPC_RMID | GETPID | GETVAL | GETNCNT | GETZCNT => IpcPayload::Nothing,
        IPC_SET => IpcPayload::WriteControl,
        IPC_STAT | SEM_STAT | SEM_STAT_ANY => IpcPayload::ReadControl,
        IPC_INFO => IpcPayload::Limits,
        SEM_INFO => IpcPayload::Usage,
        GETALL | SETALL => IpcPayload::Values,
        SETVAL => IpcPayload::Scalar,
        other => bail!("unknown semctl command {other}"),
    })
}

pub fn msg_payload(cmd: i32) -> Result<IpcPayload> {
    Ok(match strip_version(cmd) {
        IPC_RMID => IpcPayload::Nothing,
        IPC_SET => IpcPayload::WriteControl,
        IPC_STAT | MSG_STAT | MSG_STAT_ANY => IpcPayload::ReadControl,
        IPC_INFO => IpcPayload::Limits,
        MSG_INFO => IpcPayload::Usage,
        other => bail!("unknown msgctl command {other}"),
    })
}

pub fn shm_payload(cmd: i32) -> Result<IpcPayload> {
    Ok(match strip_version(cmd) {
        IPC_RMID | SHM_LOCK | SHM_UNLOCK => IpcPayload::Nothing,
        IPC_SET => IpcPayload::WriteControl,
        IPC_STAT | SHM_STAT | SHM_STAT_ANY => IpcPayload::ReadControl,
        IPC_INFO => IpcPayload::Limits,
        SHM_INFO => IpcPayload::Usage,
        other => bail!("unknown shmctl command {other}"),
    })
}

/// Re-encode a `struct msgbuf` whose `mtype` is `from` bytes wide into one
/// whose `mtype` is `to` bytes wide. The text is copied unchanged.
pub fn repack_msgbuf(buf: &[u8], from: usize, to: usize) -> Vec<u8> {
    let mtype = read_long(buf, from);
    let mut out = Vec::with_capacity(to + buf.len().saturating_sub(from));
    match to {
        4 => out.extend_from_slice(&(mtype as i32).to_le_bytes()),
        _ => out.extend_from_slice(&mtype.to_le_bytes()),
    }
    out.extend_from_slice(buf.get(from..).unwrap_or_default());
    out
}

fn read_long(buf: &[u8], width: usize) -> i64 {
    match width {
        4 => buf
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .map(i32::from_le_bytes)
            .unwrap_or_default() as i64,
        _ => buf
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .map(i64::from_le_bytes)
            .unwrap_or_default(),
    }
}
