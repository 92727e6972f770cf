//! System V IPC and POSIX message queues.

use anyhow::Result;
use log::debug;

use super::{Adapter, GuestAbi, SyscallArgs, fcntl::open_flags_to_host};
use crate::{
    abi::{Record, Word},
    compound::ipc::{self, IpcPayload},
    errno::Errno,
    memory,
    syscall::Sysno,
};

/// `struct seminfo` and `struct msginfo`: plain ints on every ABI.
const SEMINFO: usize = 40;
const MSGINFO: usize = 32;
/// Width of `mtype` in a neutral `struct msgbuf`.
const NEUTRAL_MTYPE: usize = 8;

fn id<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> u64 {
    args.int(i) as i64 as u64
}

/// Issue a `*ctl` call whose control record converts through `T`.
fn control<A: GuestAbi, T: Record>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
    sysno: Sysno,
    head: [u64; 3],
    slot: usize,
    write: bool,
) -> Result<i64> {
    let mut rec = args.record::<T>(slot)?;
    if write {
        rec = rec.input()?;
    }
    let mut neutral = [0u64; 6];
    neutral[..3].copy_from_slice(&head);
    neutral[slot] = rec.neutral();
    let ret = cx.call(sysno, neutral)?;
    if ret >= 0 && !write {
        rec.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_semctl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let cmd = args.int(2);
    let payload = ipc::sem_payload(cmd)?;
    let head = [id(args, 0), id(args, 1), ipc::strip_version(cmd) as u64];
    let arg = match payload {
        IpcPayload::Nothing => 0,
        IpcPayload::Scalar => args.int(3) as i64 as u64,
        IpcPayload::ReadControl | IpcPayload::WriteControl => {
            return control::<A, A::SemidDs>(
                cx,
                args,
                Sysno::Semctl,
                head,
                3,
                payload == IpcPayload::WriteControl,
            );
        }
        IpcPayload::Limits | IpcPayload::Usage => args.ptr(3, SEMINFO)?,
        IpcPayload::Values => args.host_addr(3)?,
    };
    cx.call(Sysno::Semctl, [head[0], head[1], head[2], arg, 0, 0])
}

pub(super) fn sys_msgctl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let cmd = args.int(1);
    let payload = ipc::msg_payload(cmd)?;
    let head = [id(args, 0), ipc::strip_version(cmd) as u64, 0];
    let buf = match payload {
        IpcPayload::ReadControl | IpcPayload::WriteControl => {
            return control::<A, A::MsqidDs>(
                cx,
                args,
                Sysno::Msgctl,
                head,
                2,
                payload == IpcPayload::WriteControl,
            );
        }
        IpcPayload::Limits | IpcPayload::Usage => args.ptr(2, MSGINFO)?,
        _ => 0,
    };
    cx.call(Sysno::Msgctl, [head[0], head[1], buf, 0, 0, 0])
}

pub(super) fn sys_shmctl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let cmd = args.int(1);
    let payload = ipc::shm_payload(cmd)?;
    let head = [id(args, 0), ipc::strip_version(cmd) as u64, 0];
    match payload {
        IpcPayload::ReadControl | IpcPayload::WriteControl => control::<A, A::ShmidDs>(
            cx,
            args,
            Sysno::Shmctl,
            head,
            2,
            payload == IpcPayload::WriteControl,
        ),
        IpcPayload::Limits => control::<A, A::Shminfo>(cx, args, Sysno::Shmctl, head, 2, false),
        IpcPayload::Usage => control::<A, A::ShmInfo>(cx, args, Sysno::Shmctl, head, 2, false),
        _ => cx.call(Sysno::Shmctl, [head[0], head[1], 0, 0, 0, 0]),
    }
}

pub(super) fn sys_msgsnd<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let size = usize::try_from(args.ulong(2)).map_err(|_| Errno::EINVAL)?;
    let addr = args.guest_addr(1)?;
    let guest = memory::read_bytes(cx.mem(), addr, A::Word::BYTES + size).map_err(Errno::from)?;
    let mut msg = ipc::repack_msgbuf(&guest, A::Word::BYTES, NEUTRAL_MTYPE);
    cx.call(
        Sysno::Msgsnd,
        [
            id(args, 0),
            msg.as_mut_ptr() as usize as u64,
            size as u64,
            args.int(3) as i64 as u64,
            0,
            0,
        ],
    )
}

pub(super) fn sys_msgrcv<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let size = usize::try_from(args.ulong(2)).map_err(|_| Errno::EINVAL)?;
    let addr = args.guest_addr(1)?;
    memory::translate_range(cx.mem(), addr, A::Word::BYTES + size).map_err(Errno::from)?;
    let mut msg = vec![0u8; NEUTRAL_MTYPE + size];
    let ret = cx.call(
        Sysno::Msgrcv,
        [
            id(args, 0),
            msg.as_mut_ptr() as usize as u64,
            size as u64,
            args.long(3) as u64,
            args.int(4) as i64 as u64,
            0,
        ],
    )?;
    if ret >= 0 {
        let received = NEUTRAL_MTYPE + (ret as usize).min(size);
        let guest = ipc::repack_msgbuf(&msg[..received], NEUTRAL_MTYPE, A::Word::BYTES);
        memory::write_bytes(cx.mem(), addr, &guest).map_err(Errno::from)?;
    }
    Ok(ret)
}

pub(super) fn sys_semtimedop<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let nsops = args.uint(2) as usize;
    let sops = args.ptr(1, nsops * size_of::<libc::sembuf>())?;
    let mut timeout = args.record::<A::Timespec>(3)?.input()?;
    cx.call(
        Sysno::Semtimedop,
        [id(args, 0), sops, nsops as u64, timeout.neutral(), 0, 0],
    )
}

/// Attach a segment and hand its guest address back. A segment the guest
/// cannot address is detached again.
pub(super) fn sys_shmat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let want = args.host_addr(1)?;
    let ret = cx.call(Sysno::Shmat, [id(args, 0), want, args.int(2) as i64 as u64, 0, 0, 0])?;
    let host = match Errno::check(ret) {
        Ok(host) => host as u64 as usize,
        Err(_) => return Ok(ret),
    };
    let limit: u64 = A::Word::MAX.into();
    let guest = cx.mem().host_to_guest(host).filter(|&g| g <= limit);
    match guest {
        Some(guest) => Ok(guest as i64),
        None => {
            debug!("shmat segment at host {host:#x} is outside the guest address space");
            cx.call(Sysno::Shmdt, [host as u64, 0, 0, 0, 0, 0])?;
            Ok(Errno::ENOMEM.as_result())
        }
    }
}

pub(super) fn sys_shmdt<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let addr = args.host_addr(0)?;
    cx.call(Sysno::Shmdt, [addr, 0, 0, 0, 0, 0])
}

pub(super) fn sys_mq_open<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let name = args.string(0)?;
    let flags = open_flags_to_host(args.int(1));
    let mut attr = args.record::<A::MqAttr>(3)?.input()?;
    cx.call(
        Sysno::MqOpen,
        [name, flags as i64 as u64, args.uint(2) as u64, attr.neutral(), 0, 0],
    )
}

pub(super) fn sys_mq_timedsend<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let msg = args.buf(1, 2)?;
    let mut timeout = args.record::<A::Timespec>(4)?.input()?;
    cx.call(
        Sysno::MqTimedsend,
        [id(args, 0), msg, args.ulong(2), args.uint(3) as u64, timeout.neutral(), 0],
    )
}

pub(super) fn sys_mq_timedreceive<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    let msg = args.buf(1, 2)?;
    let prio = args.ptr(3, size_of::<u32>())?;
    let mut timeout = args.record::<A::Timespec>(4)?.input()?;
    cx.call(
        Sysno::MqTimedreceive,
        [id(args, 0), msg, args.ulong(2), prio, timeout.neutral(), 0],
    )
}

pub(super) fn sys_mq_notify<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut sev = args.record::<A::Sigevent>(1)?.input()?;
    cx.call(Sysno::MqNotify, [id(args, 0), sev.neutral(), 0, 0, 0, 0])
}

pub(super) fn sys_mq_getsetattr<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut new = args.record::<A::MqAttr>(1)?.input()?;
    let mut old = args.record::<A::MqAttr>(2)?;
    let ret = cx.call(
        Sysno::MqGetsetattr,
        [id(args, 0), new.neutral(), old.neutral(), 0, 0, 0],
    )?;
    if ret == 0 {
        old.write_back()?;
    }
    Ok(ret)
}
