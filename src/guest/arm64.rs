//! The ARM64 guest. Its records are the neutral ones apart from `stat`,
//! `epoll_event` and `semid64_ds`.

use std::sync::LazyLock;

use super::{
    GuestAbi, HandlerTable, fcntl, file_io, file_metadata, futex, handlers, ipc, mman, polling,
    process, sockets,
};
use crate::{
    abi::{self, arm64},
    syscall::GuestArch,
};

pub struct Arm64;

impl GuestAbi for Arm64 {
    const ARCH: GuestArch = GuestArch::Arm64;

    type Word = u64;

    type Timespec = abi::Timespec;
    type Timeval = abi::Timeval;
    type Itimerval = abi::Itimerval;
    type Itimerspec = abi::Itimerspec;
    type Tms = abi::Tms;
    type Rlimit = abi::Rlimit64;
    type Rusage = abi::Rusage;
    type Sysinfo = abi::Sysinfo;
    type Siginfo = abi::Siginfo;
    type Sigevent = abi::Sigevent;
    type EpollEvent = arm64::EpollEvent;
    type MqAttr = abi::MqAttr;
    type Timex = abi::Timex;
    type SemidDs = arm64::SemidDs;
    type MsqidDs = abi::MsqidDs;
    type ShmidDs = abi::ShmidDs;
    type Shminfo = abi::Shminfo;
    type ShmInfo = abi::ShmInfo;

    fn handlers() -> &'static HandlerTable<Self> {
        &HANDLERS
    }
}

static HANDLERS: LazyLock<HandlerTable<Arm64>> = LazyLock::new(|| {
    handlers![Arm64;
        Openat => fcntl::sys_openat,
        Openat2 => fcntl::sys_openat2,
        Fcntl => fcntl::sys_fcntl,
        Ioctl => fcntl::sys_ioctl,
        Prctl => fcntl::sys_prctl,

        Readv => file_io::sys_readv,
        Writev => file_io::sys_writev,
        Preadv => file_io::sys_preadv,
        Pwritev => file_io::sys_pwritev,
        Preadv2 => file_io::sys_preadv2,
        Pwritev2 => file_io::sys_pwritev2,
        Vmsplice => file_io::sys_vmsplice,
        OpenByHandleAt => file_io::sys_open_by_handle_at,

        Newfstatat => file_metadata::sys_newfstatat,
        Fstat => file_metadata::sys_newfstat,

        Futex => futex::sys_futex,
        FutexWaitv => futex::sys_futex_waitv,

        Semctl => ipc::sys_semctl,
        Shmat => ipc::sys_shmat,
        Shmdt => ipc::sys_shmdt,

        Mmap => mman::sys_mmap,
        Mremap => mman::sys_mremap,

        Pselect6 => polling::sys_pselect6,
        EpollCtl => polling::sys_epoll_ctl,
        EpollPwait => polling::sys_epoll_pwait,
        EpollPwait2 => polling::sys_epoll_pwait2,

        Execve => process::sys_execve,

        Sendmsg => sockets::sys_sendmsg,
        Recvmsg => sockets::sys_recvmsg,
        Sendmmsg => sockets::sys_sendmmsg,
        Recvmmsg => sockets::sys_recvmmsg,
    ]
});
