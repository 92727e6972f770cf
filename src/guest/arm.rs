//! The 32-bit ARM EABI guest.

use std::sync::LazyLock;

use super::{
    GuestAbi, HandlerTable, fcntl, file_io, file_metadata, futex, handlers, ipc, mman, polling,
    process, resource, sockets, time, uid16,
};
use crate::{
    abi::{arm, ilp32},
    syscall::GuestArch,
};

pub struct Arm;

impl GuestAbi for Arm {
    const ARCH: GuestArch = GuestArch::Arm;

    type Word = u32;

    type Timespec = ilp32::Timespec;
    type Timeval = ilp32::Timeval;
    type Itimerval = ilp32::Itimerval;
    type Itimerspec = ilp32::Itimerspec;
    type Tms = ilp32::Tms;
    type Rlimit = ilp32::Rlimit;
    type Rusage = ilp32::Rusage;
    type Sysinfo = ilp32::Sysinfo;
    type Siginfo = ilp32::Siginfo;
    type Sigevent = ilp32::Sigevent;
    type EpollEvent = arm::EpollEvent;
    type MqAttr = ilp32::MqAttr;
    type Timex = ilp32::Timex;
    type SemidDs = ilp32::SemidDs;
    type MsqidDs = ilp32::MsqidDs;
    type ShmidDs = ilp32::ShmidDs;
    type Shminfo = ilp32::Shminfo;
    type ShmInfo = ilp32::ShmInfo;

    fn handlers() -> &'static HandlerTable<Self> {
        &HANDLERS
    }
}

static HANDLERS: LazyLock<HandlerTable<Arm>> = LazyLock::new(|| {
    handlers![Arm;
        // open/fcntl/ioctl
        Open => fcntl::sys_open,
        Openat => fcntl::sys_openat,
        Openat2 => fcntl::sys_openat2,
        Fcntl => fcntl::sys_fcntl,
        Fcntl64 => fcntl::sys_fcntl64,
        Ioctl => fcntl::sys_ioctl,
        Prctl => fcntl::sys_prctl,

        // reads, writes and seeks
        Readv => file_io::sys_readv,
        Writev => file_io::sys_writev,
        Preadv => file_io::sys_preadv,
        Pwritev => file_io::sys_pwritev,
        Preadv2 => file_io::sys_preadv2,
        Pwritev2 => file_io::sys_pwritev2,
        Vmsplice => file_io::sys_vmsplice,
        OpenByHandleAt => file_io::sys_open_by_handle_at,
        Pread64 => file_io::sys_pread64,
        Pwrite64 => file_io::sys_pwrite64,
        Truncate64 => file_io::sys_truncate64,
        Ftruncate64 => file_io::sys_ftruncate64,
        Readahead => file_io::sys_readahead,
        ArmFadvise64_64 => file_io::sys_arm_fadvise64_64,
        SyncFileRange2 => file_io::sys_sync_file_range2,
        Fallocate => file_io::sys_fallocate,
        FanotifyMark => file_io::sys_fanotify_mark,
        Lseek => file_io::sys_lseek,
        Llseek => file_io::sys_llseek,
        Sendfile => file_io::sys_sendfile,
        Getdents => file_io::sys_getdents,

        Stat => file_metadata::sys_stat,
        Lstat => file_metadata::sys_lstat,
        Fstat => file_metadata::sys_fstat,
        Stat64 => file_metadata::sys_stat64,
        Lstat64 => file_metadata::sys_lstat64,
        Fstat64 => file_metadata::sys_fstat64,
        Fstatat64 => file_metadata::sys_fstatat64,
        Statfs => file_metadata::sys_statfs,
        Fstatfs => file_metadata::sys_fstatfs,
        Statfs64 => file_metadata::sys_statfs64,
        Fstatfs64 => file_metadata::sys_fstatfs64,
        Utimes => file_metadata::sys_utimes,
        Futimesat => file_metadata::sys_futimesat,
        Utimensat => file_metadata::sys_utimensat,

        Futex => futex::sys_futex,
        FutexTime64 => futex::sys_futex_time64,
        FutexWaitv => futex::sys_futex_waitv,

        Semctl => ipc::sys_semctl,
        Msgctl => ipc::sys_msgctl,
        Shmctl => ipc::sys_shmctl,
        Msgsnd => ipc::sys_msgsnd,
        Msgrcv => ipc::sys_msgrcv,
        Semtimedop => ipc::sys_semtimedop,
        Shmat => ipc::sys_shmat,
        Shmdt => ipc::sys_shmdt,
        MqOpen => ipc::sys_mq_open,
        MqTimedsend => ipc::sys_mq_timedsend,
        MqTimedreceive => ipc::sys_mq_timedreceive,
        MqNotify => ipc::sys_mq_notify,
        MqGetsetattr => ipc::sys_mq_getsetattr,

        Mmap2 => mman::sys_mmap2,
        Mremap => mman::sys_mremap,

        Select => polling::sys_select,
        Pselect6 => polling::sys_pselect6,
        Pselect6Time64 => polling::sys_pselect6_time64,
        Ppoll => polling::sys_ppoll,
        EpollCtl => polling::sys_epoll_ctl,
        EpollWait => polling::sys_epoll_wait,
        EpollPwait => polling::sys_epoll_pwait,
        EpollPwait2 => polling::sys_epoll_pwait2,

        Execve => process::sys_execve,
        Vfork => process::sys_vfork,
        ArmCacheflush => process::sys_cacheflush,

        Getrlimit => resource::sys_getrlimit,
        Setrlimit => resource::sys_setrlimit,
        Getrusage => resource::sys_getrusage,
        Sysinfo => resource::sys_sysinfo,
        Nice => resource::sys_nice,
        Wait4 => resource::sys_wait4,
        Waitid => resource::sys_waitid,
        PidfdSendSignal => resource::sys_pidfd_send_signal,

        Send => sockets::sys_send,
        Recv => sockets::sys_recv,
        Setsockopt => sockets::sys_setsockopt,
        Getsockopt => sockets::sys_getsockopt,
        Sendmsg => sockets::sys_sendmsg,
        Recvmsg => sockets::sys_recvmsg,
        Sendmmsg => sockets::sys_sendmmsg,
        Recvmmsg => sockets::sys_recvmmsg,
        RecvmmsgTime64 => sockets::sys_recvmmsg_time64,

        Gettimeofday => time::sys_gettimeofday,
        Settimeofday => time::sys_settimeofday,
        Getitimer => time::sys_getitimer,
        Setitimer => time::sys_setitimer,
        Nanosleep => time::sys_nanosleep,
        ClockNanosleep => time::sys_clock_nanosleep,
        ClockGettime => time::sys_clock_gettime,
        ClockGetres => time::sys_clock_getres,
        ClockSettime => time::sys_clock_settime,
        SchedRrGetInterval => time::sys_sched_rr_get_interval,
        TimerCreate => time::sys_timer_create,
        TimerSettime => time::sys_timer_settime,
        TimerGettime => time::sys_timer_gettime,
        TimerfdSettime => time::sys_timerfd_settime,
        TimerfdGettime => time::sys_timerfd_gettime,
        Adjtimex => time::sys_adjtimex,
        ClockAdjtime => time::sys_clock_adjtime,
        Times => time::sys_times,

        Chown16 => uid16::sys_chown16,
        Lchown16 => uid16::sys_lchown16,
        Fchown16 => uid16::sys_fchown16,
        Setuid16 => uid16::sys_setuid16,
        Setgid16 => uid16::sys_setgid16,
        Getuid16 => uid16::sys_getuid16,
        Getgid16 => uid16::sys_getgid16,
        Geteuid16 => uid16::sys_geteuid16,
        Getegid16 => uid16::sys_getegid16,
        Setreuid16 => uid16::sys_setreuid16,
        Setregid16 => uid16::sys_setregid16,
        Setresuid16 => uid16::sys_setresuid16,
        Setresgid16 => uid16::sys_setresgid16,
        Getresuid16 => uid16::sys_getresuid16,
        Getresgid16 => uid16::sys_getresgid16,
        Getgroups16 => uid16::sys_getgroups16,
        Setgroups16 => uid16::sys_setgroups16,
        Setfsuid16 => uid16::sys_setfsuid16,
        Setfsgid16 => uid16::sys_setfsgid16,
    ]
});
