//! Canonical syscall identifiers and the per-architecture number and policy
//! tables.

use std::{collections::HashMap, fmt, sync::LazyLock};

use anyhow::{Result, anyhow};

mod arm;
mod arm64;

/// How one argument word is interpreted when a call is forwarded unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// `int`, sign-extended from the low 32 bits.
    Int,
    /// `unsigned int`, zero-extended from the low 32 bits.
    Uint,
    /// Guest `long`, sign-extended from the guest word.
    Long,
    /// Guest `unsigned long` / `size_t`, zero-extended from the guest word.
    Ulong,
    /// Pointer to a fixed-size object of this many bytes.
    Ptr(usize),
    /// Pointer to a buffer whose length is the given argument.
    Buf(usize),
    /// NUL-terminated path or name.
    Str,
    /// Pointer whose extent the kernel decides (arrays, unions, addresses).
    Addr,
}

const I: ArgKind = ArgKind::Int;
const U: ArgKind = ArgKind::Uint;
const L: ArgKind = ArgKind::Long;
const UL: ArgKind = ArgKind::Ulong;
const S: ArgKind = ArgKind::Str;
const A: ArgKind = ArgKind::Addr;
use ArgKind::{Buf, Ptr};

macro_rules! host_nr {
    (_) => {
        None
    };
    ($nr:literal) => {
        Some($nr)
    };
}

macro_rules! sysnos {
    ($($variant:ident $name:literal $x86_64:tt $i386:tt [$($arg:expr),*];)*) => {
        /// One operating-system call concept, independent of guest and host.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum Sysno {
            $($variant,)*
        }

        impl Sysno {
            pub const ALL: &'static [Sysno] = &[$(Sysno::$variant,)*];
            pub const COUNT: usize = Self::ALL.len();

            /// Kernel name of the call.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Sysno::$variant => $name,)*
                }
            }

            /// x86_64 entry point taking neutral arguments.
            pub const fn x86_64(self) -> Option<usize> {
                match self {
                    $(Sysno::$variant => host_nr!($x86_64),)*
                }
            }

            /// i386 entry point taking neutral arguments once narrowed to host
            /// words. `None` where the 32-bit dispatcher has to reshape the call.
            pub const fn i386(self) -> Option<usize> {
                match self {
                    $(Sysno::$variant => host_nr!($i386),)*
                }
            }

            /// Argument interpretation used when forwarding unchanged.
            pub fn signature(self) -> &'static [ArgKind] {
                match self {
                    $(Sysno::$variant => &[$($arg),*],)*
                }
            }
        }
    };
}

sysnos! {
    // variant            name                      x86_64 i386  arguments
    Read                  "read"                    0   3    [I, Buf(2), UL];
    Write                 "write"                   1   4    [I, Buf(2), UL];
    Open                  "open"                    2   5    [S, I, U];
    Close                 "close"                   3   6    [I];
    Stat                  "stat"                    4   _    [S, A];
    Fstat                 "fstat"                   5   _    [I, A];
    Lstat                 "lstat"                   6   _    [S, A];
    Poll                  "poll"                    7   168  [A, U, I];
    Lseek                 "lseek"                   8   _    [I, L, U];
    Mmap                  "mmap"                    9   _    [A, UL, I, I, I, L];
    Mprotect              "mprotect"                10  125  [Buf(1), UL, I];
    Munmap                "munmap"                  11  91   [Buf(1), UL];
    Brk                   "brk"                     12  45   [A];
    RtSigaction           "rt_sigaction"            13  174  [I, A, A, UL];
    RtSigprocmask         "rt_sigprocmask"          14  175  [I, A, A, UL];
    RtSigreturn           "rt_sigreturn"            15  173  [];
    Ioctl                 "ioctl"                   16  54   [I, U, UL];
    Pread64               "pread64"                 17  _    [I, Buf(2), UL, L];
    Pwrite64              "pwrite64"                18  _    [I, Buf(2), UL, L];
    Readv                 "readv"                   19  145  [I, A, I];
    Writev                "writev"                  20  146  [I, A, I];
    Access                "access"                  21  33   [S, I];
    Pipe                  "pipe"                    22  42   [Ptr(8)];
    Select                "select"                  23  _    [I, A, A, A, A];
    SchedYield            "sched_yield"             24  158  [];
    Mremap                "mremap"                  25  163  [A, UL, UL, I, A];
    Msync                 "msync"                   26  144  [Buf(1), UL, I];
    Mincore               "mincore"                 27  218  [Buf(1), UL, A];
    Madvise               "madvise"                 28  219  [Buf(1), UL, I];
    Shmget                "shmget"                  29  _    [I, UL, I];
    Shmat                 "shmat"                   30  _    [I, A, I];
    Shmctl                "shmctl"                  31  _    [I, I, A];
    Dup                   "dup"                     32  41   [I];
    Dup2                  "dup2"                    33  63   [I, I];
    Pause                 "pause"                   34  29   [];
    Nanosleep             "nanosleep"               35  _    [Ptr(16), A];
    Getitimer             "getitimer"               36  _    [I, A];
    Setitimer             "setitimer"               38  _    [I, A, A];
    Getpid                "getpid"                  39  20   [];
    Sendfile              "sendfile"                40  239  [I, I, Ptr(8), UL];
    Socket                "socket"                  41  _    [I, I, I];
    Connect               "connect"                 42  _    [I, Buf(2), U];
    Accept                "accept"                  43  _    [I, A, Ptr(4)];
    Sendto                "sendto"                  44  _    [I, Buf(2), UL, I, Buf(5), U];
    Recvfrom              "recvfrom"                45  _    [I, Buf(2), UL, I, A, Ptr(4)];
    Sendmsg               "sendmsg"                 46  _    [I, A, I];
    Recvmsg               "recvmsg"                 47  _    [I, A, I];
    Shutdown              "shutdown"                48  _    [I, I];
    Bind                  "bind"                    49  _    [I, Buf(2), U];
    Listen                "listen"                  50  _    [I, I];
    Getsockname           "getsockname"             51  _    [I, A, Ptr(4)];
    Getpeername           "getpeername"             52  _    [I, A, Ptr(4)];
    Socketpair            "socketpair"              53  _    [I, I, I, Ptr(8)];
    Setsockopt            "setsockopt"              54  _    [I, I, I, Buf(4), U];
    Getsockopt            "getsockopt"              55  _    [I, I, I, A, Ptr(4)];
    Clone                 "clone"                   56  120  [UL, A, A, A, UL];
    Fork                  "fork"                    57  2    [];
    Vfork                 "vfork"                   58  190  [];
    Execve                "execve"                  59  11   [S, A, A];
    Exit                  "exit"                    60  1    [I];
    Wait4                 "wait4"                   61  _    [I, Ptr(4), I, A];
    Kill                  "kill"                    62  37   [I, I];
    Uname                 "uname"                   63  122  [Ptr(390)];
    Semget                "semget"                  64  _    [I, I, I];
    Semop                 "semop"                   65  _    [I, A, U];
    Semctl                "semctl"                  66  _    [I, I, I, UL];
    Shmdt                 "shmdt"                   67  _    [A];
    Msgget                "msgget"                  68  _    [I, I];
    Msgsnd                "msgsnd"                  69  _    [I, A, UL, I];
    Msgrcv                "msgrcv"                  70  _    [I, A, UL, L, I];
    Msgctl                "msgctl"                  71  _    [I, I, A];
    Fcntl                 "fcntl"                   72  _    [I, I, UL];
    Flock                 "flock"                   73  143  [I, I];
    Fsync                 "fsync"                   74  118  [I];
    Fdatasync             "fdatasync"               75  148  [I];
    Truncate              "truncate"                76  _    [S, L];
    Ftruncate             "ftruncate"               77  _    [I, L];
    Getdents              "getdents"                _   _    [I, Buf(2), U];
    Getcwd                "getcwd"                  79  183  [Buf(1), UL];
    Chdir                 "chdir"                   80  12   [S];
    Fchdir                "fchdir"                  81  133  [I];
    Rename                "rename"                  82  38   [S, S];
    Mkdir                 "mkdir"                   83  39   [S, U];
    Rmdir                 "rmdir"                   84  40   [S];
    Creat                 "creat"                   85  8    [S, U];
    Link                  "link"                    86  9    [S, S];
    Unlink                "unlink"                  87  10   [S];
    Symlink               "symlink"                 88  83   [S, S];
    Readlink              "readlink"                89  85   [S, Buf(2), I];
    Chmod                 "chmod"                   90  15   [S, U];
    Fchmod                "fchmod"                  91  94   [I, U];
    Chown                 "chown"                   92  212  [S, U, U];
    Fchown                "fchown"                  93  207  [I, U, U];
    Lchown                "lchown"                  94  198  [S, U, U];
    Umask                 "umask"                   95  60   [U];
    Gettimeofday          "gettimeofday"            96  _    [A, Ptr(8)];
    Getrlimit             "getrlimit"               97  _    [U, Ptr(16)];
    Getrusage             "getrusage"               98  _    [I, A];
    Sysinfo               "sysinfo"                 99  _    [A];
    Times                 "times"                   100 _    [A];
    Ptrace                "ptrace"                  101 26   [L, I, A, A];
    Getuid                "getuid"                  102 199  [];
    Syslog                "syslog"                  103 103  [I, Buf(2), I];
    Getgid                "getgid"                  104 200  [];
    Setuid                "setuid"                  105 213  [U];
    Setgid                "setgid"                  106 214  [U];
    Geteuid               "geteuid"                 107 201  [];
    Getegid               "getegid"                 108 202  [];
    Setpgid               "setpgid"                 109 57   [I, I];
    Getppid               "getppid"                 110 64   [];
    Getpgrp               "getpgrp"                 111 65   [];
    Setsid                "setsid"                  112 66   [];
    Setreuid              "setreuid"                113 203  [U, U];
    Setregid              "setregid"                114 204  [U, U];
    Getgroups             "getgroups"               115 205  [I, A];
    Setgroups             "setgroups"               116 206  [I, A];
    Setresuid             "setresuid"               117 208  [U, U, U];
    Getresuid             "getresuid"               118 209  [Ptr(4), Ptr(4), Ptr(4)];
    Setresgid             "setresgid"               119 210  [U, U, U];
    Getresgid             "getresgid"               120 211  [Ptr(4), Ptr(4), Ptr(4)];
    Getpgid               "getpgid"                 121 132  [I];
    Setfsuid              "setfsuid"                122 215  [U];
    Setfsgid              "setfsgid"                123 216  [U];
    Getsid                "getsid"                  124 147  [I];
    Capget                "capget"                  125 184  [Ptr(8), A];
    Capset                "capset"                  126 185  [Ptr(8), A];
    RtSigpending          "rt_sigpending"           127 176  [A, UL];
    RtSigtimedwait        "rt_sigtimedwait"         128 421  [A, A, A, UL];
    RtSigqueueinfo        "rt_sigqueueinfo"         129 178  [I, I, A];
    RtSigsuspend          "rt_sigsuspend"           130 179  [A, UL];
    Sigaltstack           "sigaltstack"             131 186  [A, A];
    Mknod                 "mknod"                   133 14   [S, U, U];
    Uselib                "uselib"                  134 86   [S];
    Personality           "personality"             135 136  [U];
    Ustat                 "ustat"                   136 62   [U, A];
    Statfs                "statfs"                  137 _    [S, A];
    Fstatfs               "fstatfs"                 138 _    [I, A];
    Sysfs                 "sysfs"                   139 135  [I, UL, UL];
    Getpriority           "getpriority"             140 96   [I, I];
    Setpriority           "setpriority"             141 97   [I, I, I];
    SchedSetparam         "sched_setparam"          142 154  [I, Ptr(4)];
    SchedGetparam         "sched_getparam"          143 155  [I, Ptr(4)];
    SchedSetscheduler     "sched_setscheduler"      144 156  [I, I, Ptr(4)];
    SchedGetscheduler     "sched_getscheduler"      145 157  [I];
    SchedGetPriorityMax   "sched_get_priority_max"  146 159  [I];
    SchedGetPriorityMin   "sched_get_priority_min"  147 160  [I];
    SchedRrGetInterval    "sched_rr_get_interval"   148 423  [I, Ptr(16)];
    Mlock                 "mlock"                   149 150  [Buf(1), UL];
    Munlock               "munlock"                 150 151  [Buf(1), UL];
    Mlockall              "mlockall"                151 152  [I];
    Munlockall            "munlockall"              152 153  [];
    Vhangup               "vhangup"                 153 111  [];
    PivotRoot             "pivot_root"              155 217  [S, S];
    Sysctl                "_sysctl"                 156 149  [A];
    Prctl                 "prctl"                   157 172  [I, UL, UL, UL, UL];
    Adjtimex              "adjtimex"                159 _    [A];
    Setrlimit             "setrlimit"               160 _    [U, Ptr(16)];
    Chroot                "chroot"                  161 61   [S];
    Sync                  "sync"                    162 36   [];
    Acct                  "acct"                    163 51   [S];
    Settimeofday          "settimeofday"            164 _    [A, A];
    Mount                 "mount"                   165 21   [S, S, S, UL, A];
    Umount2               "umount2"                 166 52   [S, I];
    Swapon                "swapon"                  167 87   [S, I];
    Swapoff               "swapoff"                 168 115  [S];
    Reboot                "reboot"                  169 88   [I, I, U, A];
    Sethostname           "sethostname"             170 74   [Buf(1), I];
    Setdomainname         "setdomainname"           171 121  [Buf(1), I];
    InitModule            "init_module"             175 128  [Buf(1), UL, S];
    DeleteModule          "delete_module"           176 129  [S, U];
    Quotactl              "quotactl"                179 131  [U, S, I, A];
    Nfsservctl            "nfsservctl"              180 169  [I, A, A];
    Gettid                "gettid"                  186 224  [];
    Readahead             "readahead"               187 _    [I, L, UL];
    Setxattr              "setxattr"                188 226  [S, S, Buf(3), UL, I];
    Lsetxattr             "lsetxattr"               189 227  [S, S, Buf(3), UL, I];
    Fsetxattr             "fsetxattr"               190 228  [I, S, Buf(3), UL, I];
    Getxattr              "getxattr"                191 229  [S, S, Buf(3), UL];
    Lgetxattr             "lgetxattr"               192 230  [S, S, Buf(3), UL];
    Fgetxattr             "fgetxattr"               193 231  [I, S, Buf(3), UL];
    Listxattr             "listxattr"               194 232  [S, Buf(2), UL];
    Llistxattr            "llistxattr"              195 233  [S, Buf(2), UL];
    Flistxattr            "flistxattr"              196 234  [I, Buf(2), UL];
    Removexattr           "removexattr"             197 235  [S, S];
    Lremovexattr          "lremovexattr"            198 236  [S, S];
    Fremovexattr          "fremovexattr"            199 237  [I, S];
    Tkill                 "tkill"                   200 238  [I, I];
    Futex                 "futex"                   202 422  [A, I, U, A, A, U];
    SchedSetaffinity      "sched_setaffinity"       203 241  [I, UL, Buf(1)];
    SchedGetaffinity      "sched_getaffinity"       204 242  [I, UL, Buf(1)];
    IoSetup               "io_setup"                206 245  [U, Ptr(8)];
    IoDestroy             "io_destroy"              207 246  [UL];
    IoGetevents           "io_getevents"            208 _    [UL, L, L, A, A];
    IoSubmit              "io_submit"               209 248  [UL, L, A];
    IoCancel              "io_cancel"               210 249  [UL, A, A];
    LookupDcookie         "lookup_dcookie"          212 253  [UL, Buf(2), UL];
    EpollCreate           "epoll_create"            213 254  [I];
    RemapFilePages        "remap_file_pages"        216 257  [Buf(1), UL, I, UL, I];
    Getdents64            "getdents64"              217 220  [I, Buf(2), U];
    SetTidAddress         "set_tid_address"         218 258  [A];
    RestartSyscall        "restart_syscall"         219 0    [];
    Semtimedop            "semtimedop"              220 420  [I, A, U, Ptr(16)];
    Fadvise64             "fadvise64"               221 _    [I, L, L, I];
    TimerCreate           "timer_create"            222 _    [I, A, Ptr(4)];
    TimerSettime          "timer_settime"           223 409  [I, I, Ptr(32), A];
    TimerGettime          "timer_gettime"           224 408  [I, Ptr(32)];
    TimerGetoverrun       "timer_getoverrun"        225 262  [I];
    TimerDelete           "timer_delete"            226 263  [I];
    ClockSettime          "clock_settime"           227 404  [I, Ptr(16)];
    ClockGettime          "clock_gettime"           228 403  [I, Ptr(16)];
    ClockGetres           "clock_getres"            229 406  [I, A];
    ClockNanosleep        "clock_nanosleep"         230 407  [I, I, Ptr(16), A];
    ExitGroup             "exit_group"              231 252  [I];
    EpollWait             "epoll_wait"              232 256  [I, A, I, I];
    EpollCtl              "epoll_ctl"               233 255  [I, I, I, A];
    Tgkill                "tgkill"                  234 270  [I, I, I];
    Utimes                "utimes"                  235 _    [S, A];
    Vserver               "vserver"                 236 273  [];
    Mbind                 "mbind"                   237 274  [Buf(1), UL, UL, A, UL, U];
    SetMempolicy          "set_mempolicy"           238 276  [I, A, UL];
    GetMempolicy          "get_mempolicy"           239 275  [Ptr(4), A, UL, A, UL];
    MqOpen                "mq_open"                 240 _    [S, I, U, A];
    MqUnlink              "mq_unlink"               241 278  [S];
    MqTimedsend           "mq_timedsend"            242 418  [I, Buf(2), UL, U, A];
    MqTimedreceive        "mq_timedreceive"         243 419  [I, Buf(2), UL, Ptr(4), A];
    MqNotify              "mq_notify"               244 _    [I, A];
    MqGetsetattr          "mq_getsetattr"           245 _    [I, A, A];
    KexecLoad             "kexec_load"              246 283  [UL, UL, A, UL];
    Waitid                "waitid"                  247 _    [I, I, A, I, A];
    AddKey                "add_key"                 248 286  [S, S, Buf(3), UL, I];
    RequestKey            "request_key"             249 287  [S, S, S, I];
    Keyctl                "keyctl"                  250 288  [I, UL, UL, UL, UL];
    IoprioSet             "ioprio_set"              251 289  [I, I, I];
    IoprioGet             "ioprio_get"              252 290  [I, I];
    InotifyInit           "inotify_init"            253 291  [];
    InotifyAddWatch       "inotify_add_watch"       254 292  [I, S, U];
    InotifyRmWatch        "inotify_rm_watch"        255 293  [I, I];
    MigratePages          "migrate_pages"           256 294  [I, UL, A, A];
    Openat                "openat"                  257 295  [I, S, I, U];
    Mkdirat               "mkdirat"                 258 296  [I, S, U];
    Mknodat               "mknodat"                 259 297  [I, S, U, U];
    Fchownat              "fchownat"                260 298  [I, S, U, U, I];
    Futimesat             "futimesat"               261 _    [I, S, A];
    Newfstatat            "newfstatat"              262 _    [I, S, A, I];
    Unlinkat              "unlinkat"                263 301  [I, S, I];
    Renameat              "renameat"                264 302  [I, S, I, S];
    Linkat                "linkat"                  265 303  [I, S, I, S, I];
    Symlinkat             "symlinkat"               266 304  [S, I, S];
    Readlinkat            "readlinkat"              267 305  [I, S, Buf(3), I];
    Fchmodat              "fchmodat"                268 306  [I, S, U];
    Faccessat             "faccessat"               269 307  [I, S, I];
    Pselect6              "pselect6"                270 413  [I, A, A, A, Ptr(16), A];
    Ppoll                 "ppoll"                   271 414  [A, U, Ptr(16), A, UL];
    Unshare               "unshare"                 272 310  [I];
    SetRobustList         "set_robust_list"         273 311  [A, UL];
    GetRobustList         "get_robust_list"         274 312  [I, A, A];
    Splice                "splice"                  275 313  [I, Ptr(8), I, Ptr(8), UL, U];
    Tee                   "tee"                     276 315  [I, I, UL, U];
    SyncFileRange         "sync_file_range"         277 _    [I, L, L, U];
    Vmsplice              "vmsplice"                278 316  [I, A, UL, U];
    MovePages             "move_pages"              279 317  [I, UL, A, A, A, I];
    Utimensat             "utimensat"               280 412  [I, S, A, I];
    EpollPwait            "epoll_pwait"             281 319  [I, A, I, I, A, UL];
    Signalfd              "signalfd"                282 321  [I, A, UL];
    TimerfdCreate         "timerfd_create"          283 322  [I, I];
    Eventfd               "eventfd"                 284 323  [U];
    Fallocate             "fallocate"               285 _    [I, I, L, L];
    TimerfdSettime        "timerfd_settime"         286 411  [I, I, Ptr(32), A];
    TimerfdGettime        "timerfd_gettime"         287 410  [I, Ptr(32)];
    Accept4               "accept4"                 288 _    [I, A, Ptr(4), I];
    Signalfd4             "signalfd4"               289 327  [I, A, UL, I];
    Eventfd2              "eventfd2"                290 328  [U, I];
    EpollCreate1          "epoll_create1"           291 329  [I];
    Dup3                  "dup3"                    292 330  [I, I, I];
    Pipe2                 "pipe2"                   293 331  [Ptr(8), I];
    InotifyInit1          "inotify_init1"           294 332  [I];
    Preadv                "preadv"                  295 _    [I, A, I, L];
    Pwritev               "pwritev"                 296 _    [I, A, I, L];
    RtTgsigqueueinfo      "rt_tgsigqueueinfo"       297 335  [I, I, I, A];
    PerfEventOpen         "perf_event_open"         298 336  [A, I, I, I, UL];
    Recvmmsg              "recvmmsg"                299 417  [I, A, U, U, Ptr(16)];
    FanotifyInit          "fanotify_init"           300 338  [U, U];
    FanotifyMark          "fanotify_mark"           301 _    [I, U, UL, I, S];
    Prlimit64             "prlimit64"               302 340  [I, U, Ptr(16), A];
    NameToHandleAt        "name_to_handle_at"       303 341  [I, S, A, Ptr(4), I];
    OpenByHandleAt        "open_by_handle_at"       304 342  [I, A, I];
    ClockAdjtime          "clock_adjtime"           305 405  [I, A];
    Syncfs                "syncfs"                  306 344  [I];
    Sendmmsg              "sendmmsg"                307 _    [I, A, U, U];
    Setns                 "setns"                   308 346  [I, I];
    Getcpu                "getcpu"                  309 318  [A, A, A];
    ProcessVmReadv        "process_vm_readv"        310 347  [I, A, UL, A, UL, UL];
    ProcessVmWritev       "process_vm_writev"       311 348  [I, A, UL, A, UL, UL];
    Kcmp                  "kcmp"                    312 349  [I, I, I, UL, UL];
    FinitModule           "finit_module"            313 350  [I, S, I];
    SchedSetattr          "sched_setattr"           314 351  [I, A, U];
    SchedGetattr          "sched_getattr"           315 352  [I, A, U, U];
    Renameat2             "renameat2"               316 353  [I, S, I, S, U];
    Seccomp               "seccomp"                 317 354  [U, U, A];
    Getrandom             "getrandom"               318 355  [Buf(1), UL, U];
    MemfdCreate           "memfd_create"            319 356  [S, U];
    KexecFileLoad         "kexec_file_load"         320 _    [I, I, UL, S, UL];
    Bpf                   "bpf"                     321 357  [I, A, U];
    Execveat              "execveat"                322 358  [I, S, A, A, I];
    Userfaultfd           "userfaultfd"             323 374  [I];
    Membarrier            "membarrier"              324 375  [I, U, I];
    Mlock2                "mlock2"                  325 376  [Buf(1), UL, I];
    CopyFileRange         "copy_file_range"         326 377  [I, Ptr(8), I, Ptr(8), UL, U];
    Preadv2               "preadv2"                 327 _    [I, A, I, L, UL, I];
    Pwritev2              "pwritev2"                328 _    [I, A, I, L, UL, I];
    PkeyMprotect          "pkey_mprotect"           329 380  [Buf(1), UL, I, I];
    PkeyAlloc             "pkey_alloc"              330 381  [U, U];
    PkeyFree              "pkey_free"               331 382  [I];
    Statx                 "statx"                   332 383  [I, S, I, U, Ptr(256)];
    IoPgetevents          "io_pgetevents"           333 416  [UL, L, L, A, A, A];
    Rseq                  "rseq"                    334 386  [A, U, I, U];
    PidfdSendSignal       "pidfd_send_signal"       424 424  [I, I, A, U];
    IoUringSetup          "io_uring_setup"          425 425  [U, A];
    IoUringEnter          "io_uring_enter"          426 426  [U, U, U, U, A, UL];
    IoUringRegister       "io_uring_register"       427 427  [U, U, A, U];
    OpenTree              "open_tree"               428 428  [I, S, U];
    MoveMount             "move_mount"              429 429  [I, S, I, S, U];
    Fsopen                "fsopen"                  430 430  [S, U];
    Fsconfig              "fsconfig"                431 431  [I, U, S, A, I];
    Fsmount               "fsmount"                 432 432  [I, U, U];
    Fspick                "fspick"                  433 433  [I, S, U];
    PidfdOpen             "pidfd_open"              434 434  [I, U];
    Clone3                "clone3"                  435 435  [A, UL];
    CloseRange            "close_range"             436 436  [U, U, U];
    Openat2               "openat2"                 437 437  [I, S, Ptr(24), UL];
    PidfdGetfd            "pidfd_getfd"             438 438  [I, I, U];
    Faccessat2            "faccessat2"              439 439  [I, S, I, I];
    ProcessMadvise        "process_madvise"         440 440  [I, A, UL, I, U];
    EpollPwait2           "epoll_pwait2"            441 441  [I, A, I, Ptr(16), A, UL];
    MountSetattr          "mount_setattr"           442 442  [I, S, U, Buf(4), UL];
    QuotactlFd            "quotactl_fd"             443 443  [U, U, I, A];
    LandlockCreateRuleset "landlock_create_ruleset" 444 444  [Buf(1), UL, U];
    LandlockAddRule       "landlock_add_rule"       445 445  [I, I, A, U];
    LandlockRestrictSelf  "landlock_restrict_self"  446 446  [I, U];
    MemfdSecret           "memfd_secret"            447 447  [U];
    ProcessMrelease       "process_mrelease"        448 448  [I, U];
    FutexWaitv            "futex_waitv"             449 449  [A, U, U, Ptr(16), I];
    SetMempolicyHomeNode  "set_mempolicy_home_node" 450 450  [Buf(1), UL, UL, UL];
    Cachestat             "cachestat"               451 451  [U, Ptr(16), Ptr(32), U];
    Fchmodat2             "fchmodat2"               452 452  [I, S, U, U];

    // Calls that only exist in 32-bit guest ABIs. The adapter lowers them
    // onto one of the neutral calls above.
    Lchown16              "lchown16"                _   _    [S, U, U];
    Setuid16              "setuid16"                _   _    [U];
    Getuid16              "getuid16"                _   _    [];
    Setgid16              "setgid16"                _   _    [U];
    Getgid16              "getgid16"                _   _    [];
    Geteuid16             "geteuid16"               _   _    [];
    Getegid16             "getegid16"               _   _    [];
    Setreuid16            "setreuid16"              _   _    [U, U];
    Setregid16            "setregid16"              _   _    [U, U];
    Getgroups16           "getgroups16"             _   _    [I, A];
    Setgroups16           "setgroups16"             _   _    [I, A];
    Fchown16              "fchown16"                _   _    [I, U, U];
    Setresuid16           "setresuid16"             _   _    [U, U, U];
    Getresuid16           "getresuid16"             _   _    [A, A, A];
    Setresgid16           "setresgid16"             _   _    [U, U, U];
    Getresgid16           "getresgid16"             _   _    [A, A, A];
    Chown16               "chown16"                 _   _    [S, U, U];
    Setfsuid16            "setfsuid16"              _   _    [U];
    Setfsgid16            "setfsgid16"              _   _    [U];
    Nice                  "nice"                    _   34   [I];
    Sigaction             "sigaction"               _   67   [I, A, A];
    Sigsuspend            "sigsuspend"              _   72   [I, I, U];
    Sigpending            "sigpending"              _   73   [A];
    Sigreturn             "sigreturn"               _   119  [];
    Sigprocmask           "sigprocmask"             _   126  [I, A, A];
    Bdflush               "bdflush"                 _   134  [I, L];
    Llseek                "_llseek"                 _   _    [I, UL, UL, A, U];
    Mmap2                 "mmap2"                   _   _    [A, UL, I, I, I, UL];
    Truncate64            "truncate64"              _   _    [S, UL, UL, UL];
    Ftruncate64           "ftruncate64"             _   _    [I, UL, UL, UL];
    Stat64                "stat64"                  _   _    [S, A];
    Lstat64               "lstat64"                 _   _    [S, A];
    Fstat64               "fstat64"                 _   _    [I, A];
    Fstatat64             "fstatat64"               _   _    [I, S, A, I];
    Statfs64              "statfs64"                _   _    [S, UL, A];
    Fstatfs64             "fstatfs64"               _   _    [I, UL, A];
    Fcntl64               "fcntl64"                 _   _    [I, I, UL];
    Sendfile64            "sendfile64"              40  239  [I, I, Ptr(8), UL];
    Send                  "send"                    _   _    [I, Buf(2), UL, I];
    Recv                  "recv"                    _   _    [I, Buf(2), UL, I];
    ArmFadvise64_64       "arm_fadvise64_64"        _   _    [I, I, UL, UL, UL, UL];
    SyncFileRange2        "sync_file_range2"        _   _    [I, U, UL, UL, UL, UL];
    PciconfigIobase       "pciconfig_iobase"        _   _    [L, UL, UL];
    PciconfigRead         "pciconfig_read"          _   _    [UL, UL, UL, UL, A];
    PciconfigWrite        "pciconfig_write"         _   _    [UL, UL, UL, UL, A];
    ClockGettime64        "clock_gettime64"         228 403  [I, Ptr(16)];
    ClockSettime64        "clock_settime64"         227 404  [I, Ptr(16)];
    ClockAdjtime64        "clock_adjtime64"         305 405  [I, Ptr(208)];
    ClockGetresTime64     "clock_getres_time64"     229 406  [I, A];
    ClockNanosleepTime64  "clock_nanosleep_time64"  230 407  [I, I, Ptr(16), A];
    TimerGettime64        "timer_gettime64"         224 408  [I, Ptr(32)];
    TimerSettime64        "timer_settime64"         223 409  [I, I, Ptr(32), A];
    TimerfdGettime64      "timerfd_gettime64"       287 410  [I, Ptr(32)];
    TimerfdSettime64      "timerfd_settime64"       286 411  [I, I, Ptr(32), A];
    UtimensatTime64       "utimensat_time64"        280 412  [I, S, A, I];
    Pselect6Time64        "pselect6_time64"         _   _    [I, A, A, A, Ptr(16), A];
    PpollTime64           "ppoll_time64"            271 414  [A, U, Ptr(16), A, UL];
    IoPgeteventsTime64    "io_pgetevents_time64"    333 416  [UL, L, L, A, A, A];
    RecvmmsgTime64        "recvmmsg_time64"         _   _    [I, A, U, U, Ptr(16)];
    MqTimedsendTime64     "mq_timedsend_time64"     242 418  [I, Buf(2), UL, U, A];
    MqTimedreceiveTime64  "mq_timedreceive_time64"  243 419  [I, Buf(2), UL, Ptr(4), A];
    SemtimedopTime64      "semtimedop_time64"       220 420  [I, A, U, Ptr(16)];
    RtSigtimedwaitTime64  "rt_sigtimedwait_time64"  128 421  [A, A, A, UL];
    FutexTime64           "futex_time64"            _   _    [A, I, U, A, A, U];
    SchedRrGetIntervalTime64 "sched_rr_get_interval_time64" 148 423 [I, Ptr(16)];

    // ARM private calls.
    ArmBreakpoint         "breakpoint"              _   _    [];
    ArmCacheflush         "cacheflush"              _   _    [UL, UL, I];
    ArmUsr26              "usr26"                   _   _    [];
    ArmUsr32              "usr32"                   _   _    [];
    ArmSetTls             "set_tls"                 _   _    [UL];
    ArmGetTls             "get_tls"                 _   _    [];
}

impl fmt::Display for Sysno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum GuestArch {
    Arm,
    Arm64,
}

impl fmt::Display for GuestArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuestArch::Arm => f.write_str("arm"),
            GuestArch::Arm64 => f.write_str("arm64"),
        }
    }
}

/// How the adapter treats a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Forwarded with the arguments reinterpreted per [`Sysno::signature`].
    Passthrough,
    /// Handled by a dedicated converter.
    Custom,
    /// Known call the engine refuses to guess at; fatal.
    NotYetSupported,
    /// Answered with `-ENOSYS`.
    NotImplemented,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Policy::Passthrough => "passthrough",
            Policy::Custom => "custom",
            Policy::NotYetSupported => "not-yet-supported",
            Policy::NotImplemented => "not-implemented",
        };
        f.write_str(text)
    }
}

/// One raw number of a guest architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub raw: u32,
    pub sysno: Sysno,
    pub policy: Policy,
}

pub struct ArchTable {
    entries: Vec<Entry>,
    by_raw: HashMap<u32, Entry>,
    by_sysno: Vec<Option<Policy>>,
}

impl ArchTable {
    fn new(raw: &[(u32, Sysno, Policy)]) -> Self {
        let entries: Vec<Entry> = raw
            .iter()
            .map(|&(raw, sysno, policy)| Entry { raw, sysno, policy })
            .collect();
        let by_raw = entries.iter().map(|e| (e.raw, *e)).collect();
        let mut by_sysno = vec![None; Sysno::COUNT];
        for e in &entries {
            by_sysno[e.sysno as usize] = Some(e.policy);
        }
        Self {
            entries,
            by_raw,
            by_sysno,
        }
    }

    /// Every raw number the architecture defines, in ascending order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn lookup(&self, raw: u32) -> Option<Entry> {
        self.by_raw.get(&raw).copied()
    }
}

static ARM: LazyLock<ArchTable> = LazyLock::new(|| ArchTable::new(arm::ENTRIES));
static ARM64: LazyLock<ArchTable> = LazyLock::new(|| ArchTable::new(arm64::ENTRIES));

pub fn table(arch: GuestArch) -> &'static ArchTable {
    match arch {
        GuestArch::Arm => &ARM,
        GuestArch::Arm64 => &ARM64,
    }
}

/// Map a trapped syscall number to its canonical identifier.
///
/// Unknown numbers are fatal: guessing would run the wrong call.
pub fn resolve(arch: GuestArch, raw: u32) -> Result<Sysno> {
    table(arch)
        .lookup(raw)
        .map(|e| e.sysno)
        .ok_or_else(|| anyhow!("unknown {arch} syscall number {raw} ({raw:#x})"))
}

pub fn policy_for(arch: GuestArch, sysno: Sysno) -> Policy {
    table(arch).by_sysno[sysno as usize].unwrap_or(Policy::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Sysno::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn signatures_fit_in_six_words() {
        for &sysno in Sysno::ALL {
            let sig = sysno.signature();
            assert!(sig.len() <= 6, "{sysno}");
            for kind in sig {
                if let ArgKind::Buf(len) = kind {
                    assert!(*len < sig.len(), "{sysno} length argument out of range");
                }
            }
        }
    }

    #[test]
    fn every_sysno_maps_to_one_policy_per_arch() {
        for arch in [GuestArch::Arm, GuestArch::Arm64] {
            for e in table(arch).entries() {
                assert_eq!(policy_for(arch, e.sysno), e.policy, "{arch} {}", e.raw);
            }
        }
    }

    #[test]
    fn raw_numbers_are_sorted_and_unique() {
        for arch in [GuestArch::Arm, GuestArch::Arm64] {
            let entries = table(arch).entries();
            assert!(entries.windows(2).all(|w| w[0].raw < w[1].raw), "{arch}");
        }
    }

    #[test]
    fn resolve_known_numbers() {
        assert_eq!(resolve(GuestArch::Arm, 4).unwrap(), Sysno::Write);
        assert_eq!(resolve(GuestArch::Arm, 199).unwrap(), Sysno::Getuid);
        assert_eq!(resolve(GuestArch::Arm, 24).unwrap(), Sysno::Getuid16);
        assert_eq!(resolve(GuestArch::Arm, 0x0f0002).unwrap(), Sysno::ArmCacheflush);
        assert_eq!(resolve(GuestArch::Arm64, 64).unwrap(), Sysno::Write);
        assert_eq!(resolve(GuestArch::Arm64, 221).unwrap(), Sysno::Execve);
    }

    #[test]
    fn resolve_rejects_unknown_numbers() {
        assert!(resolve(GuestArch::Arm, 7).is_err());
        assert!(resolve(GuestArch::Arm, 9999).is_err());
        assert!(resolve(GuestArch::Arm64, 244).is_err());
        assert!(resolve(GuestArch::Arm64, 1024).is_err());
    }

    #[test]
    fn gaps_are_not_implemented() {
        assert_eq!(policy_for(GuestArch::Arm64, Sysno::Open), Policy::NotImplemented);
        assert_eq!(policy_for(GuestArch::Arm64, Sysno::Stat64), Policy::NotImplemented);
    }

    #[test]
    fn time64_calls_share_the_x86_64_entry_point() {
        assert_eq!(Sysno::ClockGettime64.x86_64(), Sysno::ClockGettime.x86_64());
        assert_eq!(Sysno::ClockGettime.i386(), Some(403));
    }
}
