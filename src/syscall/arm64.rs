//! ARM64 syscall numbers (asm-generic numbering).
//!
//! 244..=259 are reserved for architecture-specific calls that ARM64 does
//! not define.

use super::{Policy, Sysno::*};

const P: Policy = Policy::Passthrough;
const C: Policy = Policy::Custom;
const NYS: Policy = Policy::NotYetSupported;
const NI: Policy = Policy::NotImplemented;

pub(super) const ENTRIES: &[(u32, super::Sysno, Policy)] = &[
    (0, IoSetup, NI),
    (1, IoDestroy, NI),
    (2, IoSubmit, NI),
    (3, IoCancel, NI),
    (4, IoGetevents, NI),
    (5, Setxattr, P),
    (6, Lsetxattr, P),
    (7, Fsetxattr, P),
    (8, Getxattr, P),
    (9, Lgetxattr, P),
    (10, Fgetxattr, P),
    (11, Listxattr, P),
    (12, Llistxattr, P),
    (13, Flistxattr, P),
    (14, Removexattr, P),
    (15, Lremovexattr, P),
    (16, Fremovexattr, P),
    (17, Getcwd, P),
    (18, LookupDcookie, NI),
    (19, Eventfd2, P),
    (20, EpollCreate1, P),
    (21, EpollCtl, C),
    (22, EpollPwait, C),
    (23, Dup, P),
    (24, Dup3, P),
    (25, Fcntl, C),
    (26, InotifyInit1, P),
    (27, InotifyAddWatch, P),
    (28, InotifyRmWatch, P),
    (29, Ioctl, C),
    (30, IoprioSet, P),
    (31, IoprioGet, P),
    (32, Flock, P),
    (33, Mknodat, P),
    (34, Mkdirat, P),
    (35, Unlinkat, P),
    (36, Symlinkat, P),
    (37, Linkat, P),
    (38, Renameat, P),
    (39, Umount2, P),
    (40, Mount, P),
    (41, PivotRoot, P),
    (42, Nfsservctl, NI),
    (43, Statfs, P),
    (44, Fstatfs, P),
    (45, Truncate, P),
    (46, Ftruncate, P),
    (47, Fallocate, P),
    (48, Faccessat, P),
    (49, Chdir, P),
    (50, Fchdir, P),
    (51, Chroot, P),
    (52, Fchmod, P),
    (53, Fchmodat, P),
    (54, Fchownat, P),
    (55, Fchown, P),
    (56, Openat, C),
    (57, Close, P),
    (58, Vhangup, P),
    (59, Pipe2, P),
    (60, Quotactl, P),
    (61, Getdents64, P),
    (62, Lseek, P),
    (63, Read, P),
    (64, Write, P),
    (65, Readv, C),
    (66, Writev, C),
    (67, Pread64, P),
    (68, Pwrite64, P),
    (69, Preadv, C),
    (70, Pwritev, C),
    (71, Sendfile, P),
    (72, Pselect6, C),
    (73, Ppoll, P),
    (74, Signalfd4, P),
    (75, Vmsplice, C),
    (76, Splice, P),
    (77, Tee, P),
    (78, Readlinkat, P),
    (79, Newfstatat, C),
    (80, Fstat, C),
    (81, Sync, P),
    (82, Fsync, P),
    (83, Fdatasync, P),
    (84, SyncFileRange, P),
    (85, TimerfdCreate, P),
    (86, TimerfdSettime, P),
    (87, TimerfdGettime, P),
    (88, Utimensat, P),
    (89, Acct, P),
    (90, Capget, P),
    (91, Capset, P),
    (92, Personality, P),
    (93, Exit, P),
    (94, ExitGroup, P),
    (95, Waitid, P),
    (96, SetTidAddress, P),
    (97, Unshare, P),
    (98, Futex, C),
    (99, SetRobustList, NI),
    (100, GetRobustList, NI),
    (101, Nanosleep, P),
    (102, Getitimer, P),
    (103, Setitimer, P),
    (104, KexecLoad, NI),
    (105, InitModule, P),
    (106, DeleteModule, P),
    (107, TimerCreate, P),
    (108, TimerGettime, P),
    (109, TimerGetoverrun, P),
    (110, TimerSettime, P),
    (111, TimerDelete, P),
    (112, ClockSettime, P),
    (113, ClockGettime, P),
    (114, ClockGetres, P),
    (115, ClockNanosleep, P),
    (116, Syslog, P),
    (117, Ptrace, NYS),
    (118, SchedSetparam, P),
    (119, SchedSetscheduler, P),
    (120, SchedGetscheduler, P),
    (121, SchedGetparam, P),
    (122, SchedSetaffinity, P),
    (123, SchedGetaffinity, P),
    (124, SchedYield, P),
    (125, SchedGetPriorityMax, P),
    (126, SchedGetPriorityMin, P),
    (127, SchedRrGetInterval, P),
    (128, RestartSyscall, P),
    (129, Kill, P),
    (130, Tkill, P),
    (131, Tgkill, P),
    (132, Sigaltstack, NYS),
    (133, RtSigsuspend, NYS),
    (134, RtSigaction, NYS),
    (135, RtSigprocmask, NYS),
    (136, RtSigpending, NYS),
    (137, RtSigtimedwait, NYS),
    (138, RtSigqueueinfo, NYS),
    (139, RtSigreturn, NYS),
    (140, Setpriority, P),
    (141, Getpriority, P),
    (142, Reboot, P),
    (143, Setregid, P),
    (144, Setgid, P),
    (145, Setreuid, P),
    (146, Setuid, P),
    (147, Setresuid, P),
    (148, Getresuid, P),
    (149, Setresgid, P),
    (150, Getresgid, P),
    (151, Setfsuid, P),
    (152, Setfsgid, P),
    (153, Times, P),
    (154, Setpgid, P),
    (155, Getpgid, P),
    (156, Getsid, P),
    (157, Setsid, P),
    (158, Getgroups, P),
    (159, Setgroups, P),
    (160, Uname, P),
    (161, Sethostname, P),
    (162, Setdomainname, P),
    (163, Getrlimit, P),
    (164, Setrlimit, P),
    (165, Getrusage, P),
    (166, Umask, P),
    (167, Prctl, C),
    (168, Getcpu, P),
    (169, Gettimeofday, P),
    (170, Settimeofday, P),
    (171, Adjtimex, P),
    (172, Getpid, P),
    (173, Getppid, P),
    (174, Getuid, P),
    (175, Geteuid, P),
    (176, Getgid, P),
    (177, Getegid, P),
    (178, Gettid, P),
    (179, Sysinfo, P),
    (180, MqOpen, P),
    (181, MqUnlink, P),
    (182, MqTimedsend, P),
    (183, MqTimedreceive, P),
    (184, MqNotify, P),
    (185, MqGetsetattr, P),
    (186, Msgget, P),
    (187, Msgctl, P),
    (188, Msgrcv, P),
    (189, Msgsnd, P),
    (190, Semget, P),
    (191, Semctl, C),
    (192, Semtimedop, P),
    (193, Semop, P),
    (194, Shmget, P),
    (195, Shmctl, P),
    (196, Shmat, C),
    (197, Shmdt, C),
    (198, Socket, P),
    (199, Socketpair, P),
    (200, Bind, P),
    (201, Listen, P),
    (202, Accept, P),
    (203, Connect, P),
    (204, Getsockname, P),
    (205, Getpeername, P),
    (206, Sendto, P),
    (207, Recvfrom, P),
    (208, Setsockopt, P),
    (209, Getsockopt, P),
    (210, Shutdown, P),
    (211, Sendmsg, C),
    (212, Recvmsg, C),
    (213, Readahead, P),
    (214, Brk, NYS),
    (215, Munmap, P),
    (216, Mremap, C),
    (217, AddKey, P),
    (218, RequestKey, P),
    (219, Keyctl, NI),
    (220, Clone, NYS),
    (221, Execve, C),
    (222, Mmap, C),
    (223, Fadvise64, P),
    (224, Swapon, P),
    (225, Swapoff, P),
    (226, Mprotect, P),
    (227, Msync, P),
    (228, Mlock, P),
    (229, Munlock, P),
    (230, Mlockall, P),
    (231, Munlockall, P),
    (232, Mincore, P),
    (233, Madvise, P),
    (234, RemapFilePages, P),
    (235, Mbind, P),
    (236, GetMempolicy, P),
    (237, SetMempolicy, P),
    (238, MigratePages, P),
    (239, MovePages, NI),
    (240, RtTgsigqueueinfo, NYS),
    (241, PerfEventOpen, P),
    (242, Accept4, P),
    (243, Recvmmsg, C),
    (260, Wait4, P),
    (261, Prlimit64, P),
    (262, FanotifyInit, P),
    (263, FanotifyMark, P),
    (264, NameToHandleAt, P),
    (265, OpenByHandleAt, C),
    (266, ClockAdjtime, P),
    (267, Syncfs, P),
    (268, Setns, P),
    (269, Sendmmsg, C),
    (270, ProcessVmReadv, NI),
    (271, ProcessVmWritev, NI),
    (272, Kcmp, P),
    (273, FinitModule, P),
    (274, SchedSetattr, P),
    (275, SchedGetattr, P),
    (276, Renameat2, P),
    (277, Seccomp, NI),
    (278, Getrandom, P),
    (279, MemfdCreate, P),
    (280, Bpf, NI),
    (281, Execveat, NI),
    (282, Userfaultfd, P),
    (283, Membarrier, P),
    (284, Mlock2, P),
    (285, CopyFileRange, P),
    (286, Preadv2, C),
    (287, Pwritev2, C),
    (288, PkeyMprotect, P),
    (289, PkeyAlloc, P),
    (290, PkeyFree, P),
    (291, Statx, P),
    (292, IoPgetevents, NI),
    (293, Rseq, NI),
    (294, KexecFileLoad, NI),
    (424, PidfdSendSignal, P),
    (425, IoUringSetup, NI),
    (426, IoUringEnter, NI),
    (427, IoUringRegister, NI),
    (428, OpenTree, P),
    (429, MoveMount, P),
    (430, Fsopen, P),
    (431, Fsconfig, P),
    (432, Fsmount, P),
    (433, Fspick, P),
    (434, PidfdOpen, P),
    (435, Clone3, NYS),
    (436, CloseRange, P),
    (437, Openat2, C),
    (438, PidfdGetfd, P),
    (439, Faccessat2, P),
    (440, ProcessMadvise, NI),
    (441, EpollPwait2, C),
    (442, MountSetattr, P),
    (443, QuotactlFd, P),
    (444, LandlockCreateRuleset, P),
    (445, LandlockAddRule, P),
    (446, LandlockRestrictSelf, P),
    (447, MemfdSecret, P),
    (448, ProcessMrelease, P),
    (449, FutexWaitv, C),
    (450, SetMempolicyHomeNode, P),
    (451, Cachestat, P),
    (452, Fchmodat2, P),
];
