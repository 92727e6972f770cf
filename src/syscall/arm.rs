//! ARM EABI syscall numbers.
//!
//! Numbers the EABI leaves unused (OABI-only calls and removed slots) are
//! absent and therefore rejected by `resolve`.

use super::{Policy, Sysno::*};

const P: Policy = Policy::Passthrough;
const C: Policy = Policy::Custom;
const NYS: Policy = Policy::NotYetSupported;
const NI: Policy = Policy::NotImplemented;

pub(super) const ENTRIES: &[(u32, super::Sysno, Policy)] = &[
    (0, RestartSyscall, P),
    (1, Exit, P),
    (2, Fork, P),
    (3, Read, P),
    (4, Write, P),
    (5, Open, C),
    (6, Close, P),
    (8, Creat, P),
    (9, Link, P),
    (10, Unlink, P),
    (11, Execve, C),
    (12, Chdir, P),
    (14, Mknod, P),
    (15, Chmod, P),
    (16, Lchown16, C),
    (19, Lseek, C),
    (20, Getpid, P),
    (21, Mount, P),
    (23, Setuid16, C),
    (24, Getuid16, C),
    (26, Ptrace, NYS),
    (29, Pause, P),
    (33, Access, P),
    (34, Nice, C),
    (36, Sync, P),
    (37, Kill, P),
    (38, Rename, P),
    (39, Mkdir, P),
    (40, Rmdir, P),
    (41, Dup, P),
    (42, Pipe, P),
    (43, Times, C),
    (45, Brk, NYS),
    (46, Setgid16, C),
    (47, Getgid16, C),
    (49, Geteuid16, C),
    (50, Getegid16, C),
    (51, Acct, P),
    (52, Umount2, P),
    (54, Ioctl, C),
    (55, Fcntl, C),
    (57, Setpgid, P),
    (60, Umask, P),
    (61, Chroot, P),
    (62, Ustat, NI),
    (63, Dup2, P),
    (64, Getppid, P),
    (65, Getpgrp, P),
    (66, Setsid, P),
    (67, Sigaction, NYS),
    (70, Setreuid16, C),
    (71, Setregid16, C),
    (72, Sigsuspend, NYS),
    (73, Sigpending, NYS),
    (74, Sethostname, P),
    (75, Setrlimit, C),
    (77, Getrusage, C),
    (78, Gettimeofday, C),
    (79, Settimeofday, C),
    (80, Getgroups16, C),
    (81, Setgroups16, C),
    (83, Symlink, P),
    (85, Readlink, P),
    (86, Uselib, P),
    (87, Swapon, P),
    (88, Reboot, P),
    (91, Munmap, P),
    (92, Truncate, P),
    (93, Ftruncate, P),
    (94, Fchmod, P),
    (95, Fchown16, C),
    (96, Getpriority, P),
    (97, Setpriority, P),
    (99, Statfs, C),
    (100, Fstatfs, C),
    (103, Syslog, P),
    (104, Setitimer, C),
    (105, Getitimer, C),
    (106, Stat, C),
    (107, Lstat, C),
    (108, Fstat, C),
    (111, Vhangup, P),
    (114, Wait4, C),
    (115, Swapoff, P),
    (116, Sysinfo, C),
    (118, Fsync, P),
    (119, Sigreturn, NYS),
    (120, Clone, NYS),
    (121, Setdomainname, P),
    (122, Uname, P),
    (124, Adjtimex, C),
    (125, Mprotect, P),
    (126, Sigprocmask, NYS),
    (128, InitModule, P),
    (129, DeleteModule, P),
    (131, Quotactl, P),
    (132, Getpgid, P),
    (133, Fchdir, P),
    (134, Bdflush, NI),
    (135, Sysfs, NI),
    (136, Personality, P),
    (138, Setfsuid16, C),
    (139, Setfsgid16, C),
    (140, Llseek, C),
    (141, Getdents, C),
    (142, Select, C),
    (143, Flock, P),
    (144, Msync, P),
    (145, Readv, C),
    (146, Writev, C),
    (147, Getsid, P),
    (148, Fdatasync, P),
    (149, Sysctl, NI),
    (150, Mlock, P),
    (151, Munlock, P),
    (152, Mlockall, P),
    (153, Munlockall, P),
    (154, SchedSetparam, P),
    (155, SchedGetparam, P),
    (156, SchedSetscheduler, P),
    (157, SchedGetscheduler, P),
    (158, SchedYield, P),
    (159, SchedGetPriorityMax, P),
    (160, SchedGetPriorityMin, P),
    (161, SchedRrGetInterval, C),
    (162, Nanosleep, C),
    (163, Mremap, C),
    (164, Setresuid16, C),
    (165, Getresuid16, C),
    (168, Poll, P),
    (169, Nfsservctl, NI),
    (170, Setresgid16, C),
    (171, Getresgid16, C),
    (172, Prctl, C),
    (173, RtSigreturn, NYS),
    (174, RtSigaction, NYS),
    (175, RtSigprocmask, NYS),
    (176, RtSigpending, NYS),
    (177, RtSigtimedwait, NYS),
    (178, RtSigqueueinfo, NYS),
    (179, RtSigsuspend, NYS),
    (180, Pread64, C),
    (181, Pwrite64, C),
    (182, Chown16, C),
    (183, Getcwd, P),
    (184, Capget, P),
    (185, Capset, P),
    (186, Sigaltstack, NYS),
    (187, Sendfile, C),
    (190, Vfork, C),
    (191, Getrlimit, C),
    (192, Mmap2, C),
    (193, Truncate64, C),
    (194, Ftruncate64, C),
    (195, Stat64, C),
    (196, Lstat64, C),
    (197, Fstat64, C),
    (198, Lchown, P),
    (199, Getuid, P),
    (200, Getgid, P),
    (201, Geteuid, P),
    (202, Getegid, P),
    (203, Setreuid, P),
    (204, Setregid, P),
    (205, Getgroups, P),
    (206, Setgroups, P),
    (207, Fchown, P),
    (208, Setresuid, P),
    (209, Getresuid, P),
    (210, Setresgid, P),
    (211, Getresgid, P),
    (212, Chown, P),
    (213, Setuid, P),
    (214, Setgid, P),
    (215, Setfsuid, P),
    (216, Setfsgid, P),
    (217, Getdents64, P),
    (218, PivotRoot, P),
    (219, Mincore, P),
    (220, Madvise, P),
    (221, Fcntl64, C),
    (224, Gettid, P),
    (225, Readahead, C),
    (226, Setxattr, P),
    (227, Lsetxattr, P),
    (228, Fsetxattr, P),
    (229, Getxattr, P),
    (230, Lgetxattr, P),
    (231, Fgetxattr, P),
    (232, Listxattr, P),
    (233, Llistxattr, P),
    (234, Flistxattr, P),
    (235, Removexattr, P),
    (236, Lremovexattr, P),
    (237, Fremovexattr, P),
    (238, Tkill, P),
    (239, Sendfile64, P),
    (240, Futex, C),
    (241, SchedSetaffinity, P),
    (242, SchedGetaffinity, P),
    (243, IoSetup, NI),
    (244, IoDestroy, NI),
    (245, IoGetevents, NI),
    (246, IoSubmit, NI),
    (247, IoCancel, NI),
    (248, ExitGroup, P),
    (249, LookupDcookie, NI),
    (250, EpollCreate, P),
    (251, EpollCtl, C),
    (252, EpollWait, C),
    (253, RemapFilePages, P),
    (256, SetTidAddress, P),
    (257, TimerCreate, C),
    (258, TimerSettime, C),
    (259, TimerGettime, C),
    (260, TimerGetoverrun, P),
    (261, TimerDelete, P),
    (262, ClockSettime, C),
    (263, ClockGettime, C),
    (264, ClockGetres, C),
    (265, ClockNanosleep, C),
    (266, Statfs64, C),
    (267, Fstatfs64, C),
    (268, Tgkill, P),
    (269, Utimes, C),
    (270, ArmFadvise64_64, C),
    (271, PciconfigIobase, NI),
    (272, PciconfigRead, NI),
    (273, PciconfigWrite, NI),
    (274, MqOpen, C),
    (275, MqUnlink, P),
    (276, MqTimedsend, C),
    (277, MqTimedreceive, C),
    (278, MqNotify, C),
    (279, MqGetsetattr, C),
    (280, Waitid, C),
    (281, Socket, P),
    (282, Bind, P),
    (283, Connect, P),
    (284, Listen, P),
    (285, Accept, P),
    (286, Getsockname, P),
    (287, Getpeername, P),
    (288, Socketpair, P),
    (289, Send, C),
    (290, Sendto, P),
    (291, Recv, C),
    (292, Recvfrom, P),
    (293, Shutdown, P),
    (294, Setsockopt, C),
    (295, Getsockopt, C),
    (296, Sendmsg, C),
    (297, Recvmsg, C),
    (298, Semop, P),
    (299, Semget, P),
    (300, Semctl, C),
    (301, Msgsnd, C),
    (302, Msgrcv, C),
    (303, Msgget, P),
    (304, Msgctl, C),
    (305, Shmat, C),
    (306, Shmdt, C),
    (307, Shmget, P),
    (308, Shmctl, C),
    (309, AddKey, P),
    (310, RequestKey, P),
    (311, Keyctl, NI),
    (312, Semtimedop, C),
    (313, Vserver, NI),
    (314, IoprioSet, P),
    (315, IoprioGet, P),
    (316, InotifyInit, P),
    (317, InotifyAddWatch, P),
    (318, InotifyRmWatch, P),
    (319, Mbind, P),
    (320, GetMempolicy, P),
    (321, SetMempolicy, P),
    (322, Openat, C),
    (323, Mkdirat, P),
    (324, Mknodat, P),
    (325, Fchownat, P),
    (326, Futimesat, C),
    (327, Fstatat64, C),
    (328, Unlinkat, P),
    (329, Renameat, P),
    (330, Linkat, P),
    (331, Symlinkat, P),
    (332, Readlinkat, P),
    (333, Fchmodat, P),
    (334, Faccessat, P),
    (335, Pselect6, C),
    (336, Ppoll, C),
    (337, Unshare, P),
    (338, SetRobustList, NI),
    (339, GetRobustList, NI),
    (340, Splice, P),
    (341, SyncFileRange2, C),
    (342, Tee, P),
    (343, Vmsplice, C),
    (344, MovePages, NI),
    (345, Getcpu, P),
    (346, EpollPwait, C),
    (347, KexecLoad, NI),
    (348, Utimensat, C),
    (349, Signalfd, P),
    (350, TimerfdCreate, P),
    (351, Eventfd, P),
    (352, Fallocate, C),
    (353, TimerfdSettime, C),
    (354, TimerfdGettime, C),
    (355, Signalfd4, P),
    (356, Eventfd2, P),
    (357, EpollCreate1, P),
    (358, Dup3, P),
    (359, Pipe2, P),
    (360, InotifyInit1, P),
    (361, Preadv, C),
    (362, Pwritev, C),
    (363, RtTgsigqueueinfo, NYS),
    (364, PerfEventOpen, P),
    (365, Recvmmsg, C),
    (366, Accept4, P),
    (367, FanotifyInit, P),
    (368, FanotifyMark, C),
    (369, Prlimit64, P),
    (370, NameToHandleAt, P),
    (371, OpenByHandleAt, C),
    (372, ClockAdjtime, C),
    (373, Syncfs, P),
    (374, Sendmmsg, C),
    (375, Setns, P),
    (376, ProcessVmReadv, NI),
    (377, ProcessVmWritev, NI),
    (378, Kcmp, P),
    (379, FinitModule, P),
    (380, SchedSetattr, P),
    (381, SchedGetattr, P),
    (382, Renameat2, P),
    (383, Seccomp, NI),
    (384, Getrandom, P),
    (385, MemfdCreate, P),
    (386, Bpf, NI),
    (387, Execveat, NI),
    (388, Userfaultfd, P),
    (389, Membarrier, P),
    (390, Mlock2, P),
    (391, CopyFileRange, P),
    (392, Preadv2, C),
    (393, Pwritev2, C),
    (394, PkeyMprotect, P),
    (395, PkeyAlloc, P),
    (396, PkeyFree, P),
    (397, Statx, P),
    (398, Rseq, NI),
    (399, IoPgetevents, NI),
    (400, MigratePages, P),
    (401, KexecFileLoad, NI),
    (403, ClockGettime64, P),
    (404, ClockSettime64, P),
    (405, ClockAdjtime64, P),
    (406, ClockGetresTime64, P),
    (407, ClockNanosleepTime64, P),
    (408, TimerGettime64, P),
    (409, TimerSettime64, P),
    (410, TimerfdGettime64, P),
    (411, TimerfdSettime64, P),
    (412, UtimensatTime64, P),
    (413, Pselect6Time64, C),
    (414, PpollTime64, P),
    (416, IoPgeteventsTime64, NI),
    (417, RecvmmsgTime64, C),
    (418, MqTimedsendTime64, P),
    (419, MqTimedreceiveTime64, P),
    (420, SemtimedopTime64, P),
    (421, RtSigtimedwaitTime64, NYS),
    (422, FutexTime64, C),
    (423, SchedRrGetIntervalTime64, P),
    (424, PidfdSendSignal, C),
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
    (448, ProcessMrelease, P),
    (449, FutexWaitv, C),
    (450, SetMempolicyHomeNode, P),
    (451, Cachestat, P),
    (452, Fchmodat2, P),
    (0x0f0001, ArmBreakpoint, NYS),
    (0x0f0002, ArmCacheflush, C),
    (0x0f0003, ArmUsr26, NI),
    (0x0f0004, ArmUsr32, NI),
    (0x0f0005, ArmSetTls, NYS),
    (0x0f0006, ArmGetTls, NYS),
];
