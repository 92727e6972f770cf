//! 32-bit (ILP32) kernel layouts shared by ARM EABI guests and i386 hosts.

use super::{Record, neutral, record_pair};
use crate::errno::Errno;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timespec {
    pub tv_sec: i32,
    pub tv_nsec: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeval {
    pub tv_sec: i32,
    pub tv_usec: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Itimerval {
    pub it_interval: Timeval,
    pub it_value: Timeval,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Itimerspec {
    pub it_interval: Timespec,
    pub it_value: Timespec,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tms {
    pub tms_utime: i32,
    pub tms_stime: i32,
    pub tms_cutime: i32,
    pub tms_cstime: i32,
}

pub const RLIM_INFINITY: u32 = u32::MAX;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rlimit {
    pub rlim_cur: u32,
    pub rlim_max: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rusage {
    pub ru_utime: Timeval,
    pub ru_stime: Timeval,
    pub ru_maxrss: i32,
    pub ru_ixrss: i32,
    pub ru_idrss: i32,
    pub ru_isrss: i32,
    pub ru_minflt: i32,
    pub ru_majflt: i32,
    pub ru_nswap: i32,
    pub ru_inblock: i32,
    pub ru_oublock: i32,
    pub ru_msgsnd: i32,
    pub ru_msgrcv: i32,
    pub ru_nsignals: i32,
    pub ru_nvcsw: i32,
    pub ru_nivcsw: i32,
}

/// The pre-LFS `struct stat` with 16-bit ids.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub st_dev: u32,
    pub st_ino: u32,
    pub st_mode: u16,
    pub st_nlink: u16,
    pub st_uid: u16,
    pub st_gid: u16,
    pub st_rdev: u32,
    pub st_size: u32,
    pub st_blksize: u32,
    pub st_blocks: u32,
    pub st_atime: u32,
    pub st_atime_nsec: u32,
    pub st_mtime: u32,
    pub st_mtime_nsec: u32,
    pub st_ctime: u32,
    pub st_ctime_nsec: u32,
    pub __unused4: u32,
    pub __unused5: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statfs {
    pub f_type: u32,
    pub f_bsize: u32,
    pub f_blocks: u32,
    pub f_bfree: u32,
    pub f_bavail: u32,
    pub f_files: u32,
    pub f_ffree: u32,
    pub f_fsid: [i32; 2],
    pub f_namelen: u32,
    pub f_frsize: u32,
    pub f_flags: u32,
    pub f_spare: [u32; 4],
}

#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Statfs64 {
    pub f_type: u32,
    pub f_bsize: u32,
    pub f_blocks: u64,
    pub f_bfree: u64,
    pub f_bavail: u64,
    pub f_files: u64,
    pub f_ffree: u64,
    pub f_fsid: [i32; 2],
    pub f_namelen: u32,
    pub f_frsize: u32,
    pub f_flags: u32,
    pub f_spare: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sysinfo {
    pub uptime: i32,
    pub loads: [u32; 3],
    pub totalram: u32,
    pub freeram: u32,
    pub sharedram: u32,
    pub bufferram: u32,
    pub totalswap: u32,
    pub freeswap: u32,
    pub procs: u16,
    pub pad: u16,
    pub totalhigh: u32,
    pub freehigh: u32,
    pub mem_unit: u32,
    pub _f: [u8; 8],
}

/// `struct flock` with 32-bit offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flock {
    pub l_type: i16,
    pub l_whence: i16,
    pub l_start: i32,
    pub l_len: i32,
    pub l_pid: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MqAttr {
    pub mq_flags: i32,
    pub mq_maxmsg: i32,
    pub mq_msgsize: i32,
    pub mq_curmsgs: i32,
    pub __reserved: [i32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Siginfo {
    pub si_signo: i32,
    pub si_errno: i32,
    pub si_code: i32,
    pub si_pid: i32,
    pub si_uid: u32,
    pub si_status: i32,
    pub si_utime: i32,
    pub si_stime: i32,
    pub __rest: [u32; 24],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sigevent {
    pub sigev_value: u32,
    pub sigev_signo: i32,
    pub sigev_notify: i32,
    pub sigev_tid: i32,
    pub __pad: [i32; 12],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timex {
    pub modes: u32,
    pub offset: i32,
    pub freq: i32,
    pub maxerror: i32,
    pub esterror: i32,
    pub status: i32,
    pub constant: i32,
    pub precision: i32,
    pub tolerance: i32,
    pub time: Timeval,
    pub tick: i32,
    pub ppsfreq: i32,
    pub jitter: i32,
    pub shift: i32,
    pub stabil: i32,
    pub jitcnt: i32,
    pub calcnt: i32,
    pub errcnt: i32,
    pub stbcnt: i32,
    pub tai: i32,
    pub __reserved: [i32; 11],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpcPerm {
    pub key: i32,
    pub uid: u32,
    pub gid: u32,
    pub cuid: u32,
    pub cgid: u32,
    pub mode: u16,
    pub __pad1: u16,
    pub seq: u16,
    pub __pad2: u16,
    pub __unused1: u32,
    pub __unused2: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SemidDs {
    pub sem_perm: IpcPerm,
    pub sem_otime: u32,
    pub sem_otime_high: u32,
    pub sem_ctime: u32,
    pub sem_ctime_high: u32,
    pub sem_nsems: u32,
    pub __unused3: u32,
    pub __unused4: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsqidDs {
    pub msg_perm: IpcPerm,
    pub msg_stime: u32,
    pub msg_stime_high: u32,
    pub msg_rtime: u32,
    pub msg_rtime_high: u32,
    pub msg_ctime: u32,
    pub msg_ctime_high: u32,
    pub msg_cbytes: u32,
    pub msg_qnum: u32,
    pub msg_qbytes: u32,
    pub msg_lspid: i32,
    pub msg_lrpid: i32,
    pub __unused4: u32,
    pub __unused5: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShmidDs {
    pub shm_perm: IpcPerm,
    pub shm_segsz: u32,
    pub shm_atime: u32,
    pub shm_atime_high: u32,
    pub shm_dtime: u32,
    pub shm_dtime_high: u32,
    pub shm_ctime: u32,
    pub shm_ctime_high: u32,
    pub shm_cpid: i32,
    pub shm_lpid: i32,
    pub shm_nattch: u32,
    pub __unused4: u32,
    pub __unused5: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shminfo {
    pub shmmax: u32,
    pub shmmin: u32,
    pub shmmni: u32,
    pub shmseg: u32,
    pub shmall: u32,
    pub __unused: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShmInfo {
    pub used_ids: i32,
    pub shm_tot: u32,
    pub shm_rss: u32,
    pub shm_swp: u32,
    pub swap_attempts: u32,
    pub swap_successes: u32,
}

record_pair!(Timespec => neutral::Timespec { tv_sec, tv_nsec });
record_pair!(Timeval => neutral::Timeval { tv_sec, tv_usec });
record_pair!(Itimerval => neutral::Itimerval {} nested { it_interval, it_value });
record_pair!(Itimerspec => neutral::Itimerspec {} nested { it_interval, it_value });
record_pair!(Tms => neutral::Tms { tms_utime, tms_stime, tms_cutime, tms_cstime });
record_pair!(Rusage => neutral::Rusage {
    ru_maxrss, ru_ixrss, ru_idrss, ru_isrss, ru_minflt, ru_majflt, ru_nswap,
    ru_inblock, ru_oublock, ru_msgsnd, ru_msgrcv, ru_nsignals, ru_nvcsw, ru_nivcsw,
} nested { ru_utime, ru_stime });
record_pair!(Statfs64 => neutral::Statfs {
    f_type, f_bsize, f_blocks, f_bfree, f_bavail, f_files, f_ffree,
    f_namelen, f_frsize, f_flags,
} arrays { f_fsid, f_spare });
record_pair!(Flock => neutral::Flock64 { l_type, l_whence, l_start, l_len, l_pid });
record_pair!(MqAttr => neutral::MqAttr { mq_flags, mq_maxmsg, mq_msgsize, mq_curmsgs });
record_pair!(Siginfo => neutral::Siginfo {
    si_signo, si_errno, si_code, si_pid, si_uid, si_status, si_utime, si_stime,
});
record_pair!(Sigevent => neutral::Sigevent { sigev_value, sigev_signo, sigev_notify, sigev_tid });
record_pair!(Timex => neutral::Timex {
    modes, offset, freq, maxerror, esterror, status, constant, precision, tolerance,
    tick, ppsfreq, jitter, shift, stabil, jitcnt, calcnt, errcnt, stbcnt, tai,
} nested { time });
record_pair!(Shminfo => neutral::Shminfo { shmmax, shmmin, shmmni, shmseg, shmall });
record_pair!(ShmInfo => neutral::ShmInfo {
    used_ids, shm_tot, shm_rss, shm_swp, swap_attempts, swap_successes,
});
record_pair!(IpcPerm => neutral::IpcPerm { key, uid, gid, cuid, cgid, mode, seq });

impl Record for Rlimit {
    type Neutral = neutral::Rlimit64;

    fn to_neutral(&self) -> neutral::Rlimit64 {
        let widen = |v: u32| {
            if v == RLIM_INFINITY {
                neutral::RLIM64_INFINITY
            } else {
                v as u64
            }
        };
        neutral::Rlimit64 {
            rlim_cur: widen(self.rlim_cur),
            rlim_max: widen(self.rlim_max),
        }
    }

    fn from_neutral(n: &neutral::Rlimit64) -> Self {
        let narrow = |v: u64| u32::try_from(v).unwrap_or(RLIM_INFINITY);
        Rlimit {
            rlim_cur: narrow(n.rlim_cur),
            rlim_max: narrow(n.rlim_max),
        }
    }
}

/// Join a split 64-bit time.
fn join(low: u32, high: u32) -> i64 {
    ((high as u64) << 32 | low as u64) as i64
}

fn split(t: i64) -> (u32, u32) {
    (t as u32, ((t as u64) >> 32) as u32)
}

impl Record for SemidDs {
    type Neutral = neutral::SemidDs;

    fn to_neutral(&self) -> neutral::SemidDs {
        neutral::SemidDs {
            sem_perm: self.sem_perm.to_neutral(),
            sem_otime: join(self.sem_otime, self.sem_otime_high),
            sem_ctime: join(self.sem_ctime, self.sem_ctime_high),
            sem_nsems: self.sem_nsems as u64,
            ..Default::default()
        }
    }

    fn from_neutral(n: &neutral::SemidDs) -> Self {
        let (sem_otime, sem_otime_high) = split(n.sem_otime);
        let (sem_ctime, sem_ctime_high) = split(n.sem_ctime);
        SemidDs {
            sem_perm: IpcPerm::from_neutral(&n.sem_perm),
            sem_otime,
            sem_otime_high,
            sem_ctime,
            sem_ctime_high,
            sem_nsems: n.sem_nsems as u32,
            ..Default::default()
        }
    }
}

impl Record for MsqidDs {
    type Neutral = neutral::MsqidDs;

    fn to_neutral(&self) -> neutral::MsqidDs {
        neutral::MsqidDs {
            msg_perm: self.msg_perm.to_neutral(),
            msg_stime: join(self.msg_stime, self.msg_stime_high),
            msg_rtime: join(self.msg_rtime, self.msg_rtime_high),
            msg_ctime: join(self.msg_ctime, self.msg_ctime_high),
            msg_cbytes: self.msg_cbytes as u64,
            msg_qnum: self.msg_qnum as u64,
            msg_qbytes: self.msg_qbytes as u64,
            msg_lspid: self.msg_lspid,
            msg_lrpid: self.msg_lrpid,
            ..Default::default()
        }
    }

    fn from_neutral(n: &neutral::MsqidDs) -> Self {
        let (msg_stime, msg_stime_high) = split(n.msg_stime);
        let (msg_rtime, msg_rtime_high) = split(n.msg_rtime);
        let (msg_ctime, msg_ctime_high) = split(n.msg_ctime);
        MsqidDs {
            msg_perm: IpcPerm::from_neutral(&n.msg_perm),
            msg_stime,
            msg_stime_high,
            msg_rtime,
            msg_rtime_high,
            msg_ctime,
            msg_ctime_high,
            msg_cbytes: n.msg_cbytes as u32,
            msg_qnum: n.msg_qnum as u32,
            msg_qbytes: n.msg_qbytes as u32,
            msg_lspid: n.msg_lspid,
            msg_lrpid: n.msg_lrpid,
            ..Default::default()
        }
    }
}

impl Record for ShmidDs {
    type Neutral = neutral::ShmidDs;

    fn to_neutral(&self) -> neutral::ShmidDs {
        neutral::ShmidDs {
            shm_perm: self.shm_perm.to_neutral(),
            shm_segsz: self.shm_segsz as u64,
            shm_atime: join(self.shm_atime, self.shm_atime_high),
            shm_dtime: join(self.shm_dtime, self.shm_dtime_high),
            shm_ctime: join(self.shm_ctime, self.shm_ctime_high),
            shm_cpid: self.shm_cpid,
            shm_lpid: self.shm_lpid,
            shm_nattch: self.shm_nattch as u64,
            ..Default::default()
        }
    }

    fn from_neutral(n: &neutral::ShmidDs) -> Self {
        let (shm_atime, shm_atime_high) = split(n.shm_atime);
        let (shm_dtime, shm_dtime_high) = split(n.shm_dtime);
        let (shm_ctime, shm_ctime_high) = split(n.shm_ctime);
        ShmidDs {
            shm_perm: IpcPerm::from_neutral(&n.shm_perm),
            shm_segsz: n.shm_segsz as u32,
            shm_atime,
            shm_atime_high,
            shm_dtime,
            shm_dtime_high,
            shm_ctime,
            shm_ctime_high,
            shm_cpid: n.shm_cpid,
            shm_lpid: n.shm_lpid,
            shm_nattch: n.shm_nattch as u32,
            ..Default::default()
        }
    }
}

/// Old-style 16-bit id: ids that do not fit become the overflow id.
pub fn high2lowuid(id: u32) -> u16 {
    if id & !0xffff != 0 { 65534 } else { id as u16 }
}

/// Widen a 16-bit id; the all-ones value keeps meaning "unchanged".
pub fn low2highuid(id: u16) -> u32 {
    if id == u16::MAX { u32::MAX } else { id as u32 }
}

/// Narrow a neutral `stat` into the pre-LFS layout.
pub fn narrow_stat(st: &neutral::Stat) -> Result<Stat, Errno> {
    let ino = u32::try_from(st.st_ino).map_err(|_| Errno::EOVERFLOW)?;
    let nlink = u16::try_from(st.st_nlink).map_err(|_| Errno::EOVERFLOW)?;
    let size = u32::try_from(st.st_size)
        .ok()
        .filter(|&s| s <= i32::MAX as u32)
        .ok_or(Errno::EOVERFLOW)?;
    let dev = encode_dev32(st.st_dev).ok_or(Errno::EOVERFLOW)?;
    let rdev = encode_dev32(st.st_rdev).ok_or(Errno::EOVERFLOW)?;
    Ok(Stat {
        st_dev: dev,
        st_ino: ino,
        st_mode: st.st_mode as u16,
        st_nlink: nlink,
        st_uid: high2lowuid(st.st_uid),
        st_gid: high2lowuid(st.st_gid),
        st_rdev: rdev,
        st_size: size,
        st_blksize: st.st_blksize as u32,
        st_blocks: st.st_blocks as u32,
        st_atime: st.st_atime as u32,
        st_atime_nsec: st.st_atime_nsec as u32,
        st_mtime: st.st_mtime as u32,
        st_mtime_nsec: st.st_mtime_nsec as u32,
        st_ctime: st.st_ctime as u32,
        st_ctime_nsec: st.st_ctime_nsec as u32,
        ..Default::default()
    })
}

/// Encode a device number into the 32-bit `dev_t`, if it fits.
fn encode_dev32(dev: u64) -> Option<u32> {
    let major = ((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0xfff);
    let minor = ((dev >> 12) & 0xffff_ff00) | (dev & 0xff);
    if major >= 4096 || minor >= 1 << 20 {
        return None;
    }
    Some(((minor & 0xff) | (major << 8) | ((minor & !0xff) << 12)) as u32)
}

/// Narrow a neutral `statfs` into the 32-bit layout.
pub fn narrow_statfs(st: &neutral::Statfs) -> Result<Statfs, Errno> {
    let narrow = |v: u64| u32::try_from(v).map_err(|_| Errno::EOVERFLOW);
    // Unknown file counts are reported as all ones on 64-bit hosts.
    let files = |v: u64| if v == u64::MAX { Ok(u32::MAX) } else { narrow(v) };
    Ok(Statfs {
        f_type: st.f_type as u32,
        f_bsize: st.f_bsize as u32,
        f_blocks: narrow(st.f_blocks)?,
        f_bfree: narrow(st.f_bfree)?,
        f_bavail: narrow(st.f_bavail)?,
        f_files: files(st.f_files)?,
        f_ffree: files(st.f_ffree)?,
        f_fsid: st.f_fsid,
        f_namelen: st.f_namelen as u32,
        f_frsize: st.f_frsize as u32,
        f_flags: st.f_flags as u32,
        f_spare: [0; 4],
    })
}

/// Narrow a neutral `sysinfo`, scaling the memory fields up by `mem_unit`
/// until they fit in 32 bits.
pub fn narrow_sysinfo(info: &neutral::Sysinfo) -> Sysinfo {
    let mut s = *info;
    let fields = |s: &neutral::Sysinfo| {
        [
            s.totalram, s.freeram, s.sharedram, s.bufferram, s.totalswap, s.freeswap, s.totalhigh,
            s.freehigh,
        ]
    };
    while fields(&s).iter().any(|&v| v > u32::MAX as u64) && s.mem_unit < (1 << 31) {
        s.totalram >>= 1;
        s.freeram >>= 1;
        s.sharedram >>= 1;
        s.bufferram >>= 1;
        s.totalswap >>= 1;
        s.freeswap >>= 1;
        s.totalhigh >>= 1;
        s.freehigh >>= 1;
        s.mem_unit = s.mem_unit.max(1) << 1;
    }
    Sysinfo {
        uptime: s.uptime as i32,
        loads: s.loads.map(|l| l as u32),
        totalram: s.totalram as u32,
        freeram: s.freeram as u32,
        sharedram: s.sharedram as u32,
        bufferram: s.bufferram as u32,
        totalswap: s.totalswap as u32,
        freeswap: s.freeswap as u32,
        procs: s.procs,
        pad: 0,
        totalhigh: s.totalhigh as u32,
        freehigh: s.freehigh as u32,
        mem_unit: s.mem_unit,
        _f: [0; 8],
    }
}

impl Record for Sysinfo {
    type Neutral = neutral::Sysinfo;

    fn to_neutral(&self) -> neutral::Sysinfo {
        neutral::Sysinfo {
            uptime: self.uptime as i64,
            loads: self.loads.map(|l| l as u64),
            totalram: self.totalram as u64,
            freeram: self.freeram as u64,
            sharedram: self.sharedram as u64,
            bufferram: self.bufferram as u64,
            totalswap: self.totalswap as u64,
            freeswap: self.freeswap as u64,
            procs: self.procs,
            totalhigh: self.totalhigh as u64,
            freehigh: self.freehigh as u64,
            mem_unit: self.mem_unit,
            ..Default::default()
        }
    }

    fn from_neutral(n: &neutral::Sysinfo) -> Self {
        narrow_sysinfo(n)
    }
}

const _: () = assert!(size_of::<Timespec>() == 8);
const _: () = assert!(size_of::<Itimerval>() == 16);
const _: () = assert!(size_of::<Tms>() == 16);
const _: () = assert!(size_of::<Rusage>() == 72);
const _: () = assert!(size_of::<Stat>() == 64);
const _: () = assert!(size_of::<Statfs>() == 64);
const _: () = assert!(size_of::<Statfs64>() == 84);
const _: () = assert!(size_of::<Sysinfo>() == 64);
const _: () = assert!(size_of::<Flock>() == 16);
const _: () = assert!(size_of::<MqAttr>() == 32);
const _: () = assert!(size_of::<Siginfo>() == 128);
const _: () = assert!(std::mem::offset_of!(Siginfo, si_utime) == 24);
const _: () = assert!(size_of::<Sigevent>() == 64);
const _: () = assert!(size_of::<Timex>() == 128);
const _: () = assert!(size_of::<IpcPerm>() == 36);
const _: () = assert!(size_of::<SemidDs>() == 64);
const _: () = assert!(size_of::<MsqidDs>() == 88);
const _: () = assert!(size_of::<ShmidDs>() == 84);
const _: () = assert!(size_of::<Shminfo>() == 36);
const _: () = assert!(size_of::<ShmInfo>() == 24);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlimit_infinity_survives_both_directions() {
        let wide = Rlimit {
            rlim_cur: 1024,
            rlim_max: RLIM_INFINITY,
        }
        .to_neutral();
        assert_eq!(wide.rlim_cur, 1024);
        assert_eq!(wide.rlim_max, neutral::RLIM64_INFINITY);

        let narrow = Rlimit::from_neutral(&neutral::Rlimit64 {
            rlim_cur: 1 << 40,
            rlim_max: neutral::RLIM64_INFINITY,
        });
        assert_eq!(narrow.rlim_cur, RLIM_INFINITY);
        assert_eq!(narrow.rlim_max, RLIM_INFINITY);
    }

    #[test]
    fn stat_overflow_is_reported() {
        let st = neutral::Stat {
            st_ino: 1 << 33,
            ..Default::default()
        };
        assert_eq!(narrow_stat(&st), Err(Errno::EOVERFLOW));

        let st = neutral::Stat {
            st_ino: 42,
            st_nlink: 1,
            st_uid: 100_000,
            st_size: 4096,
            ..Default::default()
        };
        let narrow = narrow_stat(&st).unwrap();
        assert_eq!(narrow.st_ino, 42);
        assert_eq!(narrow.st_uid, 65534);
        assert_eq!(narrow.st_size, 4096);
    }

    #[test]
    fn sysinfo_scales_large_memory() {
        let info = neutral::Sysinfo {
            totalram: 16 << 30,
            freeram: 8 << 30,
            mem_unit: 1,
            ..Default::default()
        };
        let narrow = narrow_sysinfo(&info);
        let unit = narrow.mem_unit as u64;
        assert!(unit > 1);
        assert_eq!(narrow.totalram as u64 * unit, 16 << 30);
        assert_eq!(narrow.freeram as u64 * unit, 8 << 30);
    }

    #[test]
    fn ipc_times_keep_their_high_halves() {
        let wide = neutral::SemidDs {
            sem_otime: 0x1_2345_6789,
            sem_nsems: 3,
            ..Default::default()
        };
        let narrow = SemidDs::from_neutral(&wide);
        assert_eq!(narrow.sem_otime, 0x2345_6789);
        assert_eq!(narrow.sem_otime_high, 1);
        assert_eq!(narrow.to_neutral().sem_otime, 0x1_2345_6789);
    }

    #[test]
    fn uid16_mapping() {
        assert_eq!(high2lowuid(1000), 1000);
        assert_eq!(high2lowuid(70_000), 65534);
        assert_eq!(low2highuid(u16::MAX), u32::MAX);
        assert_eq!(low2highuid(0), 0);
    }
}
