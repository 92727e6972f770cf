//! Records whose ARM64 layout differs from x86_64. Everything else an ARM64
//! guest passes is already neutral.

use super::{neutral, record_pair};

/// asm-generic `struct stat`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub st_dev: u64,
    pub st_ino: u64,
    pub st_mode: u32,
    pub st_nlink: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_rdev: u64,
    pub __pad1: u64,
    pub st_size: i64,
    pub st_blksize: i32,
    pub __pad2: i32,
    pub st_blocks: i64,
    pub st_atime: i64,
    pub st_atime_nsec: i64,
    pub st_mtime: i64,
    pub st_mtime_nsec: i64,
    pub st_ctime: i64,
    pub st_ctime_nsec: i64,
    pub __unused4: u32,
    pub __unused5: u32,
}

record_pair!(Stat => neutral::Stat {
    st_dev, st_ino, st_mode, st_nlink, st_uid, st_gid, st_rdev, st_size, st_blksize,
    st_blocks, st_atime, st_atime_nsec, st_mtime, st_mtime_nsec, st_ctime, st_ctime_nsec,
});

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpollEvent {
    pub events: u32,
    pub __pad: u32,
    pub data: u64,
}

record_pair!(EpollEvent => neutral::EpollEvent { events, data });

/// asm-generic `semid64_ds` without the x86_64 padding words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SemidDs {
    pub sem_perm: neutral::IpcPerm,
    pub sem_otime: i64,
    pub sem_ctime: i64,
    pub sem_nsems: u64,
    pub __unused3: u64,
    pub __unused4: u64,
}

record_pair!(SemidDs => neutral::SemidDs { sem_otime, sem_ctime, sem_nsems } nested { sem_perm });

const _: () = assert!(size_of::<Stat>() == 128);
const _: () = assert!(std::mem::offset_of!(Stat, st_blocks) == 64);
const _: () = assert!(size_of::<EpollEvent>() == 16);
const _: () = assert!(size_of::<SemidDs>() == 88);
