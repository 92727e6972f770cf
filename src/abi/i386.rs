//! i386 host records that differ from the ARM guest ones. i386 aligns
//! 64-bit members to four bytes.

use super::{neutral, record_pair};

pub use super::ilp32::{
    Flock, IpcPerm, Itimerval, MqAttr, MsqidDs, Rusage, SemidDs, ShmInfo, ShmidDs, Shminfo,
    Siginfo, Sigevent, Statfs64, Sysinfo, Timeval, Timex, Tms,
};

#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Stat64 {
    pub st_dev: u64,
    pub __pad0: [u8; 4],
    pub __st_ino: u32,
    pub st_mode: u32,
    pub st_nlink: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_rdev: u64,
    pub __pad3: [u8; 4],
    pub st_size: i64,
    pub st_blksize: u32,
    pub st_blocks: u64,
    pub st_atime: u32,
    pub st_atime_nsec: u32,
    pub st_mtime: u32,
    pub st_mtime_nsec: u32,
    pub st_ctime: u32,
    pub st_ctime_nsec: u32,
    pub st_ino: u64,
}

record_pair!(Stat64 => neutral::Stat {
    st_dev, st_ino, st_mode, st_nlink, st_uid, st_gid, st_rdev, st_size, st_blksize,
    st_blocks, st_atime, st_atime_nsec, st_mtime, st_mtime_nsec, st_ctime, st_ctime_nsec,
});

#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Flock64 {
    pub l_type: i16,
    pub l_whence: i16,
    pub l_start: i64,
    pub l_len: i64,
    pub l_pid: i32,
}

record_pair!(Flock64 => neutral::Flock64 { l_type, l_whence, l_start, l_len, l_pid });

const _: () = assert!(size_of::<Stat64>() == 96);
const _: () = assert!(std::mem::offset_of!(Stat64, st_size) == 44);
const _: () = assert!(std::mem::offset_of!(Stat64, st_ino) == 88);
const _: () = assert!(size_of::<Flock64>() == 24);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Record;

    #[test]
    fn stat64_widens_to_neutral() {
        let st = Stat64 {
            st_ino: 1 << 40,
            st_size: 5 << 32,
            st_nlink: 2,
            ..Default::default()
        };
        let wide = st.to_neutral();
        assert_eq!(wide.st_ino, 1 << 40);
        assert_eq!(wide.st_size, 5 << 32);
        assert_eq!(wide.st_nlink, 2);
    }

    #[test]
    fn flock64_keeps_offsets() {
        let lock = neutral::Flock64 {
            l_type: 1,
            l_start: 1 << 33,
            l_len: -1,
            ..Default::default()
        };
        let narrow = Flock64::from_neutral(&lock);
        assert_eq!({ narrow.l_start }, 1 << 33);
        assert_eq!(narrow.to_neutral(), lock);
    }
}
