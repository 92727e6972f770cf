//! Directory entry streams.
//!
//! The adapter always reads with `getdents64`, whose record layout is the
//! same on every architecture. Only the legacy `getdents` of 32-bit guests
//! needs its records rewritten:
//!
//! ```text
//! host  linux_dirent64: d_ino u64 | d_off i64 | d_reclen u16 | d_type u8 | name NUL
//! guest linux_dirent:   d_ino u32 | d_off u32 | d_reclen u16 | name NUL | pad | d_type
//! ```

use crate::errno::Errno;

const HOST_NAME: usize = 19;
const LEGACY_NAME: usize = 10;

/// Guest records rebuilt from a host buffer.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Repacked {
    pub bytes: Vec<u8>,
    pub entries: usize,
    /// Directory offset to seek back to when host records were left over.
    pub resume: Option<i64>,
}

struct HostDirent<'a> {
    ino: u64,
    off: i64,
    kind: u8,
    name: &'a [u8],
    reclen: usize,
}

fn next_record(buf: &[u8]) -> Option<HostDirent<'_>> {
    if buf.len() < HOST_NAME {
        return None;
    }
    let ino = u64::from_ne_bytes(buf[0..8].try_into().ok()?);
    let off = i64::from_ne_bytes(buf[8..16].try_into().ok()?);
    let reclen = u16::from_ne_bytes(buf[16..18].try_into().ok()?) as usize;
    if reclen < HOST_NAME || reclen > buf.len() {
        return None;
    }
    let raw_name = &buf[HOST_NAME..reclen];
    let len = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
    Some(HostDirent {
        ino,
        off,
        kind: buf[18],
        name: &raw_name[..len],
        reclen,
    })
}

/// Length of a legacy record: header, name, NUL and the trailing type byte,
/// rounded to the guest `long`.
fn legacy_reclen(name_len: usize) -> usize {
    (LEGACY_NAME + name_len + 2 + 3) & !3
}

/// Rewrite `getdents64` output as 32-bit `linux_dirent` records that fit in
/// `capacity` bytes.
///
/// Fails with `EINVAL` when not even the first record fits and with
/// `EOVERFLOW` when the first inode or offset does not fit in 32 bits. A
/// later record that cannot be copied ends the batch and sets
/// [`Repacked::resume`].
pub fn repack_legacy(host: &[u8], capacity: usize) -> Result<Repacked, Errno> {
    let mut out = Repacked::default();
    let mut pos = 0;
    let mut last_off = None;
    while let Some(ent) = next_record(&host[pos..]) {
        let reclen = legacy_reclen(ent.name.len());
        let fits = out.bytes.len() + reclen <= capacity;
        let narrow = u32::try_from(ent.ino).ok().zip(u32::try_from(ent.off).ok());
        if !fits || narrow.is_none() {
            if out.entries == 0 {
                return Err(if fits { Errno::EOVERFLOW } else { Errno::EINVAL });
            }
            out.resume = last_off;
            break;
        }
        let start = out.bytes.len();
        out.bytes.resize(start + reclen, 0);
        let rec = &mut out.bytes[start..];
        let (ino, off) = narrow.unwrap_or_default();
        rec[0..4].copy_from_slice(&ino.to_ne_bytes());
        rec[4..8].copy_from_slice(&off.to_ne_bytes());
        rec[8..10].copy_from_slice(&(reclen as u16).to_ne_bytes());
        rec[LEGACY_NAME..LEGACY_NAME + ent.name.len()].copy_from_slice(ent.name);
        rec[reclen - 1] = ent.kind;

        out.entries += 1;
        last_off = Some(ent.off);
        pos += ent.reclen;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_record(ino: u64, off: i64, kind: u8, name: &str) -> Vec<u8> {
        let reclen = (HOST_NAME + name.len() + 1 + 7) & !7;
        let mut rec = vec![0u8; reclen];
        rec[0..8].copy_from_slice(&ino.to_ne_bytes());
        rec[8..16].copy_from_slice(&off.to_ne_bytes());
        rec[16..18].copy_from_slice(&(reclen as u16).to_ne_bytes());
        rec[18] = kind;
        rec[HOST_NAME..HOST_NAME + name.len()].copy_from_slice(name.as_bytes());
        rec
    }

    fn names(bytes: &[u8]) -> Vec<(String, u8)> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let reclen = u16::from_ne_bytes([bytes[pos + 8], bytes[pos + 9]]) as usize;
            let rec = &bytes[pos..pos + reclen];
            let name = &rec[LEGACY_NAME..];
            let len = name.iter().position(|&b| b == 0).unwrap();
            out.push((String::from_utf8(name[..len].to_vec()).unwrap(), rec[reclen - 1]));
            pos += reclen;
        }
        out
    }

    #[test]
    fn keeps_order_and_recomputes_lengths() {
        let mut host = Vec::new();
        for (i, name) in [".", "..", "a", "longer_name.txt"].iter().enumerate() {
            host.extend(host_record(100 + i as u64, i as i64 + 1, 4 + i as u8, name));
        }
        let out = repack_legacy(&host, 4096).unwrap();
        assert_eq!(out.entries, 4);
        assert_eq!(out.resume, None);
        assert_eq!(
            names(&out.bytes),
            vec![
                (".".into(), 4),
                ("..".into(), 5),
                ("a".into(), 6),
                ("longer_name.txt".into(), 7)
            ]
        );
        // 12 + 15 rounded up to 4
        assert_eq!(out.bytes.len(), 12 + 16 + 16 + 28);
    }

    #[test]
    fn first_record_must_fit() {
        let host = host_record(1, 1, 8, "file");
        assert_eq!(repack_legacy(&host, 8), Err(Errno::EINVAL));
    }

    #[test]
    fn leftovers_resume_after_the_last_copied_entry() {
        let mut host = host_record(1, 10, 8, "a");
        host.extend(host_record(2, 20, 8, "b"));
        let out = repack_legacy(&host, 16).unwrap();
        assert_eq!(out.entries, 1);
        assert_eq!(out.resume, Some(10));
    }

    #[test]
    fn wide_inodes_overflow() {
        let host = host_record(1 << 32, 1, 8, "big");
        assert_eq!(repack_legacy(&host, 4096), Err(Errno::EOVERFLOW));

        let mut host = host_record(3, 7, 8, "small");
        host.extend(host_record(1 << 40, 9, 8, "big"));
        let out = repack_legacy(&host, 4096).unwrap();
        assert_eq!(out.entries, 1);
        assert_eq!(out.resume, Some(7));
    }

    #[test]
    fn wide_offsets_overflow() {
        let host = host_record(7, 0x1_0000_0010, 8, "hashed");
        assert_eq!(repack_legacy(&host, 4096), Err(Errno::EOVERFLOW));

        let mut host = host_record(3, 7, 8, "small");
        host.extend(host_record(4, -1, 8, "last"));
        let out = repack_legacy(&host, 4096).unwrap();
        assert_eq!(out.entries, 1);
        assert_eq!(out.resume, Some(7));
        assert_eq!(u32::from_ne_bytes(out.bytes[4..8].try_into().unwrap()), 7);
    }

    #[test]
    fn real_directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["alpha", "beta", "gamma"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let file = std::fs::File::open(dir.path()).unwrap();
        let fd = std::os::fd::AsRawFd::as_raw_fd(&file);
        let mut buf = vec![0u8; 4096];
        let n = unsafe { libc::syscall(libc::SYS_getdents64, fd, buf.as_mut_ptr(), buf.len()) };
        assert!(n > 0);

        // Hashed directories (ext4) hand out offsets wider than 32 bits; only
        // the leading records with narrow offsets can be copied.
        let host = &buf[..n as usize];
        let mut narrow = Vec::new();
        let mut pos = 0;
        while let Some(ent) = next_record(&host[pos..]) {
            if u32::try_from(ent.ino).is_err() || u32::try_from(ent.off).is_err() {
                break;
            }
            narrow.push(String::from_utf8(ent.name.to_vec()).unwrap());
            pos += ent.reclen;
        }

        match repack_legacy(host, 4096) {
            Ok(out) => {
                assert_eq!(out.entries, narrow.len());
                let found: Vec<_> = names(&out.bytes).into_iter().map(|(n, _)| n).collect();
                assert_eq!(found, narrow);
            }
            Err(errno) => {
                assert_eq!(errno, Errno::EOVERFLOW);
                assert!(narrow.is_empty());
            }
        }
        if pos == host.len() {
            narrow.sort();
            assert_eq!(narrow, vec![".", "..", "alpha", "beta", "gamma"]);
        }
    }
}
