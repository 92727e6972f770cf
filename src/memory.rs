use std::{error::Error, fmt, mem, ptr::NonNull};

/// Guest to host address translation, owned by the emulator's address-space
/// manager. Translation is only valid for the duration of one syscall.
pub trait AddressSpace {
    /// Host address backing guest `addr`, or `None` if it is not mapped.
    fn guest_to_host(&self, addr: u64) -> Option<usize>;

    /// Guest address of host pointer `ptr`, or `None` if the guest cannot see it.
    fn host_to_guest(&self, ptr: usize) -> Option<u64>;

    /// Number of bytes mapped contiguously (in host memory) starting at `addr`.
    fn mapped_len(&self, addr: u64) -> usize;
}

/// 64-bit guests that share the host address space.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentitySpace;

impl AddressSpace for IdentitySpace {
    fn guest_to_host(&self, addr: u64) -> Option<usize> {
        usize::try_from(addr).ok()
    }

    fn host_to_guest(&self, ptr: usize) -> Option<u64> {
        Some(ptr as u64)
    }

    fn mapped_len(&self, addr: u64) -> usize {
        match usize::try_from(addr) {
            Ok(addr) => usize::MAX - addr,
            Err(_) => 0,
        }
    }
}

const PAGE_SIZE: usize = 4096;

/// One anonymous host mapping exposed to the guest at `vaddr`.
#[derive(Debug)]
pub struct Segment {
    vaddr: u64,
    ptr: NonNull<u8>,
    len: usize,
}

impl Segment {
    pub fn vaddr(&self) -> u64 {
        self.vaddr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.vaddr && addr - self.vaddr < self.len as u64
    }

    fn host_range(&self) -> std::ops::Range<usize> {
        let base = self.ptr.as_ptr() as usize;
        base..base + self.len
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}

/// Guest memory backed by private anonymous host mappings, one per segment.
/// Guest ranges never straddle two segments since their host pages are not
/// contiguous.
#[derive(Debug, Default)]
pub struct GuestMemory {
    segments: Vec<Segment>,
}

impl GuestMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Map `len` zeroed, read-write bytes at guest address `vaddr`.
    pub fn map(&mut self, vaddr: u64, len: usize) -> Result<(), MemoryError> {
        let len = len
            .checked_add(PAGE_SIZE - 1)
            .ok_or(MemoryError::AddressOverflow { addr: vaddr, size: len })?
            & !(PAGE_SIZE - 1);
        let end = vaddr
            .checked_add(len as u64)
            .ok_or(MemoryError::AddressOverflow { addr: vaddr, size: len })?;
        if self
            .segments
            .iter()
            .any(|s| vaddr < s.vaddr + s.len as u64 && s.vaddr < end)
        {
            return Err(MemoryError::Overlap { addr: vaddr, size: len });
        }

        let raw = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            return Err(MemoryError::Map { addr: vaddr, size: len, errno });
        }
        let ptr = NonNull::new(raw.cast::<u8>())
            .ok_or(MemoryError::Map { addr: vaddr, size: len, errno: 0 })?;

        self.segments.push(Segment { vaddr, ptr, len });
        self.segments.sort_by_key(|s| s.vaddr);
        Ok(())
    }

    /// Drop the segment starting at `vaddr`.
    pub fn unmap(&mut self, vaddr: u64) -> Result<(), MemoryError> {
        let idx = self
            .segments
            .iter()
            .position(|s| s.vaddr == vaddr)
            .ok_or(MemoryError::Unmapped { addr: vaddr, size: 0 })?;
        self.segments.remove(idx);
        Ok(())
    }

    pub fn read_data(&self, addr: u64, size: usize) -> Result<&[u8], MemoryError> {
        let host = translate_range(self, addr, size)?;
        Ok(unsafe { std::slice::from_raw_parts(host as *const u8, size) })
    }

    pub fn write_data(&mut self, addr: u64, data: &[u8]) -> Result<(), MemoryError> {
        write_bytes(self, addr, data)
    }

    /// Return true if one segment fully covers the given range.
    pub fn covers_range(&self, addr: u64, size: usize) -> bool {
        self.mapped_len(addr) >= size
    }

    fn segment_containing(&self, addr: u64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.contains(addr))
    }
}

impl AddressSpace for GuestMemory {
    fn guest_to_host(&self, addr: u64) -> Option<usize> {
        let segment = self.segment_containing(addr)?;
        Some(segment.ptr.as_ptr() as usize + (addr - segment.vaddr) as usize)
    }

    fn host_to_guest(&self, ptr: usize) -> Option<u64> {
        self.segments.iter().find_map(|s| {
            let range = s.host_range();
            range
                .contains(&ptr)
                .then(|| s.vaddr + (ptr - range.start) as u64)
        })
    }

    fn mapped_len(&self, addr: u64) -> usize {
        self.segment_containing(addr)
            .map(|s| s.len - (addr - s.vaddr) as usize)
            .unwrap_or(0)
    }
}

/// Host address for `size` bytes at `addr`, all inside one mapping.
pub fn translate_range<S: AddressSpace + ?Sized>(
    space: &S,
    addr: u64,
    size: usize,
) -> Result<usize, MemoryError> {
    addr.checked_add(size as u64)
        .ok_or(MemoryError::AddressOverflow { addr, size })?;
    if space.mapped_len(addr) < size.max(1) {
        return Err(MemoryError::Unmapped { addr, size });
    }
    space
        .guest_to_host(addr)
        .ok_or(MemoryError::Unmapped { addr, size })
}

/// Read a plain-old-data record from guest memory.
pub fn load<T: Copy, S: AddressSpace + ?Sized>(space: &S, addr: u64) -> Result<T, MemoryError> {
    let host = translate_range(space, addr, mem::size_of::<T>())?;
    Ok(unsafe { std::ptr::read_unaligned(host as *const T) })
}

/// Write a plain-old-data record into guest memory.
pub fn store<T: Copy, S: AddressSpace + ?Sized>(
    space: &S,
    addr: u64,
    value: &T,
) -> Result<(), MemoryError> {
    let host = translate_range(space, addr, mem::size_of::<T>())?;
    unsafe { std::ptr::write_unaligned(host as *mut T, *value) };
    Ok(())
}

pub fn read_bytes<S: AddressSpace + ?Sized>(
    space: &S,
    addr: u64,
    size: usize,
) -> Result<Vec<u8>, MemoryError> {
    if size == 0 {
        return Ok(Vec::new());
    }
    let host = translate_range(space, addr, size)?;
    Ok(unsafe { std::slice::from_raw_parts(host as *const u8, size) }.to_vec())
}

pub fn write_bytes<S: AddressSpace + ?Sized>(
    space: &S,
    addr: u64,
    data: &[u8],
) -> Result<(), MemoryError> {
    if data.is_empty() {
        return Ok(());
    }
    let host = translate_range(space, addr, data.len())?;
    unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), host as *mut u8, data.len()) };
    Ok(())
}

/// Validate a NUL-terminated guest string of at most `max` bytes (terminator
/// included) and return its host address and length.
pub fn c_string<S: AddressSpace + ?Sized>(
    space: &S,
    addr: u64,
    max: usize,
) -> Result<(usize, usize), MemoryError> {
    let avail = space.mapped_len(addr);
    let host = space
        .guest_to_host(addr)
        .filter(|_| avail > 0)
        .ok_or(MemoryError::Unmapped { addr, size: 1 })?;
    let limit = avail.min(max);
    let bytes = unsafe { std::slice::from_raw_parts(host as *const u8, limit) };
    match bytes.iter().position(|&b| b == 0) {
        Some(len) => Ok((host, len)),
        None if limit == max => Err(MemoryError::Unterminated { addr, max }),
        None => Err(MemoryError::Unmapped { addr, size: limit + 1 }),
    }
}

#[derive(Debug, Clone)]
pub enum MemoryError {
    AddressOverflow { addr: u64, size: usize },
    NotRepresentable { ptr: usize },
    Unmapped { addr: u64, size: usize },
    Overlap { addr: u64, size: usize },
    Unterminated { addr: u64, max: usize },
    Map { addr: u64, size: usize, errno: i32 },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AddressOverflow { addr, size } => {
                write!(f, "address overflow at {addr:#x} (size {size})")
            }
            MemoryError::NotRepresentable { ptr } => {
                write!(f, "host pointer {ptr:#x} has no guest address")
            }
            MemoryError::Unmapped { addr, size } => {
                let range_end = addr.saturating_add(*size as u64);
                write!(f, "no segment covers range {addr:#x}..{range_end:#x}")
            }
            MemoryError::Overlap { addr, size } => {
                write!(f, "mapping {addr:#x} (size {size}) overlaps an existing segment")
            }
            MemoryError::Unterminated { addr, max } => {
                write!(f, "string at {addr:#x} is not terminated within {max} bytes")
            }
            MemoryError::Map { addr, size, errno } => {
                write!(f, "host mmap for {addr:#x} (size {size}) failed with errno {errno}")
            }
        }
    }
}

impl Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_memory_translates_both_ways() {
        let mut mem = GuestMemory::new();
        mem.map(0x1_0000, 100).unwrap();
        assert_eq!(mem.segments()[0].len(), PAGE_SIZE);

        let host = mem.guest_to_host(0x1_0010).unwrap();
        assert_eq!(mem.host_to_guest(host), Some(0x1_0010));
        assert_eq!(mem.mapped_len(0x1_0010), PAGE_SIZE - 0x10);
        assert_eq!(mem.guest_to_host(0x2_0000), None);
        assert_eq!(mem.host_to_guest(0x10), None);
    }

    #[test]
    fn ranges_must_stay_inside_one_segment() {
        let mut mem = GuestMemory::new();
        mem.map(0x1_0000, PAGE_SIZE).unwrap();
        mem.map(0x1_1000, PAGE_SIZE).unwrap();

        assert!(mem.covers_range(0x1_0ff0, 16));
        assert!(!mem.covers_range(0x1_0ff0, 17));
        assert!(matches!(
            mem.map(0x1_0800, 16),
            Err(MemoryError::Overlap { .. })
        ));
    }

    #[test]
    fn records_round_trip_through_guest_memory() {
        let mut mem = GuestMemory::new();
        mem.map(0x8000, PAGE_SIZE).unwrap();
        store(&mem, 0x8004, &0xdead_beef_u32).unwrap();
        assert_eq!(load::<u32, _>(&mem, 0x8004).unwrap(), 0xdead_beef);
        assert_eq!(mem.read_data(0x8004, 4).unwrap(), &0xdead_beef_u32.to_le_bytes());
        assert!(load::<u64, _>(&mem, 0x8ffc).is_err());
    }

    #[test]
    fn c_strings_are_bounded() {
        let mut mem = GuestMemory::new();
        mem.map(0x8000, PAGE_SIZE).unwrap();
        mem.write_data(0x8000, b"/tmp\0").unwrap();
        let (_, len) = c_string(&mem, 0x8000, 4096).unwrap();
        assert_eq!(len, 4);

        assert!(matches!(
            c_string(&mem, 0x8000, 3),
            Err(MemoryError::Unterminated { .. })
        ));

        mem.write_data(0x8ffe, b"ab").unwrap();
        assert!(matches!(
            c_string(&mem, 0x8ffe, 4096),
            Err(MemoryError::Unmapped { .. })
        ));
    }

    #[test]
    fn identity_space_is_transparent() {
        assert_eq!(IdentitySpace.guest_to_host(0x1234), Some(0x1234));
        assert_eq!(IdentitySpace.host_to_guest(0x1234), Some(0x1234));
    }
}
