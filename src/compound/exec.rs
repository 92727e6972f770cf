//! `execve` argument vectors and transparent re-invocation of the emulator.
//!
//! The host kernel can only start host binaries. When the new image is a
//! guest ELF, or a script whose interpreter is one, the call is rewritten to
//! start the emulator again with the guest image as its argument.

use std::{
    ffi::{CStr, CString, OsStr, c_char},
    fs::File,
    io::Read,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use goblin::elf::{Elf, header};
use log::debug;

use crate::{
    abi::Word,
    errno::Errno,
    memory::{self, AddressSpace, MemoryError},
    syscall::GuestArch,
};

/// Host pointers kept for `argv`, terminator excluded.
pub const ARGV_CAPACITY: usize = 4096;
/// Host pointers kept for `envp`, terminator excluded.
pub const ENVP_CAPACITY: usize = 8192;

/// Longest single argument or environment string (`MAX_ARG_STRLEN`).
const MAX_ARG_STRLEN: usize = 32 * 4096;
/// Bytes of the image inspected to classify it (`BINPRM_BUF_SIZE`).
const PROBE_LEN: usize = 256;
/// Interpreter chains deeper than this are left to the host kernel.
const MAX_SCRIPT_DEPTH: usize = 4;

/// How re-invocations of the emulator are spelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    /// Emulator binary started for guest images.
    pub emulator: PathBuf,
    /// Options placed right after the emulator path.
    pub mode_flags: Vec<String>,
    /// Option that sets the guest `argv[0]`, if the emulator has one.
    pub argv0_flag: Option<String>,
    /// Re-invoke the emulator for host binaries as well.
    pub trace_children: bool,
}

impl ExecConfig {
    pub fn new(emulator: impl Into<PathBuf>) -> Self {
        Self {
            emulator: emulator.into(),
            mode_flags: Vec::new(),
            argv0_flag: Some("-0".to_string()),
            trace_children: false,
        }
    }

    /// Re-invoke the running executable.
    pub fn from_env() -> Result<Self> {
        let exe = std::env::current_exe().context("failed to locate the emulator executable")?;
        Ok(Self::new(exe))
    }
}

/// What kind of program a path holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Image {
    Guest(GuestArch),
    Script {
        interp: Vec<u8>,
        arg: Option<Vec<u8>>,
    },
    Native,
}

/// Classify the first bytes of an executable.
pub fn classify_bytes(head: &[u8]) -> Image {
    if let Some(rest) = head.strip_prefix(b"#!") {
        let line = rest.split(|&b| b == b'\n').next().unwrap_or_default();
        let line = trim(line);
        let split = line
            .iter()
            .position(|&b| b == b' ' || b == b'\t')
            .unwrap_or(line.len());
        let (interp, arg) = line.split_at(split);
        let arg = trim(arg);
        if interp.is_empty() {
            return Image::Native;
        }
        return Image::Script {
            interp: interp.to_vec(),
            arg: (!arg.is_empty()).then(|| arg.to_vec()),
        };
    }
    match Elf::parse_header(head) {
        Ok(h) if h.e_machine == header::EM_ARM => Image::Guest(GuestArch::Arm),
        Ok(h) if h.e_machine == header::EM_AARCH64 => Image::Guest(GuestArch::Arm64),
        _ => Image::Native,
    }
}

fn trim(bytes: &[u8]) -> &[u8] {
    let is_space = |b: &u8| *b == b' ' || *b == b'\t';
    let start = bytes.iter().position(|b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_space(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

pub fn classify(path: &Path) -> std::io::Result<Image> {
    let mut head = Vec::with_capacity(PROBE_LEN);
    File::open(path)?
        .take(PROBE_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(classify_bytes(&head))
}

/// Walk a NULL-terminated guest pointer array and return the host address
/// of every string it names.
///
/// A zero `addr` is an empty vector. Strings must be terminated within
/// `MAX_ARG_STRLEN` bytes. More than `capacity` entries is fatal.
pub fn read_vector<W: Word>(
    mem: &dyn AddressSpace,
    addr: u64,
    capacity: usize,
) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    if addr == 0 {
        return Ok(out);
    }
    loop {
        let at = addr.wrapping_add((out.len() * W::BYTES) as u64);
        let entry: u64 = memory::load::<W, _>(mem, at)
            .map_err(Errno::from)?
            .into();
        if entry == 0 {
            return Ok(out);
        }
        if out.len() == capacity {
            bail!("exec vector at {addr:#x} has more than {capacity} entries");
        }
        let (host, _) = memory::c_string(mem, entry, MAX_ARG_STRLEN).map_err(|err| match err {
            MemoryError::Unterminated { .. } => Errno::E2BIG,
            other => Errno::from(other),
        })?;
        out.push(host);
    }
}

/// Host-side `execve` arguments.
#[derive(Debug)]
pub struct ExecPlan {
    owned: Vec<CString>,
    path: usize,
    argv: Vec<usize>,
    envp: Vec<usize>,
}

impl ExecPlan {
    /// Run `path` unchanged.
    fn direct(path: usize, argv: &[usize], envp: &[usize]) -> Self {
        Self {
            owned: Vec::new(),
            path,
            argv: terminated(argv),
            envp: terminated(envp),
        }
    }

    /// Host address of the image path.
    pub fn path(&self) -> u64 {
        self.path as u64
    }

    pub fn argv(&self) -> u64 {
        self.argv.as_ptr() as usize as u64
    }

    pub fn envp(&self) -> u64 {
        self.envp.as_ptr() as usize as u64
    }

    /// The argument strings, for logging and tests.
    pub fn args(&self) -> Vec<String> {
        self.argv
            .iter()
            .take_while(|&&p| p != 0)
            .map(|&p| unsafe { host_str(p) }.to_string_lossy().into_owned())
            .collect()
    }

    pub fn is_reinvocation(&self) -> bool {
        !self.owned.is_empty()
    }
}

fn terminated(ptrs: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(ptrs.len() + 1);
    out.extend_from_slice(ptrs);
    out.push(0);
    out
}

/// # Safety
///
/// `ptr` must address a NUL-terminated string that outlives the result.
unsafe fn host_str<'a>(ptr: usize) -> &'a CStr {
    unsafe { CStr::from_ptr(ptr as *const c_char) }
}

fn cstring(bytes: impl Into<Vec<u8>>) -> Result<CString> {
    CString::new(bytes).map_err(|_| Errno::EINVAL.into())
}

/// Decide how to start `path` and build the host vectors.
///
/// `path`, `argv` and `envp` hold host addresses of NUL-terminated strings
/// that stay valid until the call is issued.
pub fn prepare(config: &ExecConfig, path: usize, argv: &[usize], envp: &[usize]) -> Result<ExecPlan> {
    let path_str = unsafe { host_str(path) };
    let mut target = Path::new(OsStr::from_bytes(path_str.to_bytes())).to_path_buf();
    // Interpreter words to place ahead of the script, innermost last.
    let mut prefix: Vec<Vec<u8>> = Vec::new();
    let mut depth = 0;

    let guest = loop {
        let image = match classify(&target) {
            Ok(image) => image,
            Err(err) => {
                debug!("execve {}: {err}; leaving it to the host", target.display());
                return Ok(ExecPlan::direct(path, argv, envp));
            }
        };
        match image {
            Image::Guest(arch) => break Some(arch),
            Image::Native => break None,
            Image::Script { interp, arg } if depth < MAX_SCRIPT_DEPTH => {
                depth += 1;
                let mut words = vec![interp.clone()];
                words.extend(arg);
                words.extend(prefix);
                prefix = words;
                target = Path::new(OsStr::from_bytes(&interp)).to_path_buf();
            }
            Image::Script { .. } => break None,
        }
    };

    if guest.is_none() && !config.trace_children {
        debug!("execve {}: host image", path_str.to_string_lossy());
        return Ok(ExecPlan::direct(path, argv, envp));
    }

    let mut owned = vec![cstring(config.emulator.as_os_str().as_bytes())?];
    for flag in &config.mode_flags {
        owned.push(cstring(flag.as_bytes())?);
    }
    // argv[0] as the kernel would set it: the outermost interpreter for
    // scripts, the guest's own otherwise.
    let argv0 = match prefix.first() {
        Some(interp) => Some(cstring(interp.clone())?),
        None => argv.first().map(|&p| unsafe { host_str(p) }.to_owned()),
    };
    if let (Some(flag), Some(argv0)) = (&config.argv0_flag, argv0) {
        owned.push(cstring(flag.as_bytes())?);
        owned.push(argv0);
    }
    for word in &prefix {
        owned.push(cstring(word.clone())?);
    }

    let tail = argv.get(1..).unwrap_or_default();
    let total = owned.len() + 1 + tail.len();
    if total > ARGV_CAPACITY {
        bail!("re-invoked argv needs {total} entries, capacity is {ARGV_CAPACITY}");
    }
    let mut host_argv: Vec<usize> = owned.iter().map(|s| s.as_ptr() as usize).collect();
    host_argv.push(path);
    host_argv.extend_from_slice(tail);

    let plan = ExecPlan {
        path: owned[0].as_ptr() as usize,
        argv: terminated(&host_argv),
        envp: terminated(envp),
        owned,
    };
    debug!(
        "execve {} ({}): re-invoking as {:?}",
        path_str.to_string_lossy(),
        guest.map_or("traced host image".to_string(), |arch| format!("{arch} guest")),
        plan.args()
    );
    Ok(plan)
}
