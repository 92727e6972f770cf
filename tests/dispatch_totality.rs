//! One trial per raw syscall number of every guest architecture: the number
//! resolves, and the adapter treats it the way its table entry says.

use std::cell::RefCell;

use anyhow::Result;
use champollion::{
    Adapter, Arm, Arm64, GuestArch, GuestMemory, Policy, Sysno,
    compound::exec::ExecConfig,
    guest::{GuestAbi, has_handler},
    host::{NeutralArgs, NeutralHost},
    syscall::{self, Entry},
};
use libtest_mimic::{Arguments, Failed, Trial};

#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<Sysno>>,
}

impl NeutralHost for Recorder {
    fn dispatch(&self, sysno: Sysno, _args: NeutralArgs) -> Result<i64> {
        self.calls.borrow_mut().push(sysno);
        Ok(0)
    }
}

fn check<A: GuestAbi>(entry: Entry) -> Result<(), Failed> {
    let arch = A::ARCH;
    let resolved = syscall::resolve(arch, entry.raw).map_err(|e| format!("{e:#}"))?;
    if resolved != entry.sysno {
        return Err(format!("resolved to {resolved}, table says {}", entry.sysno).into());
    }
    if syscall::policy_for(arch, entry.sysno) != entry.policy {
        return Err(format!("{} is listed twice with different policies", entry.sysno).into());
    }

    let mem = GuestMemory::new();
    let host = Recorder::default();
    let config = ExecConfig::new("/opt/emu");
    let adapter = Adapter::<A>::new(&mem, &host, &config);
    let outcome = adapter.adapt(entry.sysno, Default::default());
    let calls = host.calls.borrow();

    match entry.policy {
        Policy::Passthrough => {
            if entry.sysno.signature().len() > 6 {
                return Err("signature wider than six words".into());
            }
            outcome.map_err(|e| format!("{e:#}"))?;
            if *calls != [entry.sysno] {
                return Err(format!("forwarded as {calls:?}").into());
            }
        }
        Policy::Custom => {
            if !has_handler(arch, entry.sysno) {
                return Err("custom entry without a converter".into());
            }
            if let Err(err) = outcome
                && format!("{err:#}").contains("no converter")
            {
                return Err(format!("{err:#}").into());
            }
        }
        Policy::NotYetSupported => {
            if outcome.is_ok() || !calls.is_empty() {
                return Err("not-yet-supported call was not fatal".into());
            }
        }
        Policy::NotImplemented => {
            let ret = outcome.map_err(|e| format!("{e:#}"))?;
            if ret != -(libc::ENOSYS as i64) || !calls.is_empty() {
                return Err(format!("expected -ENOSYS without a host call, got {ret}").into());
            }
        }
    }
    Ok(())
}

fn trials(arch: GuestArch) -> Vec<Trial> {
    syscall::table(arch)
        .entries()
        .iter()
        .map(|&entry| {
            let name = format!("{arch}::{}::{}", entry.raw, entry.sysno);
            Trial::test(name, move || match arch {
                GuestArch::Arm => check::<Arm>(entry),
                GuestArch::Arm64 => check::<Arm64>(entry),
            })
        })
        .collect()
}

fn main() {
    let args = Arguments::from_args();
    let mut all = trials(GuestArch::Arm);
    all.extend(trials(GuestArch::Arm64));
    libtest_mimic::run(&args, all).exit();
}
