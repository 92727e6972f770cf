mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};

use champollion::{
    GuestArch, Policy, abi,
    guest::has_handler,
    syscall::{self, Entry},
};

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match args.command {
        Command::Resolve { arch, number } => {
            let sysno = syscall::resolve(arch, number)?;
            let entry = Entry {
                raw: number,
                sysno,
                policy: syscall::policy_for(arch, sysno),
            };
            println!("{}", describe(arch, &entry));
        }
        Command::Table { arch } => {
            for entry in syscall::table(arch).entries() {
                println!("{}", describe(arch, entry));
            }
        }
        Command::Layouts => {
            for layout in abi::layouts() {
                println!(
                    "{:<9} {:<24} size {:>3} align {}",
                    layout.guest, layout.name, layout.size, layout.align
                );
            }
        }
    }
    Ok(())
}

fn host_nr(nr: Option<usize>) -> String {
    nr.map_or_else(|| "-".to_string(), |nr| nr.to_string())
}

fn describe(arch: GuestArch, entry: &Entry) -> String {
    let sysno = entry.sysno;
    let mut line = format!(
        "{:>8} {:<24} {:<17} x86_64 {:>3} i386 {:>3}",
        entry.raw,
        sysno.name(),
        entry.policy.to_string(),
        host_nr(sysno.x86_64()),
        host_nr(sysno.i386()),
    );
    if entry.policy == Policy::Custom && !has_handler(arch, sysno) {
        line.push_str(" (no converter)");
    }
    line
}
