use clap::{Parser, Subcommand};

use champollion::GuestArch;

#[derive(Parser, Debug)]
#[command(
    name = "champollion",
    about = "Inspect the ARM/ARM64 to x86 syscall translation tables"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show how one raw guest syscall number is handled
    Resolve {
        #[arg(value_enum)]
        arch: GuestArch,
        /// Decimal or 0x-prefixed hexadecimal
        #[arg(value_parser = parse_number)]
        number: u32,
    },
    /// List every raw number of an architecture
    Table {
        #[arg(value_enum)]
        arch: GuestArch,
    },
    /// List record sizes and alignments
    Layouts,
}

fn parse_number(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|err| format!("invalid syscall number {s:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::parse_number;

    #[test]
    fn numbers_accept_hex() {
        assert_eq!(parse_number("240"), Ok(240));
        assert_eq!(parse_number("0x0f0002"), Ok(0x0f0002));
        assert!(parse_number("futex").is_err());
    }
}
