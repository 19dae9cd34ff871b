//! Garment sketch colorization CLI tool
//!
//! Batch command-line front end for the garment-colorize library.

#[cfg(feature = "cli")]
use garment_colorize::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
