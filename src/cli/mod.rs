//! Command Line Interface (CLI) layer for ECOSYNC.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the download and upload
//! workflow. It wires user-provided options and the optional TOML config
//! file to the underlying library functionality exposed via
//! `ecosync::pipeline`.
//!
//! If you are embedding ECOSYNC into another application, prefer using
//! the high-level `ecosync::pipeline` module instead of calling the CLI
//! code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
