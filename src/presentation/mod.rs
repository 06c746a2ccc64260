/// Presentation layer: the `scm-bridge` command line
pub mod cli;
