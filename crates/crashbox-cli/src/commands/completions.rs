//! Shell completions generation command
//!
//! Usage: `crashbox completions bash > ~/.local/share/bash-completion/completions/crashbox`

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

/// Arguments for the completions subcommand
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Prints completions for the whole `crashbox` command tree to stdout.
    pub fn execute(&self) -> Result<()> {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "crashbox", &mut io::stdout());
        Ok(())
    }
}
