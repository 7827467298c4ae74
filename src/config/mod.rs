pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "oc-advisor")]
#[command(about = "Tells which of CPU, RAM and GPU can be overclocked from a diagnostic report")]
pub struct CliConfig {
    /// Diagnostic reports to analyse (.html, .htm or .txt)
    #[arg(required = true)]
    pub reports: Vec<String>,

    /// Advisor configuration file; the built-in table is used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Ask the remote text-generation service instead of the local rules
    #[arg(long)]
    pub remote: bool,

    /// Answer with the local rules when the remote service fails
    #[arg(long)]
    pub fallback_to_rules: bool,

    /// Fail instead of answering when the report lacks RAM type, chipset or CPU vendor
    #[arg(long)]
    pub strict: bool,

    /// Wrap each answer in a code fence
    #[arg(long)]
    pub fence: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}
