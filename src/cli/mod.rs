//! Command-line flags for the `dbchat` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// Chat with a read-only Supabase database through an LLM agent.
#[derive(Parser, Debug, Default)]
#[command(name = "dbchat", version, about = "Chat with a read-only database through an LLM agent")]
pub struct Cli {
    /// Address to listen on (overrides DBCHAT_BIND)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Append-only log file (overrides AGENT_LOG_FILE)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply the flags on top of an environment-derived config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(path) = &self.log_file {
            config.log_file = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["dbchat", "--bind", "0.0.0.0:9000", "--log-file", "/tmp/a.log"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.log_file, PathBuf::from("/tmp/a.log"));
    }

    #[test]
    fn absent_flags_keep_config() {
        let cli = Cli::parse_from(["dbchat"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.bind, crate::config::DEFAULT_BIND);
    }
}
