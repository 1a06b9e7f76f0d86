use crate::config::toml_config::{CallStrategy, DemoConfig};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "count-sheep")]
#[command(about = "Count sheep while a native call sleeps on another thread")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Number of sheep to count
    #[arg(long)]
    pub sheep: Option<u32>,

    /// Milliseconds between sheep
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Milliseconds the native call sleeps
    #[arg(long)]
    pub sleep_ms: Option<u64>,

    /// Shared library to load instead of the linked-in exports
    #[arg(long)]
    pub library: Option<String>,

    /// How the native call is moved off the async runtime
    #[arg(long, value_enum)]
    pub strategy: Option<CallStrategy>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Do not print sheep as they are counted
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliConfig {
    /// Load the file given by `--config` (or defaults) and apply flag overrides.
    pub fn load(&self) -> Result<DemoConfig> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::from_file(path)?,
            None => DemoConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut DemoConfig) {
        if let Some(sheep) = self.sheep {
            config.demo.sheep = sheep;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.demo.tick_ms = tick_ms;
        }
        if let Some(sleep_ms) = self.sleep_ms {
            config.demo.sleep_ms = sleep_ms;
        }
        if let Some(library) = &self.library {
            config.library.path = Some(library.clone());
        }
        if let Some(strategy) = self.strategy {
            config.library.strategy = strategy;
        }
        config.logging.verbose |= self.verbose;
        config.logging.json |= self.json_logs;
    }
}
