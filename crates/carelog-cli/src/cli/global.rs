use clap::ValueEnum;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Raw,
}

impl OutputFormat {
    /// Parse a configured `general.default_format`, falling back to JSON.
    pub fn from_config(value: &str) -> Self {
        Self::from_str(value.trim(), true).unwrap_or_else(|_| {
            tracing::warn!(value, "unknown general.default_format; using json");
            Self::Json
        })
    }
}

/// Flags resolved for command handlers. Logging flags are consumed by
/// `init_tracing` before handlers run.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
}
