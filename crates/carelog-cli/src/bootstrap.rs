use std::path::PathBuf;

use anyhow::Context;

use crate::cli::Cli;

pub fn load_config(cli: &Cli) -> anyhow::Result<carelog_config::CareConfig> {
    load_dotenv(cli.env_file.as_deref())?;
    carelog_config::CareConfig::load().context("failed to load carelog configuration")
}

fn load_dotenv(explicit: Option<&str>) -> anyhow::Result<()> {
    if let Some(path) = explicit {
        let env_path = PathBuf::from(path);
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
        return Ok(());
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let env_path = cwd.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
        return Ok(());
    }

    dotenvy::dotenv().ok();
    Ok(())
}
