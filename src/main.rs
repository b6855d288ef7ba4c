use anyhow::Context;

use orrery_lib::config::SimConfig;

fn main() -> anyhow::Result<()> {
    let config = SimConfig::from_env().context("invalid ORRERY_* configuration")?;
    orrery_lib::logging::init(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;

    orrery_lib::run(config).context("orrery stopped with an error")
}
