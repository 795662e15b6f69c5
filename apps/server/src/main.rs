use anyhow::Context;
use dwaste_kernel::config::LayeredSettings;
use dwaste_logger::Logger;
use dwaste_server::{Bootstrapper, RuntimeProfile, settings_path};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let settings = LayeredSettings::load(settings_path().as_deref())
        .context("Critical: Configuration is malformed")?;
    let service = settings.service_config().context("Critical: Configuration is malformed")?;

    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).config(&service.logging)?.init()?;

    match settings.source() {
        Some(file) => info!(file = %file.display(), "Settings loaded"),
        None => info!("Settings loaded from defaults and environment"),
    }

    let app = Bootstrapper::new().settings(settings).service_config(service).build()?;

    let stages = RuntimeProfile::server().build()?.block_on(app.run())?;
    info!(stages = ?stages.as_slice(), "Process terminated");
    Ok(())
}
