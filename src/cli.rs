use std::io;

use tracing::warn;

use crate::{telemetry, HubProvider, Preset, Runner, Settings, Variant, SAMPLE_SENTENCES};

/// Entry point shared by the `pipebench-heavy` and `pipebench-light` binaries.
pub fn run(variant: Variant) -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    telemetry::init();

    let settings = Settings::from_env()?;
    let mut preset = Preset::for_variant(variant);
    for model in settings.apply(&mut preset) {
        warn!(%model, "source override names no task of this preset");
    }

    let mut runner = Runner::new(HubProvider::new(settings.hub), io::stdout().lock());
    runner.run(&preset, &SAMPLE_SENTENCES)?;

    Ok(())
}
