use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use eclipse_shadowmap::{EclipseShadowMapper, SimulationConfig};

fn main() -> Result<()> {
    env_logger::init();

    // Optional JSON config as first argument; Earth/Sun defaults otherwise.
    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_file(&path)
            .with_context(|| format!("loading configuration from '{path}'"))?,
        None => SimulationConfig::default(),
    };

    let mapper = EclipseShadowMapper::new(
        config.planet,
        config.atmosphere,
        config.sun,
        config.sampling,
    )?;
    let map = mapper.build()?;

    log::info!(
        "shadow map {}x{}x{} covering {:.0} km x {:.0} km: {}",
        map.width(),
        map.height(),
        map.num_wavelengths(),
        map.shadow_length_m() / 1000.0,
        map.shadow_height_m() / 1000.0,
        map.summary()
    );

    let output = "shadowmap.raw";
    let file = File::create(output).with_context(|| format!("creating '{output}'"))?;
    let mut writer = BufWriter::new(file);
    map.write_raw(&mut writer)
        .with_context(|| format!("writing '{output}'"))?;
    writer.flush().with_context(|| format!("flushing '{output}'"))?;
    log::info!("wrote {output}");

    Ok(())
}
