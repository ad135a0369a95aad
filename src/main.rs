use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use lumina::explain::{ExplainRequest, LocalExplainer};
use lumina::output;
use lumina::settings::{self, CliArgs};
use lumina::tutor::Tutor;

fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let settings = settings::load_config_with(&args)?;
    info!("{}", settings);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.print_config {
        write!(out, "{}", toml::to_string(&settings)?)?;
        return Ok(());
    }
    if args.list_media {
        return output::write_media(&mut out);
    }

    let engine = settings.engine();
    let incident = settings.incident()?;
    let transmitted = settings.transmitted()?;

    if let Some(sweep) = &args.sweep {
        let angles = settings::parse_sweep(sweep).map_err(anyhow::Error::msg)?;
        let geometries = engine
            .sweep(&angles, incident.refractive_index, transmitted.refractive_index)
            .context("Sweep failed")?;
        return output::write_sweep(&mut out, &geometries, settings.format);
    }

    let geometry = engine
        .compute_media(settings.angle, &incident, &transmitted)
        .context("Could not compute the ray geometry")?;
    debug!("{:#?}", geometry);
    output::write_geometry(&mut out, &incident, &transmitted, &geometry, settings.format)?;

    if args.explain {
        let tutor = Tutor::spawn(Arc::new(LocalExplainer), settings.tutor)?;
        tutor.request(ExplainRequest::from_geometry(&incident, &transmitted, &geometry));
        let explanation = tutor
            .explanations()
            .recv_timeout(settings.tutor.max_wait())
            .context("No explanation arrived")?;
        writeln!(out, "\n{}", explanation.text)?;
    }

    Ok(())
}
