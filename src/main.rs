use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::warn;

use canopy3d::io::{LayoutRecord, read_design, write_layout};
use canopy3d::{EngineError, Metrics};

#[derive(Parser, Debug)]
#[command(version, about = "Grow-room layout planner and canopy irradiance solver", long_about = None)]
struct Args {
    /// Design file (room, obstacles, catalog, configuration)
    #[arg(name = "DESIGN_FILE")]
    design: PathBuf,

    /// Search spacing and mounting height for the configured targets
    #[arg(long)]
    optimize: bool,

    /// Write the resulting layout record to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Solve on the calling thread only
    #[arg(long)]
    sequential: bool,
}

fn print_metrics(m: &Metrics) {
    println!("sources          {}", m.active_sources);
    println!("canopy cells     {}", m.cell_count);
    println!("average          {:.1} umol/m2/s", m.average);
    println!("min / max        {:.1} / {:.1}", m.min, m.max);
    println!("uniformity       {:.3}", m.uniformity);
    println!("daily dose       {:.2} mol/m2/day", m.daily_light_integral);
    println!("total flux       {:.0} umol/s", m.total_flux);
    println!("total power      {:.0} W", m.total_power);
    println!("efficacy         {:.2} umol/J", m.efficacy);
    println!("power density    {:.2} W/unit2", m.power_density);
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut design = read_design(&args.design)?;
    if args.sequential {
        design.config.grid.parallel = false;
    }
    let mut session = design.into_session()?;
    session.generate().context("Failed to generate the layout")?;

    if args.optimize {
        match session.optimize() {
            Ok(Some(outcome)) => println!(
                "converged after {} iterations (density {:.2}, height {:.2}, dimming {:.3})",
                outcome.iterations, outcome.density_scale, outcome.mounting_height, outcome.dimming
            ),
            Ok(None) => bail!("optimization was cancelled"),
            Err(EngineError::TargetUnreachable { best, delta }) => {
                warn!(
                    "Targets not met after {} layouts: average off by {:.1}, uniformity off by {:.3}",
                    best.trials.len(),
                    delta.average,
                    delta.uniformity
                );
                session.set_layout(best.layout)?;
            }
            Err(e) => return Err(e).context("Optimization failed"),
        }
    }

    let metrics = session.metrics()?;
    print_metrics(&metrics);

    if let Some(path) = args.output {
        let record: LayoutRecord = session.export_record()?;
        write_layout(&path, &record)?;
        println!("layout written to {}", path.display());
    }
    Ok(())
}
