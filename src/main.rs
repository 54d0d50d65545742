use anyhow::Context;
use clap::Parser;
use community_hierarchy::{DriverConfig, logger};

fn main() -> anyhow::Result<()> {
    let config = DriverConfig::parse();
    logger::init_cli_logger(config.verbose);

    tracing::debug!("Driver config: {:?}", config);

    // 1. Load, coarsen and detect
    let report = community_hierarchy::run(&config).with_context(|| {
        format!(
            "community detection failed for {} / {}",
            config.vertex_path.display(),
            config.edge_path.display()
        )
    })?;

    // 2. Print every result on one line
    println!("{}", report.output_line());

    Ok(())
}
