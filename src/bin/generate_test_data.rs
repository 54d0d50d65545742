use clap::Parser;
use community_hierarchy::{generate_test_data, logger};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_test_data")]
#[command(about = "Writes vertex.csv and edge.csv with planted communities")]
struct Args {
    /// Output directory
    #[arg(long, default_value = "test_data")]
    dir: PathBuf,

    #[arg(long, default_value_t = 140)]
    vertices: usize,

    #[arg(long, default_value_t = 500)]
    edges: usize,

    /// Number of planted communities
    #[arg(long, default_value_t = 7)]
    groups: usize,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let (vertex_path, edge_path) =
        generate_test_data(&args.dir, args.vertices, args.edges, args.groups)?;

    println!("{} {}", vertex_path.display(), edge_path.display());
    Ok(())
}
