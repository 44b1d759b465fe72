use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use wayfinder::{
    Graph, KDTree, Position, RawElement, Search, SearchOptions, Simplifier, Status, StraightLine,
    Termination,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] Box<dyn Error>);

#[derive(Parser)]
struct Cli {
    /// The path to a JSON array of node and way elements
    elements_file: PathBuf,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,

    /// Number of simplification passes
    #[arg(long, default_value_t = wayfinder::DEFAULT_PASSES)]
    passes: usize,

    /// Simplify until no more nodes can be removed, ignoring --passes
    #[arg(long)]
    until_stable: bool,

    /// Maximum deviation from a straight line (in radians) of removed nodes
    #[arg(long, default_value_t = wayfinder::DEFAULT_ANGLE_LIMIT)]
    angle_limit: f64,

    /// Number of search steps between progress reports
    #[arg(long, default_value_t = wayfinder::DEFAULT_YIELD_EVERY)]
    yield_every: usize,

    /// Only stop the search once the end node is expanded, guaranteeing the shortest path
    #[arg(long)]
    optimal: bool,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let mut g = load_graph(&cli.elements_file)?;

    let simplifier = Simplifier::new(cli.angle_limit);
    let removed = if cli.until_stable {
        simplifier.simplify_until_stable(&mut g).0
    } else {
        simplifier.simplify(&mut g, cli.passes)
    };
    log::info!("simplification removed {} nodes, {} remain", removed, g.len());

    let tree = KDTree::from_graph(&g).ok_or("graph has no nodes")?;
    let start = tree.find_nearest_node(Position::new(cli.start_lat, cli.start_lon));
    let end = tree.find_nearest_node(Position::new(cli.end_lat, cli.end_lon));
    let target = g.get_node(end).ok_or("end node disappeared")?.pos;

    let options = SearchOptions {
        yield_every: cli.yield_every,
        termination: if cli.optimal {
            Termination::OnExpansion
        } else {
            Termination::OnDiscovery
        },
    };
    let mut search = Search::new(&mut g, start, end, StraightLine::towards(target), options)?;

    while search.resume() == Status::Running {
        log::debug!("search in progress: {} steps", search.steps());
    }

    let route = match search.path() {
        Some(path) => path.to_vec(),
        None => return Err(format!("no route between nodes {} and {}", start, end).into()),
    };
    log::info!(
        "found route of {} nodes after {} steps",
        route.len(),
        search.steps()
    );

    let g = search.graph();

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{}},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut nodes = route.iter().filter_map(|&node_id| g.get_node(node_id)).peekable();
    while let Some(node) = nodes.next() {
        let suffix = if nodes.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", node.pos.lon, node.pos.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_graph<P: AsRef<Path>>(path: P) -> Result<Graph, GraphLoadError> {
    let wrap = |e: Box<dyn Error>| GraphLoadError(PathBuf::from(path.as_ref()), e);

    let f = File::open(path.as_ref()).map_err(|e| wrap(e.into()))?;
    let elements: Vec<RawElement> =
        serde_json::from_reader(BufReader::new(f)).map_err(|e| wrap(e.into()))?;

    let (g, stats) = wayfinder::build_graph(elements);
    log::info!(
        "loaded {} nodes and {} ways ({} invalid ways, {} repeated and {} dangling references)",
        stats.nodes,
        stats.ways,
        stats.invalid_ways,
        stats.duplicate_references,
        stats.dangling_references
    );
    Ok(g)
}
