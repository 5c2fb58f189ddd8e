//! grid-navigator - plan a path on an occupancy grid, export it for an executor, execute an
//! exported path, or run the full plan/execute/replan loop against a simulated drive.
//!
//! Usage:
//!   grid-navigator --grid "0,0,0,1,1,0,0,0,0" --start 0,0 --goal 2,2
//!   grid-navigator --grid "0,0,0,0,0,0,0,0,0" --start 0,0 --goal 2,2 --mode simulate \
//!       --world "0,0,0,0,1,0,0,0,0"
//!   grid-navigator --grid "0,0,0,0,0,0,0,0,0" --start 0,0 --goal 2,2 --mode export --out run
//!   grid-navigator --mode execute --out run --world "0,0,1,0,0,0,0,0,0"
//!   grid-navigator --mode replan --out run
use clap::{Parser, ValueEnum};
use grid_navigator::{
    find_round_trip, replan_from_request, Cell, FileTransport, Heading, MemoryTransport,
    NavConfig, NavError, NavigationOutcome, Navigator, OccupancyGrid, PathExecutor, PathState,
    Result, RunOutcome, SimulatedDrive, StopSignal, Transport,
};
use log::info;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Print the outbound and return paths
    Plan,
    /// Write grid.json and path.json for an executor process
    Export,
    /// Read grid.json and path.json, drive the path once and leave a replan request on
    /// obstacles
    Execute,
    /// Consume a replan request and write a new path from where the agent stopped
    Replan,
    /// Plan, execute and replan against a simulated drive
    Simulate,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Flattened grid, row-major, 0 = free and 1 = blocked (e.g. "0,0,0, 1,1,0, 0,0,0")
    #[arg(short, long)]
    grid: Option<String>,

    /// Start cell as "row,col"
    #[arg(short, long, value_parser = parse_cell)]
    start: Option<Cell>,

    /// Goal cell as "row,col"
    #[arg(short = 'G', long, value_parser = parse_cell)]
    goal: Option<Cell>,

    /// Grid edge length; overrides the configuration
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Cell edge length in millimetres; overrides the configuration
    #[arg(long)]
    cell_mm: Option<f64>,

    /// Initial heading of the agent; overrides the configuration
    #[arg(long)]
    heading: Option<Heading>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Mode::Plan)]
    mode: Mode,

    /// True obstacles for the simulated drive; defaults to the planning grid
    #[arg(short, long)]
    world: Option<String>,

    /// Directory for exchanged records; overrides the configuration
    #[arg(short, long)]
    out: Option<String>,
}

fn parse_cell(s: &str) -> std::result::Result<Cell, String> {
    let (r, c) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"row,col\", got \"{}\"", s))?;
    let row = r.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let col = c.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(Cell::new(row, col))
}

fn print_path(label: &str, path: Option<&grid_navigator::Path>) {
    match path {
        Some(p) => {
            let cells = p
                .cells()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            println!("{} ({} moves): {}", label, p.edges(), cells);
        }
        None => println!("{}: no path", label),
    }
}

/// The planning query every mode except `execute` needs.
fn query(args: &Args, size: usize) -> Result<(OccupancyGrid, Cell, Cell)> {
    match (&args.grid, args.start, args.goal) {
        (Some(grid), Some(start), Some(goal)) => {
            Ok((OccupancyGrid::parse(size, grid)?, start, goal))
        }
        _ => Err(NavError::Config(format!(
            "--grid, --start and --goal are required in {:?} mode",
            args.mode
        ))),
    }
}

fn file_transport(config: &NavConfig) -> FileTransport {
    FileTransport::new(&config.interchange.dir).with_file_names(
        &config.interchange.grid_file,
        &config.interchange.path_file,
        &config.interchange.replan_file,
    )
}

fn simulated_drive(
    config: &NavConfig,
    world: Option<&str>,
    known: &OccupancyGrid,
    start: Cell,
) -> Result<SimulatedDrive> {
    let world = match world {
        Some(spec) => OccupancyGrid::parse(known.size(), spec)?,
        None => known.clone(),
    };
    let mut drive = SimulatedDrive::new(world, start, config.executor.initial_heading);
    drive.motion_polls = config.simulation.motion_polls;
    drive.sensor_polls = config.simulation.sensor_polls;
    drive.sensor_value = config.simulation.sensor_value;
    Ok(drive)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path);
            NavConfig::load(Path::new(path))?
        }
        None => NavConfig::default(),
    };
    if let Some(size) = args.size {
        config.grid.size = size;
    }
    if let Some(cell_mm) = args.cell_mm {
        config.grid.cell_mm = cell_mm;
    }
    if let Some(heading) = args.heading {
        config.executor.initial_heading = heading;
    }
    if let Some(out) = &args.out {
        config.interchange.dir = out.clone();
    }
    config.validate()?;

    match args.mode {
        Mode::Plan => {
            let (grid, start, goal) = query(&args, config.grid.size)?;
            println!("{}", grid);
            let (outbound, back) = find_round_trip(&grid, start, goal)?;
            print_path("Path", outbound.as_ref());
            print_path("Return path", back.as_ref());
        }
        Mode::Export => {
            let (grid, start, goal) = query(&args, config.grid.size)?;
            println!("{}", grid);
            let (outbound, _) = find_round_trip(&grid, start, goal)?;
            print_path("Path", outbound.as_ref());
            let state = PathState::new(grid, start, goal, outbound, config.grid.cell_mm)?;
            let mut transport = file_transport(&config);
            transport.write_state(&state)?;
            println!(
                "Wrote {} and {}",
                transport.grid_path().display(),
                transport.path_path().display()
            );
        }
        Mode::Execute => {
            let mut transport = file_transport(&config);
            let state = transport.read_state()?;
            println!("{}", state.grid);
            print_path("Path", state.path.as_ref());
            let drive =
                simulated_drive(&config, args.world.as_deref(), &state.grid, state.start)?;
            let mut executor = PathExecutor::new(drive, config.executor_config());
            match executor.run(&state, &mut transport, &StopSignal::new())? {
                RunOutcome::Completed { at } => println!("Reached {}", at),
                RunOutcome::Cancelled { at } => println!("Cancelled at {}", at),
                RunOutcome::ReplanPending { request, .. } => println!(
                    "{} is blocked; updated {} and wrote {}",
                    request.blocked,
                    transport.grid_path().display(),
                    transport.replan_path().display()
                ),
            }
        }
        Mode::Replan => {
            let mut transport = file_transport(&config);
            match replan_from_request(&mut transport)? {
                Some(state) => {
                    println!("{}", state.grid);
                    print_path("Path", state.path.as_ref());
                }
                None => {
                    return Err(NavError::Interchange(format!(
                        "no replan request at {}",
                        transport.replan_path().display()
                    )))
                }
            }
        }
        Mode::Simulate => {
            let (grid, start, goal) = query(&args, config.grid.size)?;
            println!("{}", grid);
            let drive = simulated_drive(&config, args.world.as_deref(), &grid, start)?;
            let executor = PathExecutor::new(drive, config.executor_config());
            let mut navigator =
                Navigator::new(executor, MemoryTransport::new(), config.navigator.max_replans);
            let report =
                navigator.navigate(grid, start, goal, config.grid.cell_mm, &StopSignal::new())?;
            let visited = report
                .visited
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            println!("Visited: {}", visited);
            println!("Replans: {}", report.replans);
            println!("Known grid:\n{}", report.grid);
            match report.outcome {
                NavigationOutcome::Reached { at } => println!("Reached {}", at),
                NavigationOutcome::NoPath { at } => {
                    return Err(NavError::NoPathFound { start: at, goal })
                }
                NavigationOutcome::Cancelled { at } => println!("Cancelled at {}", at),
                NavigationOutcome::ReplanLimit { at } => {
                    println!("Gave up at {} after {} replans", at, report.replans)
                }
            }
        }
    }
    Ok(())
}
