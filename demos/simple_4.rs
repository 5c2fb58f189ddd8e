use grid_navigator::{
    find_path, Cell, ExecutorConfig, Heading, MemoryTransport, NavigationOutcome, Navigator,
    OccupancyGrid, PathExecutor, SimulatedDrive, StopSignal,
};

// In this example a path is found on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  E|
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Nodes have a 4-neighborhood. The path is then driven by a simulated agent whose world has
// an extra obstacle at (1, 0), which it only discovers on the way and replans around.

fn main() {
    env_logger::init();
    let grid = OccupancyGrid::parse(3, "0,0,0, 0,1,0, 0,0,0").unwrap();
    println!("{}", grid);
    let start = Cell::new(0, 0);
    let end = Cell::new(2, 2);
    let path = find_path(&grid, start, end).unwrap().unwrap();
    println!("Path:");
    for p in path.cells() {
        println!("{}", p);
    }

    let world = OccupancyGrid::parse(3, "0,0,0, 1,1,0, 0,0,0").unwrap();
    let drive = SimulatedDrive::new(world, start, Heading::North);
    let executor = PathExecutor::new(drive, ExecutorConfig::default());
    let mut navigator = Navigator::new(executor, MemoryTransport::new(), 3);
    let report = navigator
        .navigate(grid, start, end, 300.0, &StopSignal::new())
        .unwrap();
    match report.outcome {
        NavigationOutcome::Reached { at } => println!("Reached {}", at),
        other => println!("Stopped: {:?}", other),
    }
    println!("Commands: {:?}", navigator.executor().drive().commands());
}
