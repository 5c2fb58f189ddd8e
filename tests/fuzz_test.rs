/// Fuzzes the pathfinder on many random grids: a path is found exactly when the goal is
/// reachable, the path is as short as a brute-force breadth-first search says it can be, and
/// it is a connected sequence of unit steps without repeated cells.
use grid_navigator::{find_path, Cell, OccupancyGrid};
use itertools::Itertools;
use rand::prelude::*;
use std::collections::VecDeque;

fn random_grid(n: usize, rng: &mut StdRng) -> OccupancyGrid {
    let values = (0..n * n)
        .map(|_| rng.gen_bool(0.35) as u8)
        .collect::<Vec<u8>>();
    OccupancyGrid::from_values(n, &values).unwrap()
}

fn random_cell(n: usize, rng: &mut StdRng) -> Cell {
    Cell::new(rng.gen_range(0..n) as i32, rng.gen_range(0..n) as i32)
}

/// Shortest number of moves by breadth-first search, or [None] if unreachable.
fn bfs_distance(grid: &OccupancyGrid, start: Cell, goal: Cell) -> Option<usize> {
    let n = grid.size();
    let mut dist = vec![usize::MAX; n * n];
    let ix = |c: &Cell| c.row as usize * n + c.col as usize;
    let mut queue = VecDeque::new();
    dist[ix(&start)] = 0;
    queue.push_back(start);
    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            return Some(dist[ix(&cell)]);
        }
        for next in grid.passable_neighbours(&cell) {
            if dist[ix(&next)] == usize::MAX {
                dist[ix(&next)] = dist[ix(&cell)] + 1;
                queue.push_back(next);
            }
        }
    }
    None
}

fn visualize_grid(grid: &OccupancyGrid, start: &Cell, end: &Cell) {
    let n = grid.size() as i32;
    for row in 0..n {
        for col in 0..n {
            let c = Cell::new(row, col);
            if *start == c {
                print!("S");
            } else if *end == c {
                print!("G");
            } else if !grid.is_passable(&c).unwrap() {
                print!("#");
            } else {
                print!(".");
            }
        }
        println!();
    }
}

#[test]
fn fuzz() {
    const N_GRIDS: usize = 2000;
    let mut rng = StdRng::seed_from_u64(0);
    for n in [3, 5, 10] {
        for _ in 0..N_GRIDS {
            let grid = random_grid(n, &mut rng);
            let start = random_cell(n, &mut rng);
            let goal = random_cell(n, &mut rng);
            if !grid.is_passable(&start).unwrap() || !grid.is_passable(&goal).unwrap() {
                assert!(find_path(&grid, start, goal).is_err());
                continue;
            }
            let expected = bfs_distance(&grid, start, goal);
            let path = find_path(&grid, start, goal).unwrap();
            // Show the grid if the answers disagree
            if path.as_ref().map(|p| p.edges()) != expected {
                visualize_grid(&grid, &start, &goal);
            }
            assert_eq!(path.as_ref().map(|p| p.edges()), expected);
            assert_eq!(grid.reachable(&start, &goal), expected.is_some());
            if let Some(path) = path {
                assert_eq!(path.start(), start);
                assert_eq!(path.goal(), goal);
                assert!(path
                    .cells()
                    .iter()
                    .tuple_windows()
                    .all(|(a, b)| a.is_adjacent(b)));
                assert!(path.cells().iter().all_unique());
                assert!(path.cells().iter().all(|c| grid.is_passable(c).unwrap()));
            }
        }
    }
}

/// Blocking cells after construction leaves the components stale; results must not change.
#[test]
fn fuzz_with_discovered_obstacles() {
    const N: usize = 6;
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let mut grid = random_grid(N, &mut rng);
        for _ in 0..4 {
            let c = random_cell(N, &mut rng);
            grid.set_blocked(&c).unwrap();
        }
        let start = random_cell(N, &mut rng);
        let goal = random_cell(N, &mut rng);
        if !grid.is_passable(&start).unwrap() || !grid.is_passable(&goal).unwrap() {
            continue;
        }
        let stale = find_path(&grid, start, goal).unwrap().map(|p| p.edges());
        grid.update();
        let fresh = find_path(&grid, start, goal).unwrap().map(|p| p.edges());
        assert_eq!(stale, fresh);
        assert_eq!(fresh, bfs_distance(&grid, start, goal));
    }
}
