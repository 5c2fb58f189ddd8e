/// Drives the execution controller with a scripted drive whose sensor readings are fixed in
/// advance, and checks the exact command sequence it produces.
use grid_navigator::{
    Cell, Drive, DriveCommand, ExecutorConfig, ExecutorState, Heading, MemoryTransport,
    NavError, OccupancyGrid, Path, PathExecutor, PathState, ReplanRequest, Result,
    RotationAxis, RunOutcome, StopSignal, Transport,
};
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

/// Records commands and replays queued sensor readings; anything not queued reads clear.
#[derive(Default)]
struct ScriptedDrive {
    commands: Vec<DriveCommand>,
    readings: VecDeque<(u32, u32)>,
    fail_connect: bool,
    fail_sensors: bool,
    fail_stop: bool,
    sensor_delay: Option<Duration>,
}

impl Drive for ScriptedDrive {
    fn connect(&mut self) -> Result<()> {
        if self.fail_connect {
            return Err(NavError::Connection("no radio on channel 7".into()));
        }
        self.commands.push(DriveCommand::Connect);
        Ok(())
    }
    fn set_speed(&mut self, speed: u8) -> Result<()> {
        self.commands.push(DriveCommand::SetSpeed(speed));
        Ok(())
    }
    fn set_rotation(&mut self, degrees: u32) -> Result<()> {
        self.commands.push(DriveCommand::SetRotation(degrees));
        Ok(())
    }
    fn set_rotation_axis(&mut self, axis: RotationAxis) -> Result<()> {
        self.commands.push(DriveCommand::SetRotationAxis(axis));
        Ok(())
    }
    fn rotate_left(&mut self) -> Result<()> {
        self.commands.push(DriveCommand::RotateLeft);
        Ok(())
    }
    fn rotate_right(&mut self) -> Result<()> {
        self.commands.push(DriveCommand::RotateRight);
        Ok(())
    }
    fn go_forward(&mut self, distance_mm: f64) -> Result<()> {
        self.commands.push(DriveCommand::GoForward(distance_mm));
        Ok(())
    }
    fn stop(&mut self) -> Result<()> {
        if self.fail_stop {
            return Err(NavError::Connection("stop frame lost".into()));
        }
        self.commands.push(DriveCommand::Stop);
        Ok(())
    }
    fn motion_finished(&mut self) -> Result<bool> {
        Ok(true)
    }
    fn read_obstacle_sensors(&mut self) -> Result<(u32, u32)> {
        if self.fail_sensors {
            return Err(NavError::Sensor("sensor bus unreachable".into()));
        }
        if let Some(delay) = self.sensor_delay {
            thread::sleep(delay);
        }
        Ok(self.readings.pop_front().unwrap_or((0, 0)))
    }
    fn disconnect(&mut self) -> Result<()> {
        self.commands.push(DriveCommand::Disconnect);
        Ok(())
    }
}

impl ScriptedDrive {
    fn motions(&self) -> Vec<DriveCommand> {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DriveCommand::RotateLeft
                        | DriveCommand::RotateRight
                        | DriveCommand::GoForward(_)
                        | DriveCommand::Stop
                )
            })
            .cloned()
            .collect()
    }
}

fn cells(v: &[(i32, i32)]) -> Vec<Cell> {
    v.iter().map(|&c| Cell::from(c)).collect()
}

fn state_for(path: &[(i32, i32)]) -> PathState {
    let path = Path::new(cells(path)).unwrap();
    PathState::new(
        OccupancyGrid::new(3).unwrap(),
        path.start(),
        path.goal(),
        Some(path),
        300.0,
    )
    .unwrap()
}

#[test]
fn obstacle_before_second_advance() {
    // (0,0) -> (0,1) -> (0,2): east twice
    let state = state_for(&[(0, 0), (0, 1), (0, 2)]);
    let mut drive = ScriptedDrive::default();
    drive.readings = VecDeque::from(vec![(0, 0), (30, 12)]);
    let mut executor = PathExecutor::new(drive, ExecutorConfig::default());
    let mut transport = MemoryTransport::new();

    let outcome = executor
        .run(&state, &mut transport, &StopSignal::new())
        .unwrap();

    let request = ReplanRequest {
        current: Cell::new(0, 1),
        blocked: Cell::new(0, 2),
    };
    match &outcome {
        RunOutcome::ReplanPending { request: r, grid } => {
            assert_eq!(*r, request);
            assert!(!grid.is_passable(&Cell::new(0, 2)).unwrap());
            assert!(grid.is_passable(&Cell::new(0, 1)).unwrap());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        executor.drive().motions(),
        vec![
            DriveCommand::RotateRight,
            DriveCommand::GoForward(300.0),
            DriveCommand::Stop
        ]
    );
    assert_eq!(executor.drive().commands.last(), Some(&DriveCommand::Disconnect));
    assert_eq!(executor.current_cell(), Some(Cell::new(0, 1)));
    assert_eq!(executor.heading(), Heading::East);
    assert_eq!(transport.take_replan().unwrap(), Some(request));
    assert_eq!(transport.take_replan().unwrap(), None);
}

#[test]
fn clockwise_loop_turns_right() {
    // East, south, then west around a 2x2 block
    let state = state_for(&[(0, 0), (0, 1), (1, 1), (1, 0)]);
    let mut executor = PathExecutor::new(ScriptedDrive::default(), ExecutorConfig::default());
    executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap();
    let rotations = executor
        .drive()
        .commands
        .iter()
        .filter(|c| {
            matches!(
                c,
                DriveCommand::SetRotation(_) | DriveCommand::RotateLeft | DriveCommand::RotateRight
            )
        })
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(
        rotations,
        vec![
            DriveCommand::SetRotation(90),
            DriveCommand::RotateRight,
            DriveCommand::SetRotation(90),
            DriveCommand::RotateRight,
            DriveCommand::SetRotation(90),
            DriveCommand::RotateRight,
        ]
    );
    assert_eq!(executor.heading(), Heading::West);
}

#[test]
fn half_turn_and_left_turn() {
    // south (180 from north), then east (left from south)
    let state = state_for(&[(0, 0), (1, 0), (1, 1)]);
    let mut executor = PathExecutor::new(ScriptedDrive::default(), ExecutorConfig::default());
    let outcome = executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap();
    assert_eq!(outcome, RunOutcome::Completed { at: Cell::new(1, 1) });
    let cmds = &executor.drive().commands;
    let half = cmds
        .iter()
        .position(|c| *c == DriveCommand::SetRotation(180))
        .unwrap();
    assert_eq!(cmds[half + 2], DriveCommand::RotateRight);
    assert_eq!(
        executor.drive().motions(),
        vec![
            DriveCommand::RotateRight,
            DriveCommand::GoForward(300.0),
            DriveCommand::RotateLeft,
            DriveCommand::GoForward(300.0),
            DriveCommand::Stop
        ]
    );
    assert_eq!(executor.state(), ExecutorState::Stopped);
}

#[test]
fn threshold_filters_sensor_noise() {
    let state = state_for(&[(2, 0), (1, 0), (0, 0)]);
    let mut drive = ScriptedDrive::default();
    drive.readings = VecDeque::from(vec![(10, 10), (25, 20)]);
    let config = ExecutorConfig {
        obstacle_threshold: 40,
        ..ExecutorConfig::default()
    };
    let mut executor = PathExecutor::new(drive, config);
    let outcome = executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap();
    assert!(matches!(outcome, RunOutcome::ReplanPending { request, .. }
        if request.current == Cell::new(1, 0) && request.blocked == Cell::new(0, 0)));
}

#[test]
fn single_cell_path_only_stops() {
    let state = state_for(&[(1, 1)]);
    let mut executor = PathExecutor::new(ScriptedDrive::default(), ExecutorConfig::default());
    let outcome = executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap();
    assert_eq!(outcome, RunOutcome::Completed { at: Cell::new(1, 1) });
    assert_eq!(executor.drive().motions(), vec![DriveCommand::Stop]);
}

#[test]
fn connection_failure_issues_no_motion() {
    let state = state_for(&[(0, 0), (0, 1)]);
    let drive = ScriptedDrive {
        fail_connect: true,
        ..ScriptedDrive::default()
    };
    let mut executor = PathExecutor::new(drive, ExecutorConfig::default());
    let err = executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap_err();
    assert!(matches!(err, NavError::Connection(_)));
    assert!(executor.drive().commands.is_empty());
}

#[test]
fn sensor_failure_is_fatal_and_cleans_up() {
    let state = state_for(&[(0, 0), (0, 1)]);
    let drive = ScriptedDrive {
        fail_sensors: true,
        ..ScriptedDrive::default()
    };
    let mut executor = PathExecutor::new(drive, ExecutorConfig::default());
    let mut transport = MemoryTransport::new();
    let err = executor
        .run(&state, &mut transport, &StopSignal::new())
        .unwrap_err();
    assert!(matches!(err, NavError::Sensor(_)));
    let cmds = &executor.drive().commands;
    assert!(!cmds.iter().any(|c| matches!(c, DriveCommand::GoForward(_))));
    assert_eq!(&cmds[cmds.len() - 2..], &[DriveCommand::Stop, DriveCommand::Disconnect]);
    assert_eq!(transport.replan_pending().unwrap(), None);
}

#[test]
fn heading_carries_over_between_runs() {
    let mut executor = PathExecutor::new(
        ScriptedDrive::default(),
        ExecutorConfig {
            initial_heading: Heading::East,
            ..ExecutorConfig::default()
        },
    );
    let mut transport = MemoryTransport::new();
    executor
        .run(&state_for(&[(0, 0), (0, 1)]), &mut transport, &StopSignal::new())
        .unwrap();
    assert!(executor.drive().motions().iter().all(|c| !matches!(
        c,
        DriveCommand::RotateLeft | DriveCommand::RotateRight
    )));
    executor.drive_mut().commands.clear();
    executor
        .run(&state_for(&[(0, 1), (1, 1)]), &mut transport, &StopSignal::new())
        .unwrap();
    assert_eq!(executor.drive().motions()[0], DriveCommand::RotateRight);
    assert_eq!(executor.heading(), Heading::South);
}

#[test]
fn slow_sensor_read_times_out() {
    // Straight north, no turn before the first reading
    let state = state_for(&[(1, 0), (0, 0)]);
    let drive = ScriptedDrive {
        sensor_delay: Some(Duration::from_millis(100)),
        ..ScriptedDrive::default()
    };
    let config = ExecutorConfig {
        motion_timeout: Duration::from_millis(20),
        ..ExecutorConfig::default()
    };
    let mut executor = PathExecutor::new(drive, config);
    let err = executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap_err();
    assert!(
        matches!(err, NavError::DriveTimeout { ref command, .. } if command == "read_obstacle_sensors")
    );
    let cmds = &executor.drive().commands;
    assert!(!cmds.iter().any(|c| matches!(c, DriveCommand::GoForward(_))));
    assert_eq!(&cmds[cmds.len() - 2..], &[DriveCommand::Stop, DriveCommand::Disconnect]);
}

#[test]
fn failed_stop_keeps_published_request() {
    let state = state_for(&[(0, 0), (0, 1)]);
    let drive = ScriptedDrive {
        readings: VecDeque::from(vec![(5, 5)]),
        fail_stop: true,
        ..ScriptedDrive::default()
    };
    let mut executor = PathExecutor::new(drive, ExecutorConfig::default());
    let mut transport = MemoryTransport::new();
    let outcome = executor
        .run(&state, &mut transport, &StopSignal::new())
        .unwrap();
    let request = ReplanRequest {
        current: Cell::new(0, 0),
        blocked: Cell::new(0, 1),
    };
    assert!(matches!(outcome, RunOutcome::ReplanPending { request: r, .. } if r == request));
    assert_eq!(transport.replan_pending().unwrap(), Some(request));
    assert_eq!(executor.drive().commands.last(), Some(&DriveCommand::Disconnect));
    assert_eq!(executor.state(), ExecutorState::Stopped);
}

#[test]
fn failed_stop_after_completion_is_reported() {
    let state = state_for(&[(0, 0), (1, 0)]);
    let drive = ScriptedDrive {
        fail_stop: true,
        ..ScriptedDrive::default()
    };
    let mut executor = PathExecutor::new(drive, ExecutorConfig::default());
    let err = executor
        .run(&state, &mut MemoryTransport::new(), &StopSignal::new())
        .unwrap_err();
    assert!(matches!(err, NavError::Connection(_)));
    assert_eq!(executor.drive().commands.last(), Some(&DriveCommand::Disconnect));
}
