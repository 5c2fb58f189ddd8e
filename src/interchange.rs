//! Records exchanged between the planning and execution phases, and the transports that
//! carry them.
//!
//! Three records exist: the grid record (`grid.json`), the path record (`path.json`) and the
//! replan request (`replan_request.json`). The core never assumes a particular transport;
//! [FileTransport] and [MemoryTransport] are the two provided.
use crate::cell::Cell;
use crate::error::{NavError, Result};
use crate::grid::OccupancyGrid;
use crate::pathfinder::Path;
use log::{debug, info};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path as FsPath, PathBuf};

/// `{ grid, start, goal, cell_mm }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridRecord {
    pub grid: Vec<Vec<u8>>,
    pub start: Cell,
    pub goal: Cell,
    pub cell_mm: f64,
}

/// `{ path, start, goal, cell_mm }`. An empty path means no path was found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: Vec<Cell>,
    pub start: Cell,
    pub goal: Cell,
    pub cell_mm: f64,
}

/// Written once when an obstacle invalidates the running path: the cell the agent stood on
/// and the cell it found blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplanRequest {
    pub current: Cell,
    pub blocked: Cell,
}

/// A computed path bundled with the grid and metadata it was computed against.
#[derive(Clone, Debug, PartialEq)]
pub struct PathState {
    pub grid: OccupancyGrid,
    pub start: Cell,
    pub goal: Cell,
    pub path: Option<Path>,
    /// Physical edge length of one cell in millimetres.
    pub cell_mm: f64,
}

impl PathState {
    pub fn new(
        grid: OccupancyGrid,
        start: Cell,
        goal: Cell,
        path: Option<Path>,
        cell_mm: f64,
    ) -> Result<PathState> {
        let state = PathState {
            grid,
            start,
            goal,
            path,
            cell_mm,
        };
        state.validate()?;
        Ok(state)
    }

    fn validate(&self) -> Result<()> {
        if !(self.cell_mm.is_finite() && self.cell_mm > 0.0) {
            return Err(NavError::Interchange(format!(
                "cell_mm must be positive, got {}",
                self.cell_mm
            )));
        }
        for (name, cell) in [("start", &self.start), ("goal", &self.goal)] {
            if !self.grid.in_bounds(cell) {
                return Err(NavError::Interchange(format!(
                    "{} {} is outside the {}x{} grid",
                    name,
                    cell,
                    self.grid.size(),
                    self.grid.size()
                )));
            }
        }
        if let Some(path) = &self.path {
            if path.start() != self.start || path.goal() != self.goal {
                return Err(NavError::Interchange(format!(
                    "path runs {} -> {} but the record says {} -> {}",
                    path.start(),
                    path.goal(),
                    self.start,
                    self.goal
                )));
            }
            if let Some(c) = path.cells().iter().find(|c| !self.grid.in_bounds(c)) {
                return Err(NavError::Interchange(format!("path cell {} is out of bounds", c)));
            }
            if let Some(c) = path.cells().iter().find(|c| !self.grid.can_move_to(c)) {
                return Err(NavError::Interchange(format!("path crosses blocked cell {}", c)));
            }
        }
        Ok(())
    }

    pub fn grid_record(&self) -> GridRecord {
        GridRecord {
            grid: self.grid.to_rows(),
            start: self.start,
            goal: self.goal,
            cell_mm: self.cell_mm,
        }
    }

    pub fn path_record(&self) -> PathRecord {
        PathRecord {
            path: self
                .path
                .as_ref()
                .map(|p| p.cells().to_vec())
                .unwrap_or_default(),
            start: self.start,
            goal: self.goal,
            cell_mm: self.cell_mm,
        }
    }

    /// Reassembles a state from the two records, validating the schema and checking that both
    /// records describe the same query.
    pub fn from_records(grid: GridRecord, path: PathRecord) -> Result<PathState> {
        if grid.start != path.start || grid.goal != path.goal {
            return Err(NavError::Interchange(
                "grid and path records disagree on start/goal".into(),
            ));
        }
        let cells = if path.path.is_empty() {
            None
        } else {
            Some(Path::new(path.path)?)
        };
        PathState::new(
            OccupancyGrid::from_rows(&grid.grid)?,
            path.start,
            path.goal,
            cells,
            path.cell_mm,
        )
    }
}

/// A one-shot handoff medium for the interchange records.
///
/// Writers publish a full record at once. A replan request is write-once, read-once:
/// publishing while a previous request is unconsumed fails with [NavError::ReplanPending].
pub trait Transport {
    fn write_grid(&mut self, record: &GridRecord) -> Result<()>;
    fn read_grid(&mut self) -> Result<GridRecord>;
    fn write_path(&mut self, record: &PathRecord) -> Result<()>;
    fn read_path(&mut self) -> Result<PathRecord>;
    fn publish_replan(&mut self, request: &ReplanRequest) -> Result<()>;
    /// Consumes the pending replan request, if any.
    fn take_replan(&mut self) -> Result<Option<ReplanRequest>>;
    fn replan_pending(&self) -> Result<Option<ReplanRequest>>;

    fn write_state(&mut self, state: &PathState) -> Result<()> {
        self.write_grid(&state.grid_record())?;
        self.write_path(&state.path_record())
    }

    fn read_state(&mut self) -> Result<PathState> {
        let grid = self.read_grid()?;
        let path = self.read_path()?;
        PathState::from_records(grid, path)
    }
}

/// In-process transport.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    grid: Option<GridRecord>,
    path: Option<PathRecord>,
    replan: Option<ReplanRequest>,
}

impl MemoryTransport {
    pub fn new() -> MemoryTransport {
        MemoryTransport::default()
    }
}

impl Transport for MemoryTransport {
    fn write_grid(&mut self, record: &GridRecord) -> Result<()> {
        self.grid = Some(record.clone());
        Ok(())
    }
    fn read_grid(&mut self) -> Result<GridRecord> {
        self.grid
            .clone()
            .ok_or_else(|| NavError::Interchange("no grid record available".into()))
    }
    fn write_path(&mut self, record: &PathRecord) -> Result<()> {
        self.path = Some(record.clone());
        Ok(())
    }
    fn read_path(&mut self) -> Result<PathRecord> {
        self.path
            .clone()
            .ok_or_else(|| NavError::Interchange("no path record available".into()))
    }
    fn publish_replan(&mut self, request: &ReplanRequest) -> Result<()> {
        if let Some(pending) = self.replan {
            return Err(NavError::ReplanPending {
                current: pending.current,
                blocked: pending.blocked,
            });
        }
        self.replan = Some(*request);
        Ok(())
    }
    fn take_replan(&mut self) -> Result<Option<ReplanRequest>> {
        Ok(self.replan.take())
    }
    fn replan_pending(&self) -> Result<Option<ReplanRequest>> {
        Ok(self.replan)
    }
}

/// Stores each record as a pretty-printed JSON file in a directory. Writes go to a temporary
/// file that is then renamed over the target, so readers never see a partial record.
#[derive(Clone, Debug)]
pub struct FileTransport {
    dir: PathBuf,
    grid_file: String,
    path_file: String,
    replan_file: String,
}

impl FileTransport {
    pub fn new<P: AsRef<FsPath>>(dir: P) -> FileTransport {
        FileTransport {
            dir: dir.as_ref().to_path_buf(),
            grid_file: "grid.json".to_owned(),
            path_file: "path.json".to_owned(),
            replan_file: "replan_request.json".to_owned(),
        }
    }

    pub fn with_file_names(mut self, grid: &str, path: &str, replan: &str) -> FileTransport {
        self.grid_file = grid.to_owned();
        self.path_file = path.to_owned();
        self.replan_file = replan.to_owned();
        self
    }

    pub fn grid_path(&self) -> PathBuf {
        self.dir.join(&self.grid_file)
    }

    pub fn path_path(&self) -> PathBuf {
        self.dir.join(&self.path_file)
    }

    pub fn replan_path(&self) -> PathBuf {
        self.dir.join(&self.replan_file)
    }

    fn write_atomic<T: Serialize>(&self, target: &FsPath, record: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        let mut tmp = target.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, target)?;
        debug!("Wrote {}", target.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, source: &FsPath) -> Result<T> {
        let text = fs::read_to_string(source)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Transport for FileTransport {
    fn write_grid(&mut self, record: &GridRecord) -> Result<()> {
        self.write_atomic(&self.grid_path(), record)
    }
    fn read_grid(&mut self) -> Result<GridRecord> {
        self.read_json(&self.grid_path())
    }
    fn write_path(&mut self, record: &PathRecord) -> Result<()> {
        self.write_atomic(&self.path_path(), record)
    }
    fn read_path(&mut self) -> Result<PathRecord> {
        self.read_json(&self.path_path())
    }
    fn publish_replan(&mut self, request: &ReplanRequest) -> Result<()> {
        if let Some(pending) = self.replan_pending()? {
            return Err(NavError::ReplanPending {
                current: pending.current,
                blocked: pending.blocked,
            });
        }
        self.write_atomic(&self.replan_path(), request)?;
        info!("Replan request written to {}", self.replan_path().display());
        Ok(())
    }
    fn take_replan(&mut self) -> Result<Option<ReplanRequest>> {
        let request = self.replan_pending()?;
        if request.is_some() {
            fs::remove_file(self.replan_path())?;
        }
        Ok(request)
    }
    fn replan_pending(&self) -> Result<Option<ReplanRequest>> {
        let path = self.replan_path();
        if !path.exists() {
            return Ok(None);
        }
        self.read_json(&path).map(Some)
    }
}
