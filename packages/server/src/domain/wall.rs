//! Wall configuration and the synchronized dispatch computation.
//!
//! `plan_sync` is pure: given the same `now`, delay and members it always
//! yields the same start instant and tile layout.

use super::{
    error::{DispatchError, PairingError, ValidationError},
    value_object::{ConnectionId, MediaUrl, TileIndex, Timestamp},
};

/// Largest accepted number of rows or columns
pub const MAX_GRID_DIM: u32 = 16;

pub const MIN_START_DELAY_MS: i64 = 1_000;
pub const MAX_START_DELAY_MS: i64 = 10_000;
pub const DEFAULT_START_DELAY_MS: i64 = 2_500;

/// How the media is spread over the wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallMode {
    /// Every display shows the full frame
    #[default]
    Unified,
    /// Each display renders one cell of a `rows × cols` grid
    Painting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    rows: u32,
    cols: u32,
}

impl GridShape {
    pub fn new(rows: u32, cols: u32) -> Result<Self, ValidationError> {
        let valid = |n: u32| (1..=MAX_GRID_DIM).contains(&n);
        if !valid(rows) || !valid(cols) {
            return Err(ValidationError::InvalidGrid { max: MAX_GRID_DIM });
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn capacity(&self) -> u32 {
        self.rows * self.cols
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

/// Per-admin wall settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WallConfig {
    pub grid: GridShape,
    pub mode: WallMode,
    pub media_url: Option<MediaUrl>,
    /// Whether the admin's own screen takes part in playback
    pub include_self: bool,
}

/// Partial update of a `WallConfig`; `None` keeps the current value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WallPatch {
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub mode: Option<WallMode>,
    pub media_url: Option<MediaUrl>,
    pub include_self: Option<bool>,
}

impl WallConfig {
    /// The config with `patch` applied. `self` is untouched when the patch is invalid.
    pub fn patched(&self, patch: &WallPatch) -> Result<WallConfig, ValidationError> {
        let grid = GridShape::new(
            patch.rows.unwrap_or(self.grid.rows),
            patch.cols.unwrap_or(self.grid.cols),
        )?;
        Ok(WallConfig {
            grid,
            mode: patch.mode.unwrap_or(self.mode),
            media_url: patch.media_url.clone().or_else(|| self.media_url.clone()),
            include_self: patch.include_self.unwrap_or(self.include_self),
        })
    }
}

/// A display taking part in a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMember {
    pub id: ConnectionId,
    /// Explicit assignment, honoured when in range and not already taken
    pub preferred: Option<TileIndex>,
}

/// Result of a dispatch computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub start_at: Timestamp,
    pub grid: GridShape,
    pub mode: WallMode,
    pub media_url: MediaUrl,
    /// Recipients in dispatch order, with their tile in painting mode
    pub assignments: Vec<(ConnectionId, Option<TileIndex>)>,
}

/// Clamp the requested lead time into `[MIN_START_DELAY_MS, MAX_START_DELAY_MS]`.
pub fn clamp_start_delay(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_START_DELAY_MS)
        .clamp(MIN_START_DELAY_MS, MAX_START_DELAY_MS)
}

/// Compute the shared start instant and tile layout for `members`.
pub fn plan_sync(
    now: Timestamp,
    config: &WallConfig,
    start_delay_ms: Option<i64>,
    members: &[DisplayMember],
) -> Result<SyncPlan, PairingError> {
    if members.is_empty() {
        return Err(DispatchError::NoGroup.into());
    }
    let media_url = config
        .media_url
        .clone()
        .ok_or(ValidationError::MissingMediaUrl)?;

    let tiles = match config.mode {
        WallMode::Unified => vec![None; members.len()],
        WallMode::Painting => assign_tiles(config.grid, members)?,
    };

    Ok(SyncPlan {
        start_at: now.plus_millis(clamp_start_delay(start_delay_ms)),
        grid: config.grid,
        mode: config.mode,
        media_url,
        assignments: members
            .iter()
            .map(|m| m.id.clone())
            .zip(tiles)
            .collect(),
    })
}

fn assign_tiles(
    grid: GridShape,
    members: &[DisplayMember],
) -> Result<Vec<Option<TileIndex>>, DispatchError> {
    let capacity = grid.capacity();
    if members.len() > capacity as usize {
        return Err(DispatchError::GridTooSmall {
            count: members.len(),
            capacity,
        });
    }

    let mut taken = vec![false; capacity as usize];
    let mut tiles: Vec<Option<TileIndex>> = members
        .iter()
        .map(|member| {
            let preferred = member.preferred?;
            let slot = taken.get_mut(preferred.value() as usize)?;
            if *slot {
                return None;
            }
            *slot = true;
            Some(preferred)
        })
        .collect();

    let mut free = (0..capacity).filter(|t| !taken[*t as usize]);
    for tile in tiles.iter_mut().filter(|t| t.is_none()) {
        *tile = free.next().map(TileIndex::new);
    }
    Ok(tiles)
}
