//! Saving and loading games.
//!
//! A saved game is the raw byte dump of a single [`State`] with every
//! tree-transient field (children, expansion latch, playout statistics)
//! dropped: the board cells, the ply counter, the producing move and the
//! check flag survive, everything else is reconstituted as zero on load.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use zerocopy::{FromBytes as _, IntoBytes as _};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::board::{Board, Cell, Move, State, EMPTY_BOARD};

/// Directory autosaves are written into, created lazily next to the
/// process's working directory.
pub const HISTORY_DIR: &str = "history";

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is truncated or malformed")]
    Malformed,
}

/// On-disk layout of a saved game. `repr(C)` with explicit padding so the
/// byte image is stable.
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct SaveRecord {
    board: [u8; 128],
    ply: u32,
    last_move: u32,
    check: u8,
    _reserved: [u8; 3],
}

impl SaveRecord {
    fn from_state(state: &State) -> Self {
        let mut board = [0u8; 128];
        for (index, byte) in board.iter_mut().enumerate() {
            *byte = state.board()[index].get();
        }

        Self {
            board,
            ply: state.ply(),
            last_move: state.last_move().get(),
            check: state.in_check() as u8,
            _reserved: [0; 3],
        }
    }

    fn into_state(self) -> State {
        let mut board: Board = EMPTY_BOARD;
        for (cell, byte) in board.iter_mut().zip(self.board) {
            *cell = Cell::from_byte(byte);
        }

        State::restore_transients(self.ply, board, Move::from_u32(self.last_move), self.check != 0)
    }
}

/// Writes `state` to `history/move{ply}.game`, creating the history
/// directory on first use. Returns the path written.
pub fn autosave(state: &State) -> Result<PathBuf, SaveError> {
    fs::create_dir_all(HISTORY_DIR)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(HISTORY_DIR, fs::Permissions::from_mode(0o777))?;
    }

    let path = PathBuf::from(HISTORY_DIR).join(format!("move{}.game", state.ply()));
    save_to(state, &path)?;
    Ok(path)
}

/// Writes `state` to an arbitrary path.
pub fn save_to(state: &State, path: &Path) -> Result<(), SaveError> {
    let record = SaveRecord::from_state(state);
    fs::write(path, record.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o666))?;
    }
    Ok(())
}

/// Reconstitutes a state saved with [`save_to`] or [`autosave`]. The loaded
/// state is a fresh root: no children, no statistics, expansion pending.
pub fn load(path: &Path) -> Result<State, SaveError> {
    let data = fs::read(path)?;
    let record = SaveRecord::read_from_bytes(&data).map_err(|_| SaveError::Malformed)?;
    Ok(record.into_state())
}
