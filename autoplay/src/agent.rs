use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use mineboard_core::{Board, Coord2, GameState, TrainingSample};
use rand::Rng;

/// Appends one JSON object per line.
pub struct SampleSink {
    writer: BufWriter<File>,
    written: u64,
}

impl SampleSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Could not create sample file {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, sample: &TrainingSample) -> Result<()> {
        serde_json::to_writer(&mut self.writer, sample).context("Could not encode sample")?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush().context("Could not flush sample file")?;
        Ok(self.written)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct GameReport {
    pub state: GameState,
    pub guesses: u32,
    pub solver_passes: u32,
}

/// Plays until the game ends: solve as far as the constraints allow, otherwise guess a random hidden cell.
pub fn play_game<R: Rng>(
    board: &mut Board,
    rng: &mut R,
    mut samples: Option<&mut SampleSink>,
) -> Result<GameReport> {
    let mut guesses = 0;
    let mut solver_passes = 0;

    while board.game_state().is_playing() {
        let summary = board.auto_solve();
        solver_passes += summary.passes;
        if let Some(sink) = samples.as_deref_mut() {
            sink.write(&board.training_sample())?;
        }
        if !summary.state.is_playing() {
            break;
        }

        let hidden = hidden_cells(board);
        if hidden.is_empty() {
            log::warn!("No hidden cell left to guess while still playing");
            break;
        }
        let coords = hidden[rng.random_range(0..hidden.len())];
        guesses += 1;
        let result = board.reveal_cell(coords);
        if result.has_update() {
            log::debug!("Guess {} at {:?}: {:?}", guesses, coords, result);
        } else {
            log::warn!("Guess {} at {:?} changed nothing: {:?}", guesses, coords, result);
        }
    }

    if board.game_state() == GameState::Lost {
        board.reveal_all_cells();
    }

    Ok(GameReport {
        state: board.game_state(),
        guesses,
        solver_passes,
    })
}

fn hidden_cells(board: &Board) -> Vec<Coord2> {
    let size = board.board_size();
    (0..size)
        .flat_map(|row| (0..size).map(move |col| (row, col)))
        .filter(|&coords| !board.is_revealed(coords) && !board.is_flagged(coords))
        .collect()
}

/// Text rendering of the visible board, mines shown once revealed.
pub fn render(board: &Board) -> String {
    let visible = board.visible_board();
    let mut out = String::new();
    for ((row, col), &code) in visible.indexed_iter() {
        let coords = (row as u8, col as u8);
        let glyph = match code {
            -1 => 'F',
            -2 => '#',
            _ if board.has_mine(coords) => '*',
            0 => '.',
            count => char::from(b'0' + count as u8),
        };
        out.push(glyph);
        if col + 1 == visible.ncols() {
            out.push('\n');
        }
    }
    out
}
