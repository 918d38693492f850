use macroquad::prelude::{
    Color, Rect, BLACK, WHITE,
    draw_line, draw_rectangle, draw_text, measure_text, screen_height, screen_width,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const ACTIONS: usize = 4;
pub const INVALID_MOVE_PENALTY: f32 = -10.0;
const FOUR_PROBABILITY: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Up,
    Right,
    Down,
    Left,
}

impl Move {
    pub const ALL: [Move; ACTIONS] = [Move::Up, Move::Right, Move::Down, Move::Left];

    pub fn from_index(action: usize) -> Move {
        match Move::ALL.get(action) {
            Some(mv) => *mv,
            None => panic!("action must be in 0..{}, got {}.", ACTIONS, action),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Square grid of tile exponents: 0 is empty, `k` is the tile `2^k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<u8>,
}

impl Board {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Builds a board from row-major tile values (`0` for empty, otherwise a power of two).
    pub fn from_tiles(size: usize, tiles: &[u32]) -> Self {
        assert_eq!(tiles.len(), size * size, "expected {} tiles", size * size);
        let cells = tiles
            .iter()
            .map(|&tile| match tile {
                0 => 0,
                t if t.is_power_of_two() && t > 1 => t.trailing_zeros() as u8,
                t => panic!("{} is not a valid tile", t),
            })
            .collect();
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn exponents(&self) -> &[u8] {
        &self.cells
    }

    pub fn tile(&self, row: usize, col: usize) -> u32 {
        match self.cells[row * self.size + col] {
            0 => 0,
            e => 1 << e,
        }
    }

    pub fn tiles(&self) -> Vec<u32> {
        (0..self.cells.len())
            .map(|i| self.tile(i / self.size, i % self.size))
            .collect()
    }

    pub fn empty_cells(&self) -> usize {
        self.cells.iter().filter(|&&e| e == 0).count()
    }

    pub fn max_tile(&self) -> u32 {
        match self.cells.iter().max() {
            Some(&e) if e > 0 => 1 << e,
            _ => 0,
        }
    }

    // cell indices of line `line`, starting at the edge tiles slide toward
    fn line(&self, mv: Move, line: usize) -> Vec<usize> {
        let n = self.size;
        match mv {
            Move::Left => (0..n).map(|c| line * n + c).collect(),
            Move::Right => (0..n).rev().map(|c| line * n + c).collect(),
            Move::Up => (0..n).map(|r| r * n + line).collect(),
            Move::Down => (0..n).rev().map(|r| r * n + line).collect(),
        }
    }

    /// Slides every line toward `mv`. Returns the new board, the merge score gained,
    /// and whether anything changed.
    pub fn shift(&self, mv: Move) -> (Board, u32, bool) {
        let mut next = self.clone();
        let mut gained = 0;

        for line in 0..self.size {
            let indices = self.line(mv, line);
            let tiles: Vec<u8> = indices.iter().map(|&i| self.cells[i]).filter(|&e| e != 0).collect();

            let mut merged = Vec::with_capacity(self.size);
            let mut k = 0;
            while k < tiles.len() {
                if k + 1 < tiles.len() && tiles[k] == tiles[k + 1] {
                    let exponent = tiles[k] + 1;
                    gained += 1u32 << exponent;
                    merged.push(exponent);
                    k += 2;
                } else {
                    merged.push(tiles[k]);
                    k += 1;
                }
            }
            merged.resize(self.size, 0);

            for (&i, &e) in indices.iter().zip(merged.iter()) {
                next.cells[i] = e;
            }
        }

        let moved = next.cells != self.cells;
        (next, gained, moved)
    }

    pub fn can_move(&self) -> bool {
        if self.empty_cells() > 0 {
            return true;
        }
        let n = self.size;
        (0..n).any(|r| {
            (0..n).any(|c| {
                let e = self.cells[r * n + c];
                (c + 1 < n && self.cells[r * n + c + 1] == e) || (r + 1 < n && self.cells[(r + 1) * n + c] == e)
            })
        })
    }
}

pub struct Game {
    board: Board,
    score: u32,
    moves: usize,
    alive: bool,
    spawning: bool,
    rng: StdRng,
}

impl Game {
    pub fn new(size: usize) -> Self {
        Self::with_rng(size, StdRng::from_os_rng())
    }

    pub fn seeded(size: usize, seed: u64) -> Self {
        Self::with_rng(size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(size: usize, rng: StdRng) -> Self {
        let mut instance = Self {
            board: Board::empty(size),
            score: 0,
            moves: 0,
            alive: true,
            spawning: true,
            rng,
        };
        instance.reset();
        instance
    }

    /// Wraps an existing board. A non-spawning game never adds tiles after a move.
    pub fn from_board(board: Board, spawning: bool) -> Self {
        let alive = board.can_move();
        Self {
            board,
            score: 0,
            moves: 0,
            alive,
            spawning,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn board(&self) -> &Board {&self.board}
    pub fn score(&self) -> u32 {self.score}
    pub fn moves(&self) -> usize {self.moves}
    pub fn alive(&self) -> bool {self.alive}
    pub fn spawning(&self) -> bool {self.spawning}

    pub fn copy_board(&self) -> Board {
        self.board.clone()
    }

    /// Non-spawning copy for planning; keeps the score so rollouts can compare totals.
    pub fn simulation(&self) -> Game {
        Game {
            score: self.score,
            moves: self.moves,
            ..Game::from_board(self.copy_board(), false)
        }
    }

    pub fn reset(&mut self) {
        self.board = Board::empty(self.board.size());
        self.score = 0;
        self.moves = 0;
        self.spawn_tile();
        self.spawn_tile();
        self.alive = self.board.can_move();
    }

    // 2 with probability 0.9, otherwise 4, on a uniformly chosen empty cell
    fn spawn_tile(&mut self) {
        let empty: Vec<usize> = (0..self.board.cells.len()).filter(|&i| self.board.cells[i] == 0).collect();
        if empty.is_empty() {
            return;
        }
        let cell = empty[self.rng.random_range(0..empty.len())];
        self.board.cells[cell] = if self.rng.random_bool(FOUR_PROBABILITY) { 2 } else { 1 };
    }


    // RL interface

    // returns (reward, done)
    // actions
    // 0: up, 1: right, 2: down, 3: left
    pub fn step(&mut self, action: usize) -> (f32, bool) {
        let (next, gained, moved) = self.board.shift(Move::from_index(action));

        if !moved {
            return (INVALID_MOVE_PENALTY, !self.alive);
        }

        self.board = next;
        self.score += gained;
        self.moves += 1;
        if self.spawning {
            self.spawn_tile();
        }
        self.alive = self.board.can_move();

        (gained as f32, !self.alive)
    }

    pub fn draw(&self, score_area_height: f32, score_text_size: f32) {
        let screen_w = screen_width();
        let screen_h = screen_height();

        // score area

        let score_area = Rect::new(0.0, 0.0, screen_w, score_area_height);
        draw_rectangle(
            score_area.x,
            score_area.y,
            score_area.w,
            score_area.h,
            Color::new(0.47, 0.43, 0.40, 1.0),
        );
        draw_line(score_area.x, score_area.h, screen_w, score_area.h, 2.0, BLACK);

        let score_text = format!("Score: {}   Best tile: {}", self.score, self.board.max_tile());
        let text_dims = measure_text(&score_text, None, score_text_size as u16, 1.0);
        draw_text(
            &score_text,
            score_area.w / 2.0 - text_dims.width / 2.0,
            score_area.y + score_area.h / 2.0 + text_dims.height / 2.0,
            score_text_size,
            WHITE,
        );


        // board

        let game_area = Rect::new(0.0, score_area.h, screen_w, screen_h - score_area.h);
        draw_rectangle(game_area.x, game_area.y, game_area.w, game_area.h, Color::new(0.73, 0.68, 0.63, 1.0));

        let n = self.board.size();
        let cell_width = game_area.w / n as f32;
        let cell_height = game_area.h / n as f32;
        let gap: f32 = 6.0;

        for row in 0..n {
            for col in 0..n {
                let x = game_area.x + col as f32 * cell_width + gap;
                let y = game_area.y + row as f32 * cell_height + gap;
                let exponent = self.board.exponents()[row * n + col];
                draw_rectangle(x, y, cell_width - 2.0 * gap, cell_height - 2.0 * gap, tile_color(exponent));

                if exponent == 0 {
                    continue;
                }
                let label = self.board.tile(row, col).to_string();
                let font_size = (cell_height * 0.45).min(cell_width * 1.6 / label.len() as f32);
                let dims = measure_text(&label, None, font_size as u16, 1.0);
                let text_color = if exponent <= 2 { Color::new(0.47, 0.43, 0.40, 1.0) } else { WHITE };
                draw_text(
                    &label,
                    x + (cell_width - 2.0 * gap - dims.width) / 2.0,
                    y + (cell_height - 2.0 * gap + dims.height) / 2.0,
                    font_size,
                    text_color,
                );
            }
        }
    }
}

fn tile_color(exponent: u8) -> Color {
    match exponent {
        0 => Color::new(0.80, 0.76, 0.71, 1.0),
        1 => Color::new(0.93, 0.89, 0.85, 1.0),
        2 => Color::new(0.93, 0.88, 0.78, 1.0),
        3 => Color::new(0.95, 0.69, 0.47, 1.0),
        4 => Color::new(0.96, 0.58, 0.39, 1.0),
        5 => Color::new(0.96, 0.49, 0.37, 1.0),
        6 => Color::new(0.96, 0.37, 0.23, 1.0),
        7..=11 => Color::new(0.93, 0.81, 0.45 - 0.03 * (exponent - 7) as f32, 1.0),
        _ => Color::new(0.24, 0.23, 0.20, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_left_merges_pairs_once() {
        let board = Board::from_tiles(4, &[
            2, 2, 2, 2,
            4, 0, 4, 8,
            2, 4, 8, 16,
            0, 0, 0, 0,
        ]);

        let (next, gained, moved) = board.shift(Move::Left);

        assert!(moved);
        assert_eq!(gained, 4 + 4 + 8);
        assert_eq!(next.tiles(), vec![
            4, 4, 0, 0,
            8, 8, 0, 0,
            2, 4, 8, 16,
            0, 0, 0, 0,
        ]);
    }

    #[test]
    fn test_shift_right_merges_from_the_far_edge() {
        let board = Board::from_tiles(4, &[
            2, 2, 2, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);

        let (next, gained, _) = board.shift(Move::Right);

        assert_eq!(gained, 4);
        assert_eq!(&next.tiles()[0..4], &[0, 0, 2, 4]);
    }

    #[test]
    fn test_shift_up_and_down() {
        let board = Board::from_tiles(3, &[
            2, 0, 0,
            2, 0, 0,
            4, 0, 2,
        ]);

        let (up, gained, _) = board.shift(Move::Up);
        assert_eq!(gained, 4);
        assert_eq!(up.tiles(), vec![4, 0, 2, 4, 0, 0, 0, 0, 0]);

        let (down, _, _) = board.shift(Move::Down);
        assert_eq!(down.tiles(), vec![0, 0, 0, 4, 0, 0, 4, 0, 2]);
    }

    #[test]
    fn test_shift_without_change() {
        let board = Board::from_tiles(2, &[2, 4, 0, 0]);
        let (next, gained, moved) = board.shift(Move::Up);

        assert!(!moved);
        assert_eq!(gained, 0);
        assert_eq!(next, board);
    }

    #[test]
    fn test_can_move() {
        assert!(Board::from_tiles(2, &[2, 4, 4, 0]).can_move());
        assert!(Board::from_tiles(2, &[2, 2, 4, 8]).can_move());
        assert!(!Board::from_tiles(2, &[2, 4, 4, 2]).can_move());
    }

    #[test]
    fn test_new_game_has_two_tiles() {
        let game = Game::seeded(4, 7);
        assert_eq!(game.board().empty_cells(), 14);
        assert!(game.alive());
        assert!(game.board().tiles().iter().all(|&t| t == 0 || t == 2 || t == 4));
    }

    #[test]
    fn test_step_rewards_merge_score_and_spawns() {
        let mut game = Game::from_board(Board::from_tiles(4, &[
            2, 2, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]), true);

        let (reward, done) = game.step(Move::Left.index());

        assert_eq!(reward, 4.0);
        assert!(!done);
        assert_eq!(game.score(), 4);
        assert_eq!(game.board().empty_cells(), 14);
    }

    #[test]
    fn test_invalid_move_penalty_keeps_board() {
        let mut game = Game::from_board(Board::from_tiles(2, &[2, 4, 0, 0]), true);
        let before = game.copy_board();

        let (reward, done) = game.step(Move::Up.index());

        assert_eq!(reward, INVALID_MOVE_PENALTY);
        assert!(!done);
        assert_eq!(game.copy_board(), before);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_simulation_never_spawns() {
        let mut game = Game::seeded(4, 3);
        game.step(Move::Left.index());
        let mut sim = game.simulation();
        let start_tiles = 16 - sim.board().empty_cells();

        sim.step(Move::Right.index());
        sim.step(Move::Down.index());

        assert!(!sim.spawning());
        assert!(16 - sim.board().empty_cells() <= start_tiles);
        assert!(sim.score() >= game.score());
    }

    #[test]
    fn test_game_over() {
        let mut game = Game::from_board(Board::from_tiles(2, &[2, 2, 4, 8]), true);
        let (reward, done) = game.step(Move::Left.index());

        // the two 4s stacked in the first column can still merge
        assert_eq!(reward, 4.0);
        assert!(!done);

        let mut stuck = Game::from_board(Board::from_tiles(2, &[2, 4, 4, 2]), true);
        assert!(!stuck.alive());
        assert_eq!(stuck.step(0), (INVALID_MOVE_PENALTY, true));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_action() {
        Game::seeded(4, 1).step(ACTIONS);
    }
}
