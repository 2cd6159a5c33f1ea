use rand::seq::SliceRandom;
use rand::Rng;

use super::state::Cell;

/// Chance that the trailing slot of a moved line receives a new tile.
const SPAWN_CHANCE: f64 = 0.5;

/// Slot in a line mid-transform. `None` marks a position vacated by a merge
/// until the pad pass resolves it to an empty cell; it never reaches the
/// board.
type Slot = Option<Cell>;

/// Pure left-transform of one line: collapse adjacent pairs, shift values
/// one step toward the front, pad back to the input length.
///
/// Returns the transformed line and the total value of the merges it made.
/// Callers reverse the input and the output to run the same logic
/// right-to-left; no randomness is drawn and no score is touched here.
///
/// ```
/// use threes_engine::engine::{shift_line, Cell};
///
/// let (line, gained) = shift_line(&[Cell::One, Cell::Two, Cell::Empty]);
/// assert_eq!(line, vec![Cell::Sum(3), Cell::Empty, Cell::Empty]);
/// assert_eq!(gained, 3);
/// ```
pub fn shift_line(line: &[Cell]) -> (Vec<Cell>, u64) {
    let (collapsed, gained) = collapse_adjacent(line);
    let shifted = shift_forward(collapsed);
    (pad_line(shifted, line.len()), gained)
}

/// Sliding window over the last two cells consumed by a scan.
#[derive(Debug, Clone, Copy)]
struct RecentPair {
    just: Cell,
    prev: Cell,
}

impl RecentPair {
    fn new() -> Self {
        RecentPair {
            just: Cell::Empty,
            prev: Cell::Empty,
        }
    }

    fn push(&mut self, cell: Cell) {
        self.prev = self.just;
        self.just = cell;
    }

    fn reset(&mut self) {
        *self = RecentPair::new();
    }

    /// The merged rank if the two most recent cells collapse into one tile:
    /// the two different base kinds in either order, or two non-empty cells
    /// of equal rank. Two `One`s never collapse.
    fn collapse_value(&self) -> Option<u32> {
        let x = self.just.rank()?;
        let y = self.prev.rank()?;
        match (self.just, self.prev) {
            (Cell::One, Cell::One) => None,
            (Cell::One, Cell::Two) | (Cell::Two, Cell::One) => Some(x + y),
            _ if x == y => Some(x + y),
            _ => None,
        }
    }
}

/// Collapse pass: merge adjacent pairs left to right. A merge consumes both
/// tiles, writes the sum into the later slot and a placeholder into the
/// earlier one, and resets the window so the sum cannot chain into the next
/// cell on the same move.
fn collapse_adjacent(line: &[Cell]) -> (Vec<Slot>, u64) {
    let mut out: Vec<Slot> = Vec::with_capacity(line.len());
    let mut window = RecentPair::new();
    let mut gained = 0u64;

    for &cell in line {
        window.push(cell);
        match window.collapse_value() {
            Some(merged) => {
                out.pop(); // slot holding the first tile of the pair
                out.push(None);
                out.push(Some(Cell::Sum(merged)));
                gained += u64::from(merged);
                window.reset();
            }
            None => out.push(Some(cell)),
        }
    }

    (out, gained)
}

/// One-shot latch for the leading-empty absorption, scoped to a single
/// shift pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftLatch {
    /// No cell consumed yet.
    Fresh,
    /// The line opened with an empty; the absorption has fired.
    AbsorbedLeadingEmpty,
    /// A value has been consumed; only empty-before-value shifts remain.
    SeenValue,
}

/// Shift pass: a non-empty value moves one slot toward the front when the
/// cell before it was empty (the empty slot is dropped). Placeholders count
/// as empty for the comparison but stay in the stream for the pad pass.
fn shift_forward(slots: Vec<Slot>) -> Vec<Slot> {
    let mut out: Vec<Slot> = Vec::with_capacity(slots.len());
    let mut latch = ShiftLatch::Fresh;
    let mut prev = Cell::Empty;

    for slot in slots {
        let seen = slot.unwrap_or(Cell::Empty);
        let drop_prev = if seen.is_empty() {
            if latch == ShiftLatch::Fresh && prev.is_empty() {
                latch = ShiftLatch::AbsorbedLeadingEmpty;
                true
            } else {
                false
            }
        } else {
            latch = ShiftLatch::SeenValue;
            prev.is_empty()
        };
        if drop_prev {
            out.pop();
        }
        out.push(slot);
        prev = seen;
    }

    out
}

/// Pad pass: resolve placeholders to empties (each placeholder ahead of the
/// first real slot adds one trailing empty) and pad the tail back to the
/// original line length.
fn pad_line(slots: Vec<Slot>, len: usize) -> Vec<Cell> {
    let mut out: Vec<Cell> = Vec::with_capacity(len);
    let mut trailing = 0usize;
    let mut seen_slot = false;

    for slot in slots {
        match slot {
            Some(cell) => {
                seen_slot = true;
                out.push(cell);
            }
            None => {
                if !seen_slot {
                    trailing += 1;
                }
                out.push(Cell::Empty);
            }
        }
    }

    out.extend(std::iter::repeat(Cell::Empty).take(trailing));
    while out.len() < len {
        out.push(Cell::Empty);
    }
    out
}

/// Drop a replacement tile into the trailing slot of a line that moved,
/// with probability `SPAWN_CHANCE`, choosing uniformly between the two base
/// kinds.
pub(crate) fn spawn_tile<R: Rng + ?Sized>(line: &mut [Cell], rng: &mut R) {
    match line.last_mut() {
        Some(last) if last.is_empty() => {
            if rng.gen_bool(SPAWN_CHANCE) {
                *last = if rng.gen_bool(0.5) { Cell::One } else { Cell::Two };
            }
        }
        _ => {}
    }
}

/// Seed a fresh grid: `ceil(fill_ratio * cells)` starting tiles drawn with a
/// per-board bias between the two base kinds, shuffled into place row-major.
pub(crate) fn populate<R: Rng + ?Sized>(
    rows: usize,
    columns: usize,
    fill_ratio: f64,
    rng: &mut R,
) -> Vec<Cell> {
    let total = rows * columns;
    let fill = ((fill_ratio * total as f64).ceil() as usize).min(total);
    let chance_of_one: f64 = rng.gen();

    let mut cells: Vec<Cell> = (0..fill)
        .map(|_| {
            if rng.gen::<f64>() <= chance_of_one {
                Cell::One
            } else {
                Cell::Two
            }
        })
        .collect();
    cells.resize(total, Cell::Empty);
    cells.shuffle(rng);
    cells
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    // StepRng at the top of the u64 range never passes a gen_bool draw, so
    // spawn_tile with it leaves the line alone; at zero it always passes.
    fn no_spawn_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn spawn_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    #[test]
    fn it_collapses_cross_kind_pair() {
        let (line, gained) = shift_line(&[Cell::One, Cell::Two, Cell::Empty]);
        assert_eq!(line, vec![Cell::Sum(3), Cell::Empty, Cell::Empty]);
        assert_eq!(gained, 3);
    }

    #[test]
    fn it_never_merges_two_ones() {
        let (line, gained) = shift_line(&[Cell::One, Cell::One]);
        assert_eq!(line, vec![Cell::One, Cell::One]);
        assert_eq!(gained, 0);
    }

    #[test]
    fn it_merges_equal_ranks() {
        let (line, gained) = shift_line(&[Cell::Two, Cell::Two]);
        assert_eq!(line, vec![Cell::Sum(4), Cell::Empty]);
        assert_eq!(gained, 4);

        let (line, gained) = shift_line(&[Cell::Sum(3), Cell::Sum(3), Cell::One]);
        assert_eq!(line, vec![Cell::Sum(6), Cell::One, Cell::Empty]);
        assert_eq!(gained, 6);
    }

    #[test]
    fn it_merge_consumes_both_tiles() {
        // The freshly merged sum does not chain into the next cell.
        let (line, gained) = shift_line(&[Cell::One, Cell::Two, Cell::Sum(3)]);
        assert_eq!(line, vec![Cell::Sum(3), Cell::Sum(3), Cell::Empty]);
        assert_eq!(gained, 3);
    }

    #[test]
    fn it_shifts_a_single_step() {
        let (line, gained) = shift_line(&[Cell::Empty, Cell::One, Cell::Empty]);
        assert_eq!(line, vec![Cell::One, Cell::Empty, Cell::Empty]);
        assert_eq!(gained, 0);

        // One step per transform, not a full compaction.
        let (line, _) = shift_line(&[Cell::Empty, Cell::Empty, Cell::One]);
        assert_eq!(line, vec![Cell::Empty, Cell::One, Cell::Empty]);
    }

    #[test]
    fn it_closes_interior_gaps() {
        let (line, _) = shift_line(&[Cell::One, Cell::Empty, Cell::One]);
        assert_eq!(line, vec![Cell::One, Cell::One, Cell::Empty]);
    }

    #[test]
    fn test_unchanged_line_comes_back_verbatim() {
        for line in [
            vec![Cell::One, Cell::One, Cell::Sum(6)],
            vec![Cell::One, Cell::Sum(3), Cell::One],
            vec![Cell::Empty, Cell::Empty, Cell::Empty],
        ] {
            assert_eq!(shift_line(&line).0, line);
        }
    }

    #[test]
    fn test_line_length_preserved() {
        let lines: [&[Cell]; 5] = [
            &[Cell::Empty],
            &[Cell::One, Cell::Two],
            &[Cell::Two, Cell::Two, Cell::Two, Cell::Two],
            &[Cell::Empty, Cell::Sum(3), Cell::Sum(3), Cell::Empty, Cell::One],
            &[Cell::One, Cell::Empty, Cell::Two, Cell::Empty, Cell::One, Cell::Two],
        ];
        for line in lines {
            assert_eq!(shift_line(line).0.len(), line.len());
        }
    }

    #[test]
    fn it_spawn_respects_rng() {
        let mut line = vec![Cell::One, Cell::Empty];
        spawn_tile(&mut line, &mut no_spawn_rng());
        assert_eq!(line, vec![Cell::One, Cell::Empty]);

        spawn_tile(&mut line, &mut spawn_rng());
        assert!(!line[1].is_empty());

        // An occupied tail never spawns.
        let mut full = vec![Cell::One, Cell::Two];
        spawn_tile(&mut full, &mut spawn_rng());
        assert_eq!(full, vec![Cell::One, Cell::Two]);
    }

    #[test]
    fn test_populate_fill_count() {
        let mut rng = StdRng::seed_from_u64(42);

        let cells = populate(4, 5, 0.3, &mut rng);
        assert_eq!(cells.len(), 20);
        assert_eq!(cells.iter().filter(|c| !c.is_empty()).count(), 6); // ceil(0.3 * 20)

        let empty = populate(3, 3, 0.0, &mut rng);
        assert!(empty.iter().all(|c| c.is_empty()));

        // Out-of-range ratios clamp to a full board.
        let full = populate(2, 2, 1.5, &mut rng);
        assert!(full.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_populate_is_deterministic_under_seed() {
        let a = populate(5, 5, 0.5, &mut StdRng::seed_from_u64(9));
        let b = populate(5, 5, 0.5, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
