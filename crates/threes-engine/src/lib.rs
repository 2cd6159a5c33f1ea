//! Threes-style sliding-tile merge puzzle: the board, the per-line
//! shift/merge transform, scoring, and random seeding behind injectable
//! RNGs. The terminal front end lives in a separate crate.

pub mod engine;
