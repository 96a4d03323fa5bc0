//! Domain Services - Pure functions over a game snapshot
//!
//! Every service takes the state by shared reference and returns an
//! outcome. None of them mutate anything.

pub mod registry;
pub mod resolver;
pub mod tally;
pub mod win;
