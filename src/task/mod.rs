//! Poll task fleet (SPEC_FULL.md §4.7, §4.8).

pub mod classify;
pub mod manager;
pub mod poll;

pub use classify::{classify, Classification};
pub use manager::TaskManager;
pub use poll::PollTask;
