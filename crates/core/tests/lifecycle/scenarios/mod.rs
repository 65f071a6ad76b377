//! Lifecycle test scenarios.
//!
//! Each module groups the runs that exercise one concern of the runner.

mod happy_path;
mod hook_faults;
