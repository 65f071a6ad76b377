//! Lifecycle integration tests for caseflow-core.
//!
//! These tests drive whole test case lifecycles through scripted runners and
//! check the published event streams, fault reporting, and cancellation.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (scripted runner, test cases, assertions)
//! - `scenarios/` -- Test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p caseflow-core --test lifecycle
//! ```

mod scenarios;
