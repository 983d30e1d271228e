//! Tests for sweep planning
//!
//! Tests are organized by topic:
//! - `enumeration` - Order, counts, duplicates and fixed fields of the default sweep
//! - `command` - Shell line rendering
//! - `plan` - Plan validation and YAML-style overrides
//! - `results` - Result naming, matching and aggregation

mod plan;
