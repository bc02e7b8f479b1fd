//! File actions module.
//!
//! This module turns confirmed duplicate groups into symlink replacements:
//! - Planning: one [`ReplacementPlan`] per non-canonical member
//! - Dry-run reporting (default) or real replacement
//! - Pre-flight verification against the scan before each swap
//!
//! ```no_run
//! use symdupe::actions::{apply_plans, plan_replacements, LinkConfig};
//! use symdupe::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! let report = apply_plans(&plan_replacements(&groups), &LinkConfig::real());
//! println!("{}", report.summary());
//! ```

pub mod link;

// Re-export commonly used types
pub use link::{
    apply_plan, apply_plans, plan_replacements, replace_with_symlink, LinkConfig, LinkError,
    LinkMode, LinkReport, ReplacementOutcome, ReplacementPlan, SkipReason,
};
