//! HTML rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! backend body (text)
//!     → rules.rs (one combined scan, match classified by prefix:
//!                 meta / link / analytics marker / script)
//!     → rewriter.rs (per-match rule, then global origin substitution)
//!     → rewritten body + RewriteStats
//!
//! backend body (raw) + backend status
//!     → status.rs (soft-404 title check)
//!     → corrected status
//! ```
//!
//! # Design Decisions
//! - Pattern based, not a DOM round trip: untouched bytes stay identical
//! - Rule toggles are passed in, never read from shared state
//! - The origin substitution is a blunt catch-all and also hits plain text

pub mod rewriter;
pub mod rules;
pub mod status;

pub use rewriter::{ContentRewriter, RewriteStats, Rewritten};
pub use rules::MatchKind;
pub use status::{corrected_status, is_soft_404};
