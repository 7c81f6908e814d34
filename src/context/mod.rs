//! Build context access
//!
//! The build context is the set of local files available to copy-style
//! instructions. It is materialized at most once per build and read
//! through glob resolution and content checksumming.

mod archive;
mod checksum;
mod stat;

pub use archive::{BuildContextArchive, ContextSource};
pub use checksum::{context_globs_checksum, paths_checksum};
pub use stat::{stat_globs, GlobStat, StatMatch, StatOptions};
