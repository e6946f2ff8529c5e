// libs/matching-cell/src/services/mod.rs
pub mod directory;
pub mod matching;

pub use directory::DirectoryService;
pub use matching::{MatcherService, MAX_MATCH_RESULTS};
