//! GitHub integration for release publication

mod release_manager;

pub use release_manager::{GitHubReleaseConfig, GitHubReleaseManager};
