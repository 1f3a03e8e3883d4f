pub mod cache;
pub mod error;
pub mod pipeline;
pub mod prefilter;
pub mod ranking;
pub mod scoring;
pub mod service;
pub mod skills;
pub mod snapshot;
pub mod weights;

pub use error::{MatchingError, NotMatchableReason};
pub use pipeline::MatchingEngine;
pub use prefilter::MatchConstraints;
pub use ranking::{PageError, PageMeta, PageRequest, RankedMatch};
pub use scoring::MatchScore;
pub use service::{MatchingService, MatchingServiceConfig};
