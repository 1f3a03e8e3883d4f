pub mod match_query;
pub mod match_response;

pub use match_query::MatchQuery;
pub use match_response::{MatchPage, MatchResultDto};
