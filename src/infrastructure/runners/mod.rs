//! Goal runner adapters.

pub mod http;
pub mod mock;

pub use http::HttpGoalRunner;
pub use mock::{MockGoalRunner, MockResponse};
