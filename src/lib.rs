//! edge-download library: cached, rate-limited JSON fetching and recursive
//! key search for the NHL game-center API.

pub mod driver;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod model;
