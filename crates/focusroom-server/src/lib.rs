//! Focusroom broadcast server.
//!
//! HTTP and WebSocket transport around the core focus simulator:
//!
//! - `GET /ws` pushes `focusData` on connect and on every tick
//! - `GET /leaderboard` returns the roster sorted by focus level
//! - `GET /snapshot` returns the roster as is
//! - `GET /health` reports roster and subscriber counts

pub mod handlers;
pub mod routes;
pub mod state;
pub mod ticker;

pub use routes::create_router;
pub use state::AppState;
pub use ticker::spawn_ticker;
