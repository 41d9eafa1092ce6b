//! Scout gateway: the HTTP shell around the scout runtime.
//!
//! Serves `POST /api/chat`, which runs one turn and streams its frames,
//! `POST /api/grid/column` and `POST /api/grid/cell`, which fill a grid
//! without streaming, and `GET /api/functions`, which lists the
//! registered function schemas.

pub mod config;
pub mod functions;
pub mod router;
pub mod state;
pub mod system;
pub mod utils;

pub use config::GatewayConfig;
pub use router::router;
pub use state::AppState;
