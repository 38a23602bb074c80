//! geoip_heatmap library: GeoIP allocation aggregation and query core.
//!
//! The model layer turns CSV allocation data (CIDR blocks with
//! coordinates) into a location → address-count table, reduces its
//! resolution, rescales it logarithmically, and answers bounding-box
//! queries. The storage layer persists the table in SQLite, and the
//! server layer exposes both over HTTP at `/geoip`.
//!
//! # Example
//!
//! ```no_run
//! use geoip_heatmap::{run_server, Config};
//! use clap::Parser;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), anyhow::Error> {
//! let config = Config::parse_from(["geoip_heatmap", "--database", "geoip.db"]);
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod server;
pub mod storage;

pub use config::{Config, LogFormat, LogLevel};
pub use error::ApiError;
pub use model::{
    location_table_from_csv, normalize_longitude, round_to_nearest_multiple, BoundingBox,
    IngestError, Location, LocationTable,
};
pub use server::{router, run_server};
pub use storage::SqliteStore;
