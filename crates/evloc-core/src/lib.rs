pub mod app_config;
pub mod catalog;
pub mod config;
pub mod distance;
pub mod select;
pub mod station;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, parse_catalog, CatalogError};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use distance::distance;
pub use select::{find_best_in_range, find_nearest, QueryError, RangeSelection};
pub use station::{Catalog, Point, SelectionKind, Station};
