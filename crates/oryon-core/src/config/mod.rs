//! Configuration for fetching and installing modules
//!
//! Settings are layered: built-in defaults rooted at `$HOME/.oryon`, then
//! an optional TOML file, then `ORYON_*` environment variables. The CLI
//! applies its own flags on top.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_oryon_toml, parse_oryon_toml_str, to_toml};
pub use paths::{default_config_path, oryon_home};
pub use schema::OryonConfig;
pub use store::{ConfigStore, ENV_PREFIX};
