//! Configuration for formclock trackers.
//!
//! One TOML table per tracked attribute:
//! ```toml
//! [trackers.started_at]
//! param_key = "submission"
//! expirable = true
//! expiry_secs = 86400
//! on_actions = ["new", "edit"]
//! prevent_future = true
//! prevent_update = true
//! max_duration_secs = 7200
//! min_duration_secs = 5
//! ```
//!
//! Config file layering: user config dir, then project-local `formclock.toml`.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::{AutoParamsSetting, FormclockConfig, TrackerConfig, TrackerSetup};
