//! Environment variable source: `MEDIAGRID_` prefix, `__` between nested keys

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::Map;

pub(crate) const ENV_PREFIX: &str = "MEDIAGRID";

/// Add the process environment as an overlay to builder.
///
/// `MEDIAGRID_FOLDERS` accepts a comma separated list; nested keys use a
/// double underscore, e.g. `MEDIAGRID_LOGGING__LEVEL`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    add_vars_to_builder(builder, None)
}

/// Same overlay, reading `vars` instead of the process environment when given.
pub fn add_vars_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: Option<Map<String, String>>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("folders")
            .try_parsing(true)
            .source(vars),
    );
    Ok(builder)
}
