//! Config sources, lowest precedence first: YAML file, then environment.

pub mod environment;
pub mod yaml_file;
