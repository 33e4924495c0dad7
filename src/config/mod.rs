// Configuration module
// Declaration model and YAML loader for the tool source

mod loader;
mod settings;

pub use loader::load;
pub use settings::{
    ArgumentDeclaration, CommandSpec, Config, OutputFormat, OutputSpec, ToolDeclaration,
};
