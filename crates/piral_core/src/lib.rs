pub mod apps;
pub mod choices;
pub mod command;
pub mod config;
pub mod error;
pub mod registry;
pub mod router;
pub mod schema;
pub mod specialize;

pub use apps::{AppDefaults, Apps, Preflight};
pub use command::{
    CommandDescriptor, CommandSummary, Options, PILET_SUFFIX, PIRAL_SUFFIX, Scope, View,
};
pub use error::CommandError;
pub use registry::CommandRegistry;
pub use router::Router;
pub use specialize::{specialize, specialize_scope};
