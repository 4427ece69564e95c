pub mod feed;
pub mod registry;
pub mod solver;
pub mod plugin;

pub use feed::NpmFeedClient;
pub use plugin::NpmPlugin;
pub use registry::NpmRegistryClient;
pub use solver::NpmVersionSolver;
