pub mod feed;
pub mod registry;
pub mod solver;
pub mod plugin;

pub use feed::NuGetFeedClient;
pub use plugin::NuGetPlugin;
pub use registry::NuGetCatalogClient;
pub use solver::NuGetVersionSolver;
