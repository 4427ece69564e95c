pub mod ecosystem;
pub mod record;
pub mod target;

pub use ecosystem::Ecosystem;
pub use record::{Advisory, VulnerabilityRecord};
pub use target::ResolvedTarget;
