mod analysis;
mod cache;
mod loader;
mod orgs;
mod types;

pub use analysis::*;
pub use cache::*;
pub use loader::*;
pub use orgs::*;
pub use types::*;
