//! Chainlaunch resource types.
//!
//! Each type implements [`Resource`](crate::engine::Resource) and is driven by
//! the shared [`Engine`](crate::engine::Engine).

use std::time::Duration;

pub mod backup_target;
pub mod key;
pub mod key_provider;
pub mod node;
pub mod organization;
pub mod plugin;

pub use backup_target::BackupTarget;
pub use key::Key;
pub use key_provider::KeyProvider;
pub use node::Node;
pub use organization::Organization;
pub use plugin::PluginDeployment;

/// Delay between status checks shared by all resource types.
pub(crate) const POLL_DELAY: Duration = Duration::from_secs(2);
