//! Unit deployment: manifests, sync and the orchestrator that sequences
//! them after provisioning.

mod manifest;
mod orchestrator;
mod sync;

pub use manifest::{ManifestDeployer, ManifestShape};
pub use orchestrator::{DeployScope, DeploymentRequest, DeploymentSummary, Orchestrator};
pub use sync::{SyncResponse, SyncTrigger, NOT_VISIBLE_YET};
