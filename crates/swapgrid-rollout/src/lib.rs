//! swapgrid-rollout — the blue/green switch state machine.
//!
//! A service is always backed by one "live" replica group named
//! `<base>--blue` or `<base>--green`. A deploy builds the other one
//! (the shadow), waits for it, repoints the service, and scales the old
//! group to zero. The service remembers the old group in its
//! `previous-replica-group` label so exactly one rollback can undo it.
//!
//! # Components
//!
//! - **`resolver`** — find the replica group a service currently routes to
//! - **`provisioner`** — build, replace, and await the shadow group
//! - **`cutover`** — flip the service selector (the only atomic step)
//! - **`decommission`** — scale a replica group to a count, usually zero
//! - **`switcher`** — `deploy` / `rollback` pipelines over the above
//!
//! ```text
//! deploy:   resolve → provision (+wait) → switch selector → scale old to 0
//! rollback: resolve → read label → scale old up (+wait) → revert selector → scale current to 0
//! ```

pub mod cutover;
pub mod decommission;
pub mod error;
pub mod provisioner;
pub mod resolver;
pub mod switcher;

pub use error::SwitchError;
pub use resolver::ActiveReplicaGroup;
pub use switcher::{DeployReport, DeployRequest, RollbackReport, SwitchPhase, Switcher};
