//! swapgrid-health — bounded polling waits.
//!
//! Two waits share one [`PollPolicy`]:
//!
//! ```text
//! wait_ready(name, desired?)   check now, then poll until
//!                              available == desired (or observed replicas)
//! wait_absent(name)            poll until the gateway reports NotFound
//! ```
//!
//! Both only ever retry the *read*. A fetch error while polling counts
//! as a non-matching attempt; only running out of attempts is terminal.

pub mod policy;
pub mod waiter;

pub use policy::PollPolicy;
pub use waiter::{wait_absent, wait_ready, WaitError};
