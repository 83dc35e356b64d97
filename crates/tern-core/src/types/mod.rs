//! Core AT Protocol types.
//!
//! These types enforce protocol invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod at_uri;
mod did;
mod handle;
mod nsid;
mod pds_url;

pub use at_uri::{AtUri, is_valid_rkey};
pub use did::Did;
pub use handle::{Handle, is_domain_name};
pub use nsid::Nsid;
pub use pds_url::PdsUrl;
