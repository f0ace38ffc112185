//! Ring Membership Module
//!
//! Holds the static topology of the cluster: an ordered list of N nodes, each
//! identified by an integer in `1..=N` and reachable over HTTP.
//!
//! There is no discovery or failure detection. A node that is down is simply
//! unreachable when a peer call is attempted, and the caller decides whether
//! to retry, fall back to another owner, or give up.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
