//! Replicated Fragment Storage
//!
//! Files are addressed by the SHA-256 of their content and stored as N
//! fragments spread over the ring.
//!
//! ## Core Concepts
//! - **Splitting**: a file becomes N contiguous fragments; the first
//!   `len % N` are one byte longer than the rest.
//! - **Placement**: fragment `i` is owned by node `i + 1` and its ring
//!   predecessor (`RingPlacement`).
//! - **Replication**: the uploading node keeps its own fragments, pushes each
//!   peer the fragments it owns, verifies the echoed hashes and then announces
//!   the manifest to everyone.
//! - **Reconstruction**: a download reads local fragments first, pulls the
//!   rest from their owners and checks the result against the file id.

pub mod handlers;
pub mod hash;
pub mod local;
pub mod node;
pub mod partitioner;
pub mod peer;
pub mod protocol;
pub mod reconstruction;
pub mod replication;
