//! Facade over the pointalign workspace: RANSAC rigid and uniform-scale
//! alignment of index-corresponded 3D point sets.

#![forbid(unsafe_code)]

pub use pointalign_core as core;
pub use pointalign_io as io;
pub use pointalign_registration as registration;
