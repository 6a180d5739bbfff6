//! Ephemeral filesystem workspaces.
//!
//! Every pipeline invocation gets its own directory under the configured
//! temp root. The directory and everything in it is removed when the
//! invocation ends, however it ends.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod workspace;

pub use workspace::{Workspace, with_workspace};
