//! Platform-specific release steps.
//!
//! Only macOS is targeted. The steps are not `cfg`-gated: every external tool
//! is reached through a [`CommandRunner`](crate::bundler::process::CommandRunner),
//! so the sequence can be exercised anywhere and the preflight check reports
//! missing macOS tools before anything runs.

pub mod macos;
