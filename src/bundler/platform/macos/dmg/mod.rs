//! macOS DMG disk image packaging.
//!
//! Produces a drag-to-install DMG with the native hdiutil tool and a custom
//! Finder layout. The image moves through a fixed sequence of states:
//!
//! ```text
//! CLEAN → CREATED (UDRW) → MOUNTED → LAYOUT_APPLIED → UNMOUNTED
//!       → CONVERTED (UDZO) → RENAMED (when a version marker exists)
//! ```
//!
//! # Architecture
//!
//! - `creation` - writable image creation and mounting
//! - `customization` - Finder layout and detaching (advisory)
//! - `template` - Finder layout scripts
//! - `conversion` - UDRW → UDZO conversion and version rename

mod conversion;
mod creation;
mod customization;
mod template;

pub use conversion::{convert_image, rename_image};
pub use creation::{create_image, mount_image};
pub use customization::{apply_layout, detach_image};
pub use template::{LayoutScripts, escape_applescript_string, render_layout_scripts};
