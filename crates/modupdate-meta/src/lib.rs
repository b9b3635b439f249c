//! modupdate-meta: the metadata contract every updatable plugin binary carries.
//!
//! The updater never loads a plugin to learn its version. A `MetadataReader`
//! pulls a small `PluginMetadata` record out of the file instead:
//! - `TrailerReader` reads the fixed-layout footer written by [`stamp`].
//! - `SidecarReader` reads `<binary>.meta.json` next to the binary.

pub mod metadata;
pub mod sidecar;
pub mod trailer;

pub use metadata::*;
pub use sidecar::SidecarReader;
pub use trailer::{TrailerReader, stamp, strip, write_stamped};
