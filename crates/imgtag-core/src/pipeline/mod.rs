//! The per-image tagging pipeline and its batch-facing pieces.
//!
//! ```text
//! discover → decode → preprocess → infer → select → format → sidecar
//! ```

pub(crate) mod decode;
pub(crate) mod discovery;
mod processor;
pub(crate) mod sidecar;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, ImageDiscovery};
pub use processor::ImageTagger;
pub use sidecar::{sidecar_path, write_sidecar};
