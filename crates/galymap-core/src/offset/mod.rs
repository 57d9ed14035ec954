mod anchors;
mod loader;
pub mod scanner;
mod signature;

pub use anchors::{Anchor, AnchorFailure, AnchorResolution, AnchorTable};
pub use loader::{CachedAnchors, load_anchors, save_anchors};
pub use scanner::{find_pattern, resolve_relative_offset, resolve_signature};
pub use signature::{
    ResolveMode, SignatureSet, SignatureSpec, builtin_signatures, load_signatures, names,
    save_signatures,
};
