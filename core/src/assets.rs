//! Scripts compiled into the binary.
//!
//! The renderer ships inside the host artifact rather than as a loose file.
//! Lookup is by well-known name so a missing asset surfaces as a construction
//! error instead of a path that happens not to exist.

/// Well-known name of the MJML renderer entry script.
pub const RENDERER_SCRIPT: &str = "renderer.js";

const RENDERER_SCRIPT_RAW: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/renderer.js"));

static EMBEDDED: &[(&str, &str)] = &[(RENDERER_SCRIPT, RENDERER_SCRIPT_RAW)];

/// Look up an embedded script by name.
#[must_use]
pub fn embedded(name: &str) -> Option<&'static str> {
    EMBEDDED
        .iter()
        .find(|(asset, _)| *asset == name)
        .map(|(_, content)| *content)
}
