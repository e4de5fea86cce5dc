//! Template assembly.
//!
//! Splices generated code fragments into a base scraper template by literal
//! anchor lines. The splice is deliberately textual; callers depend only on the
//! [`TemplateAssembler`] trait so a structural splice can replace
//! [`LiteralAnchorAssembler`] later.

mod anchors;
mod assembler;
mod endpoints;
mod inputs;

pub use anchors::{AnchorKind, AnchorSet};
pub use assembler::{
    AssemblyReport, LiteralAnchorAssembler, SkipReason, SkippedAnchor, TemplateAssembler,
};
pub use endpoints::{ApiEndpoint, ApiEndpointsConfig};
pub use inputs::{AssemblyInputs, Fragments, TemplateMetadata};

/// The base template shipped with this crate. Its anchor lines match
/// [`AnchorSet::default`].
pub const BUILTIN_TEMPLATE: &str = include_str!("../../templates/base_scraper.ts");
