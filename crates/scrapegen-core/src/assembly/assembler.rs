use super::anchors::{AnchorKind, AnchorSet};
use super::inputs::{Fragments, TemplateMetadata};

/// Why an assembly step left the template unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The anchor text does not occur in the template.
    AnchorMissing,
    /// No fragment or configuration was supplied for this step.
    NothingToSplice,
    /// The fragment does not start with the anchor line it would replace.
    HeaderMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAnchor {
    pub anchor: AnchorKind,
    pub reason: SkipReason,
}

/// The assembled script plus a record of which steps took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    pub script: String,
    pub applied: Vec<AnchorKind>,
    pub skipped: Vec<SkippedAnchor>,
}

impl AssemblyReport {
    pub fn missing_anchors(&self) -> impl Iterator<Item = AnchorKind> + '_ {
        self.skipped
            .iter()
            .filter(|s| s.reason == SkipReason::AnchorMissing)
            .map(|s| s.anchor)
    }
}

/// Produces a complete script from a base template and generated fragments.
///
/// Implementations must be deterministic: equal inputs give byte-identical
/// output.
pub trait TemplateAssembler: Send + Sync {
    fn assemble_with_report(
        &self,
        base_template: &str,
        fragments: &Fragments,
        metadata: &TemplateMetadata,
    ) -> AssemblyReport;

    fn assemble(
        &self,
        base_template: &str,
        fragments: &Fragments,
        metadata: &TemplateMetadata,
    ) -> String {
        self.assemble_with_report(base_template, fragments, metadata)
            .script
    }
}

/// First-occurrence literal replacement of anchor lines.
///
/// Steps run in a fixed order: strategy constant, API endpoints block, URL
/// discovery function, record extraction function, then the three metadata
/// lines. An absent anchor turns its step into a no-op.
#[derive(Debug, Clone, Default)]
pub struct LiteralAnchorAssembler {
    anchors: AnchorSet,
}

impl LiteralAnchorAssembler {
    pub fn new(anchors: AnchorSet) -> Self {
        Self { anchors }
    }

    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }
}

impl TemplateAssembler for LiteralAnchorAssembler {
    fn assemble_with_report(
        &self,
        base_template: &str,
        fragments: &Fragments,
        metadata: &TemplateMetadata,
    ) -> AssemblyReport {
        let mut splice = Splice {
            script: base_template.to_string(),
            applied: Vec::new(),
            skipped: Vec::new(),
        };
        let anchors = &self.anchors;

        splice.replace(
            AnchorKind::Strategy,
            &anchors.strategy,
            Some(format!(
                "const COLLECTION_STRATEGY = '{}';",
                fragments.strategy
            )),
        );

        match &fragments.api_endpoints {
            Some(config) => {
                splice.inject_endpoints(&anchors.api_endpoints, &config.to_json_block())
            }
            None => splice.skip(AnchorKind::ApiEndpoints, SkipReason::NothingToSplice),
        }

        splice.replace_function(
            AnchorKind::UrlDiscovery,
            &anchors.url_discovery,
            &fragments.discovery_code,
        );
        splice.replace_function(
            AnchorKind::RecordExtraction,
            &anchors.record_extraction,
            &fragments.extraction_code,
        );

        splice.replace(
            AnchorKind::MetadataName,
            &anchors.metadata_name,
            Some(format!("name: {},", js_string(&metadata.title))),
        );
        splice.replace(
            AnchorKind::MetadataDescription,
            &anchors.metadata_description,
            Some(format!("description: {},", js_string(&metadata.description))),
        );
        splice.replace(
            AnchorKind::MetadataTargetUrl,
            &anchors.metadata_target_url,
            Some(format!("target_url: {},", js_string(&metadata.target_url))),
        );

        for skipped in &splice.skipped {
            if skipped.reason != SkipReason::NothingToSplice {
                tracing::warn!(
                    anchor = %skipped.anchor,
                    reason = ?skipped.reason,
                    "Assembly step left the template unchanged"
                );
            }
        }

        AssemblyReport {
            script: splice.script,
            applied: splice.applied,
            skipped: splice.skipped,
        }
    }
}

struct Splice {
    script: String,
    applied: Vec<AnchorKind>,
    skipped: Vec<SkippedAnchor>,
}

impl Splice {
    fn skip(&mut self, anchor: AnchorKind, reason: SkipReason) {
        self.skipped.push(SkippedAnchor { anchor, reason });
    }

    fn replace(&mut self, kind: AnchorKind, anchor: &str, replacement: Option<String>) {
        let Some(replacement) = replacement else {
            self.skip(kind, SkipReason::NothingToSplice);
            return;
        };
        if anchor.is_empty() || !self.script.contains(anchor) {
            self.skip(kind, SkipReason::AnchorMissing);
            return;
        }
        self.script = self.script.replacen(anchor, &replacement, 1);
        self.applied.push(kind);
    }

    /// Replaces a function header anchor with a fragment that re-declares it.
    fn replace_function(&mut self, kind: AnchorKind, anchor: &str, fragment: &str) {
        let fragment = trim_blank_lines(fragment);
        if fragment.is_empty() {
            self.skip(kind, SkipReason::NothingToSplice);
            return;
        }
        let header = fragment.lines().next().map(str::trim).unwrap_or_default();
        if header != anchor.trim() {
            self.skip(kind, SkipReason::HeaderMismatch);
            return;
        }
        self.replace(kind, anchor, Some(fragment.to_string()));
    }

    /// Writes the endpoints block ahead of the placeholder and turns the
    /// placeholder into a comment.
    fn inject_endpoints(&mut self, anchor: &str, json_block: &str) {
        let found = if anchor.is_empty() {
            None
        } else {
            self.script.find(anchor)
        };
        let Some(start) = found else {
            self.skip(AnchorKind::ApiEndpoints, SkipReason::AnchorMissing);
            return;
        };

        let declaration = anchor.trim_end_matches('{').trim_end();
        let injected = format!("{declaration} {json_block};\n\n// Original placeholder:\n/*\n");
        self.script.insert_str(start, &injected);

        let original_start = start + injected.len();
        if let Some(offset) = self.script[original_start..].find("};") {
            let end = original_start + offset + 2;
            self.script.insert_str(end, "\n*/");
        } else {
            // Unterminated placeholder: close the comment at the end.
            self.script.push_str("\n*/\n");
        }
        self.applied.push(AnchorKind::ApiEndpoints);
    }
}

fn trim_blank_lines(fragment: &str) -> &str {
    let start = fragment
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| fragment[..i].rfind('\n').map_or(0, |nl| nl + 1))
        .unwrap_or(fragment.len());
    fragment[start..].trim_end()
}

/// A double-quoted string literal valid in both JSON and TypeScript.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}
