//! Directive classification - turning capsule metadata into typed directives.
//!
//! Classification inspects every annotation independently: a single capsule may
//! declare purge, visibility, and finality directives simultaneously, and phase
//! discovery depends on seeing all of them. Malformed metadata never aborts a
//! scan; a capsule with no recognizable directives simply yields an empty set.

use tracing::{debug, warn};

use archweave_types::{Annotation, Capsule, Directive, TargetKind, Visibility};

/// Annotation field holding the declared phase number.
const PHASE_FIELD: &str = "phase";
/// Phase assumed when an annotation declares none.
const DEFAULT_PHASE: i32 = 1;

/// Classify a decoded capsule into its (possibly empty) set of directives.
pub fn classify(capsule: &Capsule) -> Vec<Directive> {
    capsule
        .annotations
        .iter()
        .filter_map(|ann| match parse_annotation(ann) {
            Some(directive) => Some(directive),
            None => {
                debug!(
                    capsule = %capsule.declaration.name,
                    kind = %ann.kind,
                    "annotation did not classify as a directive"
                );
                None
            }
        })
        .collect()
}

/// Classify raw capsule bytes. Decode failures are logged and contribute no
/// directives; this is the entry point phase discovery uses.
pub fn classify_bytes(bytes: &[u8]) -> Vec<Directive> {
    match Capsule::decode(bytes) {
        Ok(capsule) => classify(&capsule),
        Err(e) => {
            warn!(error = %e, "skipping malformed capsule");
            Vec::new()
        }
    }
}

fn phase_of(ann: &Annotation) -> i32 {
    match ann.int(PHASE_FIELD) {
        Some(p) => i32::try_from(p).unwrap_or_else(|_| {
            debug!(kind = %ann.kind, phase = p, "declared phase out of range; using default");
            DEFAULT_PHASE
        }),
        None => DEFAULT_PHASE,
    }
}

fn target_kind(suffix: &str) -> Option<TargetKind> {
    match suffix {
        "type" => Some(TargetKind::Type),
        "field" => Some(TargetKind::Field),
        "method" => Some(TargetKind::Method),
        _ => None,
    }
}

/// Parse one annotation into a directive, or `None` if the annotation is not a
/// recognized directive kind or is missing a required field.
fn parse_annotation(ann: &Annotation) -> Option<Directive> {
    let (family, suffix) = ann.kind.split_once('.')?;
    let phase = phase_of(ann);
    match family {
        "purge" => Some(Directive::Purge {
            phase,
            target_kind: target_kind(suffix)?,
            target_name: ann.text("target")?.to_string(),
        }),
        "finality" => Some(Directive::Finality {
            phase,
            target_kind: target_kind(suffix)?,
            target_name: ann.text("target")?.to_string(),
            is_final: ann.bool("final")?,
        }),
        "visibility" => Some(Directive::Visibility {
            phase,
            target_kind: target_kind(suffix)?,
            target_name: ann.text("target")?.to_string(),
            visibility: Visibility::parse(ann.text("visibility")?)?,
        }),
        "merge" if suffix == "type" => Some(Directive::Merge {
            phase,
            supertype_name: ann.text("supertype")?.to_string(),
        }),
        "define" if suffix == "type" => Some(Directive::Define { phase }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archweave_types::Declaration;

    #[test]
    fn test_multiple_directive_kinds_in_one_capsule() {
        let capsule = Capsule::new(Declaration::new("patch/Multi"))
            .with_annotation(
                Annotation::new("purge.method")
                    .with_int("phase", 2)
                    .with_text("target", "core/Dispatcher#run(int)"),
            )
            .with_annotation(
                Annotation::new("visibility.field")
                    .with_text("target", "core/Dispatcher#queue")
                    .with_text("visibility", "public"),
            )
            .with_annotation(
                Annotation::new("finality.type")
                    .with_int("phase", 3)
                    .with_text("target", "core/Dispatcher")
                    .with_bool("final", false),
            );

        let directives = classify(&capsule);
        assert_eq!(directives.len(), 3);
        assert_eq!(directives[0].phase(), 2);
        // Missing phase field defaults to 1
        assert_eq!(directives[1].phase(), 1);
        assert_eq!(directives[2].phase(), 3);
    }

    #[test]
    fn test_merge_and_define() {
        let capsule = Capsule::new(Declaration::new("patch/M"))
            .with_annotation(
                Annotation::new("merge.type")
                    .with_int("phase", 2)
                    .with_text("supertype", "core/Base"),
            )
            .with_annotation(Annotation::new("define.type").with_int("phase", 1));

        let directives = classify(&capsule);
        assert_eq!(
            directives,
            vec![
                Directive::Merge {
                    phase: 2,
                    supertype_name: "core/Base".to_string()
                },
                Directive::Define { phase: 1 },
            ]
        );
    }

    #[test]
    fn test_malformed_annotations_are_skipped() {
        let capsule = Capsule::new(Declaration::new("patch/Bad"))
            // unknown kind
            .with_annotation(Annotation::new("shrink.type").with_text("target", "x"))
            // finality without the `final` field
            .with_annotation(
                Annotation::new("finality.method").with_text("target", "core/D#run()"),
            )
            // visibility with an unparsable level
            .with_annotation(
                Annotation::new("visibility.type")
                    .with_text("target", "core/D")
                    .with_text("visibility", "package"),
            )
            // merge without a supertype
            .with_annotation(Annotation::new("merge.type").with_int("phase", 1))
            // one valid directive among the wreckage
            .with_annotation(
                Annotation::new("purge.type").with_text("target", "core/Gone"),
            );

        let directives = classify(&capsule);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].kind_name(), "purge");
    }

    #[test]
    fn test_out_of_range_phase_falls_back_to_default() {
        let capsule = Capsule::new(Declaration::new("patch/Huge")).with_annotation(
            Annotation::new("purge.type")
                .with_int("phase", i64::from(i32::MAX) + 1)
                .with_text("target", "core/Gone"),
        );

        let directives = classify(&capsule);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].phase(), DEFAULT_PHASE);
    }

    #[test]
    fn test_classify_bytes_tolerates_garbage() {
        assert!(classify_bytes(b"garbage").is_empty());
        assert!(classify_bytes(&[]).is_empty());
    }

    #[test]
    fn test_capsule_without_annotations_yields_empty() {
        let capsule = Capsule::new(Declaration::new("patch/Quiet"));
        assert!(classify(&capsule).is_empty());

        let bytes = capsule.encode().unwrap();
        assert!(classify_bytes(&bytes).is_empty());
    }
}
