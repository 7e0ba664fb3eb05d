use super::*;

const IDS: [&str; 2] = ["abc123def", "abc999xyz"];

#[test]
fn short_prefix_is_rejected_before_matching() {
    let err = resolve_prefix("layer", "abc1", IDS).unwrap_err();
    assert!(matches!(err, StudioError::AmbiguousReference(_)));

    // Matches both ids and is too short; still reported as ambiguous.
    let err = resolve_prefix("layer", "abc", IDS).unwrap_err();
    assert!(matches!(err, StudioError::AmbiguousReference(_)));
}

#[test]
fn six_char_prefix_resolves_uniquely() {
    assert_eq!(resolve_prefix("layer", "abc123", IDS).unwrap(), 0);
    assert_eq!(resolve_prefix("layer", "abc999x", IDS).unwrap(), 1);
}

#[test]
fn exact_match_wins() {
    assert_eq!(resolve_prefix("op", "abc999xyz", IDS).unwrap(), 1);
}

#[test]
fn shared_prefix_is_ambiguous_and_unknown_is_not_found() {
    let ids = ["aaaaaa11", "aaaaaa22"];
    assert!(matches!(
        resolve_prefix("op", "aaaaaa", ids),
        Err(StudioError::AmbiguousReference(_))
    ));
    assert!(matches!(
        resolve_prefix("op", "zzzzzz", ids),
        Err(StudioError::NotFound(_))
    ));
}

#[test]
fn generated_ids_are_unique_uuids() {
    let a = LayerId::generate();
    let b = LayerId::generate();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 36);
    assert_eq!(a.short().len(), 8);
}

#[test]
fn bitmap_refs_embed_ids() {
    let op = OpId::new("op-1");
    assert_eq!(BitmapRef::op_layer_output(&op).as_str(), "ops/op-1_layer.png");
    assert_eq!(
        BitmapRef::layer_source(&LayerId::new("l1")).as_str(),
        "layers/l1.png"
    );
}

#[test]
fn surrounding_whitespace_is_not_stripped() {
    let ids = ["abc123def", "abc999xyz"];
    assert!(matches!(
        resolve_prefix("layer", "abc123 ", ids),
        Err(StudioError::NotFound(_))
    ));
    assert!(matches!(
        resolve_prefix("layer", " abc123", ids),
        Err(StudioError::NotFound(_))
    ));
}
