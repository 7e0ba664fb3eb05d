use super::*;
use crate::foundation::core::Rgb;

#[test]
fn kind_tag_and_params_survive_json() {
    let op = Operation::from(ColorReplaceParams::new(Rgb::WHITE, Rgb::BLACK).tolerance(3));
    assert_eq!(op.kind(), "color_replace");
    let params = op.params_json().unwrap();
    assert_eq!(params["tolerance"], 3);
    assert_eq!(Operation::from_parts(op.kind(), params).unwrap(), op);
}

#[test]
fn dashed_kind_alias_is_accepted() {
    let params = serde_json::json!({"target_rgb": [1, 2, 3], "new_rgb": [4, 5, 6]});
    let op = Operation::from_parts("color-replace", params).unwrap();
    let Operation::ColorReplace(p) = op;
    assert_eq!(p.tolerance, 0);
    assert!(p.preserve_alpha);
}

#[test]
fn unknown_kind_and_bad_params_are_corrupt() {
    assert!(matches!(
        Operation::from_parts("blur", serde_json::json!({})),
        Err(StudioError::CorruptState(_))
    ));
    assert!(matches!(
        Operation::from_parts("color_replace", serde_json::json!({"target_rgb": [300, 0, 0]})),
        Err(StudioError::CorruptState(_))
    ));
}

#[test]
fn out_of_range_tolerance_in_document_is_invalid_parameter() {
    let params = serde_json::json!({"target_rgb": [1, 2, 3], "new_rgb": [4, 5, 6], "tolerance": -4});
    assert!(matches!(
        Operation::from_parts("color_replace", params),
        Err(StudioError::InvalidParameter(_))
    ));
}
