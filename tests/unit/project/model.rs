use super::*;
use crate::foundation::core::Rgb;
use crate::ops::color_replace::ColorReplaceParams;

fn size() -> Size {
    Size::new(2, 2).unwrap()
}

fn project_with(layers: &[&str]) -> Project {
    let mut p = Project::new("poster", CanvasSettings::default());
    for id in layers {
        let id = LayerId::new(*id);
        let src = BitmapRef::layer_source(&id);
        p.import_layer(id, "layer", size(), src).unwrap();
    }
    p
}

fn edit(op: &str, layer: &str) -> OperationRecord {
    OperationRecord::new(
        OpId::new(op),
        ColorReplaceParams::new(Rgb::WHITE, Rgb::BLACK).into(),
        LayerId::new(layer),
    )
}

fn legacy(op: &str) -> OperationRecord {
    OperationRecord::from_stored(
        OpId::new(op),
        ColorReplaceParams::new(Rgb::WHITE, Rgb::BLACK).into(),
        None,
        BitmapRef::new(format!("ops/{op}.png")),
        None,
        chrono::Utc::now(),
        None,
    )
}

#[test]
fn first_import_defines_canvas_size() {
    let p = project_with(&["layer-aaaaaa"]);
    assert_eq!(p.canvas().size, Some(size()));

    let mut p = Project::new("fixed", CanvasSettings::with_size(Size::new(9, 9).unwrap()));
    let id = LayerId::new("layer-aaaaaa");
    let src = BitmapRef::layer_source(&id);
    p.import_layer(id, "a", size(), src).unwrap();
    assert_eq!(p.canvas().size, Some(Size::new(9, 9).unwrap()));
}

#[test]
fn effective_source_follows_cursor() {
    let mut p = project_with(&["layer-aaaaaa", "layer-bbbbbb"]);
    let a = LayerId::new("layer-aaaaaa");
    p.push_operation(edit("op-111111", "layer-aaaaaa")).unwrap();
    p.push_operation(edit("op-222222", "layer-bbbbbb")).unwrap();
    p.push_operation(edit("op-333333", "layer-aaaaaa")).unwrap();

    let layer = p.layers().get(&a).unwrap().clone();
    assert_eq!(p.effective_source(&layer).as_str(), "ops/op-333333_layer.png");

    p.undo().unwrap();
    assert_eq!(p.effective_source(&layer).as_str(), "ops/op-111111_layer.png");

    p.undo().unwrap();
    p.undo().unwrap();
    assert_eq!(p.effective_source(&layer).as_str(), "layers/layer-aaaaaa.png");
}

#[test]
fn excluded_records_are_skipped() {
    let mut p = project_with(&["layer-aaaaaa"]);
    p.push_operation(edit("op-111111", "layer-aaaaaa")).unwrap();
    p.push_operation(edit("op-222222", "layer-aaaaaa")).unwrap();
    p.excluded.insert(OpId::new("op-222222"));

    let layer = p.layers().bottom().unwrap().clone();
    assert_eq!(p.effective_source(&layer).as_str(), "ops/op-111111_layer.png");
}

#[test]
fn push_rejects_unknown_target() {
    let mut p = project_with(&["layer-aaaaaa"]);
    assert!(matches!(
        p.push_operation(edit("op-111111", "layer-zzzzzz")),
        Err(StudioError::NotFound(_))
    ));
    assert!(p.history().is_empty());
}

#[test]
fn delete_layer_cascades_to_its_records() {
    let mut p = project_with(&["layer-aaaaaa", "layer-bbbbbb"]);
    p.push_operation(edit("op-111111", "layer-aaaaaa")).unwrap();
    p.push_operation(edit("op-222222", "layer-bbbbbb")).unwrap();
    p.push_operation(edit("op-333333", "layer-aaaaaa")).unwrap();

    let (layer, cascaded) = p.delete_layer("layer-aaaaaa").unwrap();
    assert_eq!(layer.id().as_str(), "layer-aaaaaa");
    assert_eq!(cascaded.len(), 2);
    assert_eq!(p.history().len(), 1);
    assert_eq!(p.history().cursor(), 0);
    assert_eq!(p.layers().bottom().unwrap().order(), 0);
}

#[test]
fn last_layer_cannot_be_deleted() {
    let mut p = project_with(&["layer-aaaaaa"]);
    assert!(matches!(
        p.delete_layer("layer-aaaaaa"),
        Err(StudioError::GuardrailViolation(_))
    ));
    assert_eq!(p.layers().len(), 1);
}

#[test]
fn legacy_records_bind_to_base_layer() {
    let mut p = project_with(&["layer-aaaaaa", "layer-bbbbbb"]);
    p.history.push(legacy("op-legacy1"));
    p.legacy_base_layer = Some(LayerId::new("layer-aaaaaa"));

    let base = p.layers().bottom().unwrap().clone();
    let top = p.layers().iter().last().unwrap().clone();
    assert_eq!(p.effective_source(&base).as_str(), "ops/op-legacy1.png");
    assert_eq!(p.effective_source(&top), top.source());

    let (_, cascaded) = p.delete_layer("layer-aaaaaa").unwrap();
    assert_eq!(cascaded.len(), 1);
    assert!(p.legacy_base_layer().is_none());
    assert!(p.history().is_empty());
}

#[test]
fn clear_history_keeps_layers() {
    let mut p = project_with(&["layer-aaaaaa"]);
    p.push_operation(edit("op-111111", "layer-aaaaaa")).unwrap();
    let dropped = p.clear_history();
    assert_eq!(dropped.len(), 1);
    assert_eq!(p.history().cursor(), -1);
    assert_eq!(p.layers().len(), 1);
}
