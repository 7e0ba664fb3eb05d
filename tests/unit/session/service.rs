use super::*;
use crate::foundation::core::Rgb;
use crate::store::BitmapSource;
use crate::store::memory::MemoryBitmapStore;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const GREEN: Rgb = Rgb::new(0, 255, 0);

fn session() -> Session<MemoryBitmapStore> {
    Session::create(
        "test",
        CanvasSettings::default(),
        MemoryBitmapStore::new(),
        SessionOpts::default(),
    )
}

fn white(w: u32, h: u32) -> Bitmap {
    Bitmap::filled(w, h, WHITE).unwrap()
}

fn whiten_to_green() -> ColorReplaceParams {
    ColorReplaceParams::new(Rgb::WHITE, GREEN)
}

/// Store that refuses writes once armed.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryBitmapStore,
    fail_puts: bool,
}

impl BitmapSource for FlakyStore {
    fn bitmap(&self, r: &BitmapRef) -> StudioResult<Option<Arc<Bitmap>>> {
        self.inner.bitmap(r)
    }

    fn contains(&self, r: &BitmapRef) -> bool {
        self.inner.contains(r)
    }
}

impl BitmapStore for FlakyStore {
    fn put(&mut self, r: &BitmapRef, bitmap: Arc<Bitmap>) -> StudioResult<()> {
        if self.fail_puts {
            return Err(StudioError::Other(anyhow::anyhow!("disk full")));
        }
        self.inner.put(r, bitmap)
    }

    fn remove(&mut self, r: &BitmapRef) -> StudioResult<()> {
        self.inner.remove(r)
    }
}

#[test]
fn import_renders_and_stores_composite() {
    let mut s = session();
    let id = s.import_layer(white(2, 2), None).unwrap();

    assert_eq!(s.project().layers().len(), 1);
    assert_eq!(s.project().layers().bottom().unwrap().name(), "Layer 1");
    assert!(s.store().contains(&BitmapRef::layer_source(&id)));
    assert!(s.store().contains(&s.opts().composite_ref));
    assert_eq!(s.composite().unwrap().pixel(1, 1), Some(WHITE));
}

#[test]
fn apply_writes_both_outputs_and_recolors() {
    let mut s = session();
    s.import_layer(white(2, 2), Some("bg")).unwrap();
    let rec = s.apply_color_replace(None, whiten_to_green()).unwrap();

    assert!(s.store().contains(rec.output_layer().unwrap()));
    assert!(s.store().contains(rec.output()));
    assert_eq!(rec.note(), Some("Replace #FFFFFF with #00FF00 (tolerance: 0)"));
    assert_eq!(s.render().unwrap().pixel(0, 0), Some([0, 255, 0, 255]));
    assert_eq!(s.project().history().cursor(), 0);
}

#[test]
fn undo_redo_restores_identical_composite() {
    let mut s = session();
    s.import_layer(white(3, 3), None).unwrap();
    s.apply_color_replace(None, whiten_to_green()).unwrap();
    let before = s.render().unwrap();

    assert_eq!(s.undo().unwrap(), -1);
    assert_eq!(s.render().unwrap().pixel(0, 0), Some(WHITE));
    assert_eq!(s.redo().unwrap(), 0);
    assert_eq!(s.render().unwrap(), before);
    assert!(matches!(s.redo(), Err(StudioError::NothingToRedo)));
}

#[test]
fn new_edit_after_undo_truncates_and_collects_outputs() {
    let mut s = session();
    s.import_layer(white(1, 1), None).unwrap();
    let first = s.apply_color_replace(None, whiten_to_green()).unwrap();
    let second = s
        .apply_color_replace(None, ColorReplaceParams::new(GREEN, Rgb::BLACK))
        .unwrap();
    s.undo().unwrap();
    s.undo().unwrap();

    let third = s
        .apply_color_replace(None, ColorReplaceParams::new(Rgb::WHITE, Rgb::BLACK))
        .unwrap();
    let h = s.project().history();
    assert_eq!(h.len(), 1);
    assert_eq!(h.cursor(), 0);
    assert_eq!(h.records()[0].id(), third.id());
    for gone in first.outputs().chain(second.outputs()) {
        assert!(!s.store().contains(gone), "{gone} should be collected");
    }
    assert!(s.pending_garbage().is_empty());
}

#[test]
fn deferred_garbage_waits_for_collect() {
    let opts = SessionOpts {
        collect_garbage: false,
        ..SessionOpts::default()
    };
    let mut s = Session::create("t", CanvasSettings::default(), MemoryBitmapStore::new(), opts);
    s.import_layer(white(1, 1), None).unwrap();
    let rec = s.apply_color_replace(None, whiten_to_green()).unwrap();
    s.delete_operation(rec.id().as_str()).unwrap();

    assert!(s.store().contains(rec.output()));
    assert_eq!(s.pending_garbage().len(), 2);
    assert_eq!(s.collect_garbage(), 2);
    assert!(!s.store().contains(rec.output()));
}

#[test]
fn operation_applies_to_effective_bitmap() {
    let mut s = session();
    s.import_layer(white(1, 1), None).unwrap();
    s.apply_color_replace(None, whiten_to_green()).unwrap();
    s.apply_color_replace(None, ColorReplaceParams::new(GREEN, Rgb::BLACK))
        .unwrap();
    assert_eq!(s.render().unwrap().pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn explicit_layer_and_prefix_targeting() {
    let mut s = session();
    let bottom = s.import_layer(white(1, 1), None).unwrap();
    s.import_layer(white(1, 1), None).unwrap();

    let rec = s
        .apply_color_replace(Some(&bottom.as_str()[..8]), whiten_to_green())
        .unwrap();
    assert_eq!(rec.target(), Some(&bottom));
    assert!(matches!(
        s.apply_color_replace(Some("abc"), whiten_to_green()),
        Err(StudioError::AmbiguousReference(_))
    ));
}

#[test]
fn invalid_tolerance_changes_nothing() {
    let mut s = session();
    s.import_layer(white(1, 1), None).unwrap();
    let doc_before = s.to_doc().unwrap().operations.len();
    assert!(matches!(
        s.apply_color_replace(None, whiten_to_green().tolerance(-1)),
        Err(StudioError::InvalidParameter(_))
    ));
    assert_eq!(s.project().history().len(), doc_before);
}

#[test]
fn failed_store_write_leaves_state_untouched() {
    let mut s = Session::create(
        "t",
        CanvasSettings::default(),
        FlakyStore::default(),
        SessionOpts::default(),
    );
    s.import_layer(white(1, 1), None).unwrap();
    let layers_before = s.project().layers().clone();
    let composite_before = s.composite().cloned();

    s.store.fail_puts = true;
    assert!(s.apply_color_replace(None, whiten_to_green()).is_err());
    assert!(s.import_layer(white(1, 1), None).is_err());

    assert!(s.project().history().is_empty());
    assert_eq!(s.project().layers().len(), layers_before.len());
    assert_eq!(s.composite().cloned(), composite_before);
}

#[test]
fn layer_edits_rerender_but_rename_does_not_need_to() {
    let mut s = session();
    let id = s.import_layer(white(2, 1), None).unwrap();
    s.import_layer(Bitmap::filled(1, 1, [0, 0, 255, 255]).unwrap(), None)
        .unwrap();

    s.set_opacity(id.as_str(), 0.5).unwrap();
    s.set_visibility(id.as_str(), false).unwrap();
    assert_eq!(s.composite().unwrap().pixel(1, 0), Some([0, 0, 0, 0]));

    assert!(matches!(
        s.set_opacity(id.as_str(), 1.5),
        Err(StudioError::InvalidParameter(_))
    ));

    s.rename_layer(id.as_str(), "renamed").unwrap();
    s.set_locked(id.as_str(), true).unwrap();
    let layer = s.project().layers().resolve(id.as_str()).unwrap();
    assert_eq!(layer.name(), "renamed");
    assert!(layer.locked());

    s.set_position(id.as_str(), Position::new(-1, 0)).unwrap();
    assert_eq!(
        s.project().layers().resolve(id.as_str()).unwrap().position(),
        Position::new(-1, 0)
    );
}

#[test]
fn update_layer_is_all_or_nothing() {
    let mut s = session();
    let id = s.import_layer(white(1, 1), None).unwrap();
    let before = s.composite().cloned();

    let bad = LayerPatch {
        visible: Some(false),
        opacity: Some(2.0),
        ..LayerPatch::default()
    };
    assert!(matches!(
        s.update_layer(id.as_str(), &bad),
        Err(StudioError::InvalidParameter(_))
    ));
    assert!(s.project().layers().resolve(id.as_str()).unwrap().visible());
    assert_eq!(s.composite().cloned(), before);

    let good = LayerPatch {
        visible: Some(false),
        name: Some("hidden".into()),
        ..LayerPatch::default()
    };
    let layer = s.update_layer(id.as_str(), &good).unwrap();
    assert!(!layer.visible());
    assert_eq!(layer.name(), "hidden");
    assert_eq!(s.composite().unwrap().pixel(0, 0), Some([0, 0, 0, 0]));
}

#[test]
fn store_composite_runs_only_when_asked() {
    let opts = SessionOpts {
        render_on_mutation: false,
        ..SessionOpts::default()
    };
    let mut s = Session::create("t", CanvasSettings::default(), MemoryBitmapStore::new(), opts);
    assert!(!s.store_composite().unwrap());

    s.import_layer(white(1, 1), None).unwrap();
    let composite_ref = s.opts().composite_ref.clone();
    assert!(!s.store().contains(&composite_ref));
    assert!(s.composite().is_none());

    assert!(s.store_composite().unwrap());
    assert!(s.store().contains(&composite_ref));
    assert_eq!(s.composite().unwrap().pixel(0, 0), Some(WHITE));
}

#[test]
fn move_layer_at_boundary_is_noop() {
    let mut s = session();
    let bottom = s.import_layer(white(1, 1), None).unwrap();
    let top = s.import_layer(Bitmap::filled(1, 1, [0, 0, 255, 255]).unwrap(), None).unwrap();

    assert!(!s.move_layer(top.as_str(), MoveDirection::Up).unwrap());
    assert!(s.move_layer(bottom.as_str(), MoveDirection::Up).unwrap());
    assert_eq!(s.composite().unwrap().pixel(0, 0), Some(WHITE));
}

#[test]
fn delete_layer_cascades_and_collects() {
    let mut s = session();
    let a = s.import_layer(white(1, 1), None).unwrap();
    s.import_layer(white(1, 1), None).unwrap();
    let rec = s.apply_color_replace(Some(a.as_str()), whiten_to_green()).unwrap();

    let removed = s.delete_layer(a.as_str()).unwrap();
    assert_eq!(removed.id(), &a);
    assert!(s.project().history().is_empty());
    assert!(!s.store().contains(&BitmapRef::layer_source(&a)));
    assert!(!s.store().contains(rec.output()));

    let last = s.project().layers().bottom().unwrap().id().clone();
    assert!(matches!(
        s.delete_layer(last.as_str()),
        Err(StudioError::GuardrailViolation(_))
    ));
}

#[test]
fn reset_history_keeps_layers() {
    let mut s = session();
    s.import_layer(white(1, 1), None).unwrap();
    s.apply_color_replace(None, whiten_to_green()).unwrap();
    assert_eq!(s.reset_history().unwrap(), 1);
    assert_eq!(s.project().history().cursor(), -1);
    assert_eq!(s.render().unwrap().pixel(0, 0), Some(WHITE));
}

#[test]
fn preview_counts_without_recording() {
    let mut s = session();
    s.import_layer(white(2, 2), None).unwrap();
    assert_eq!(s.preview_color_replace(None, &whiten_to_green()).unwrap(), 4);
    assert!(s.project().history().is_empty());
}

#[test]
fn health_reports_missing_bitmaps_and_excluded_records() {
    let mut s = session();
    s.import_layer(white(1, 1), None).unwrap();
    let rec = s.apply_color_replace(None, whiten_to_green()).unwrap();
    s.health().unwrap();

    let doc = s.to_doc().unwrap();
    let mut store = s.into_store();
    store.remove(rec.output_layer().unwrap()).unwrap();
    let reopened = Session::open(doc.clone(), store.clone(), SessionOpts::default()).unwrap();
    assert!(reopened.project().is_excluded(rec.id()));
    assert!(!reopened.repairs().is_clean());
    assert!(matches!(reopened.health(), Err(StudioError::CorruptState(_))));
    assert_eq!(reopened.render().unwrap().pixel(0, 0), Some(WHITE));

    let src = BitmapRef::new(doc.layers[0].source_reference.clone());
    store.remove(&src).unwrap();
    let broken = Session::open(doc, store, SessionOpts::default()).unwrap();
    assert!(matches!(broken.health(), Err(StudioError::CorruptState(_))));
    assert!(matches!(broken.render(), Err(StudioError::CorruptState(_))));
}
