use super::*;
use crate::foundation::core::{Background, CanvasSettings, Position, Rgb, Size};
use crate::foundation::ids::{BitmapRef, LayerId, OpId};
use crate::history::record::OperationRecord;
use crate::ops::color_replace::ColorReplaceParams;
use crate::store::BitmapStore;
use crate::store::memory::MemoryBitmapStore;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

struct Fixture {
    project: Project,
    store: MemoryBitmapStore,
}

impl Fixture {
    fn new(w: u32, h: u32) -> Self {
        Self {
            project: Project::new(
                "render",
                CanvasSettings::with_size(Size::new(w, h).unwrap()),
            ),
            store: MemoryBitmapStore::new(),
        }
    }

    fn layer(&mut self, id: &str, bitmap: Bitmap) -> LayerId {
        let id = LayerId::new(id);
        let src = BitmapRef::layer_source(&id);
        self.project
            .import_layer(id.clone(), id.as_str(), bitmap.size(), src.clone())
            .unwrap();
        self.store.put(&src, Arc::new(bitmap)).unwrap();
        id
    }

    fn recolor(&mut self, op: &str, layer: &LayerId, from: [u8; 4], to: [u8; 4]) {
        let params = ColorReplaceParams::new(
            Rgb::new(from[0], from[1], from[2]),
            Rgb::new(to[0], to[1], to[2]),
        );
        let l = self.project.layers().get(layer).unwrap().clone();
        let input = layer_bitmap(&self.project, &l, &self.store).unwrap();
        let out = params.apply(&input).unwrap();
        let rec = OperationRecord::new(OpId::new(op), params.into(), layer.clone());
        self.store
            .put(rec.output_layer().unwrap(), Arc::new(out))
            .unwrap();
        self.project.push_operation(rec).unwrap();
    }

    fn render(&self) -> Bitmap {
        render(&self.project, &self.store).unwrap()
    }
}

#[test]
fn top_layer_wins_and_background_shows_through() {
    let mut f = Fixture::new(3, 1);
    f.project.canvas.background = Background::Color(Rgb::WHITE);
    f.layer("layer-bottom", Bitmap::filled(2, 1, RED).unwrap());
    let top = f.layer("layer-top000", Bitmap::filled(1, 1, BLUE).unwrap());
    f.project
        .layers_mut()
        .set_position(top.as_str(), Position::new(1, 0))
        .unwrap();

    let out = f.render();
    assert_eq!(out.pixel(0, 0), Some(RED));
    assert_eq!(out.pixel(1, 0), Some(BLUE));
    assert_eq!(out.pixel(2, 0), Some([255, 255, 255, 255]));
}

#[test]
fn hidden_layers_are_skipped_and_their_order_is_irrelevant() {
    let mut f = Fixture::new(1, 1);
    f.layer("layer-base00", Bitmap::filled(1, 1, RED).unwrap());
    f.layer("layer-hid001", Bitmap::filled(1, 1, BLUE).unwrap());
    f.layer("layer-hid002", Bitmap::filled(1, 1, [0, 255, 0, 255]).unwrap());
    f.project.layers_mut().set_visibility("layer-hid001", false).unwrap();
    f.project.layers_mut().set_visibility("layer-hid002", false).unwrap();

    let before = f.render();
    assert_eq!(before.pixel(0, 0), Some(RED));
    f.project.layers_mut().move_down("layer-hid002").unwrap();
    assert_eq!(f.render(), before);
}

#[test]
fn opacity_scales_layer_alpha() {
    let mut f = Fixture::new(1, 1);
    f.layer("layer-aaaaaa", Bitmap::filled(1, 1, RED).unwrap());
    f.project.layers_mut().set_opacity("layer-aaaaaa", 0.5).unwrap();
    assert_eq!(f.render().pixel(0, 0), Some([255, 0, 0, 128]));
}

#[test]
fn cursor_selects_effective_layer_bitmap() {
    let mut f = Fixture::new(1, 1);
    let id = f.layer("layer-aaaaaa", Bitmap::filled(1, 1, RED).unwrap());
    f.recolor("op-111111", &id, RED, BLUE);
    assert_eq!(f.render().pixel(0, 0), Some(BLUE));

    let with_edit = f.render();
    f.project.undo().unwrap();
    assert_eq!(f.render().pixel(0, 0), Some(RED));
    f.project.redo().unwrap();
    assert_eq!(f.render(), with_edit);
}

#[test]
fn rendering_is_deterministic() {
    let mut f = Fixture::new(4, 4);
    let a = f.layer("layer-aaaaaa", Bitmap::filled(4, 4, [10, 200, 30, 180]).unwrap());
    f.layer("layer-bbbbbb", Bitmap::filled(2, 3, [90, 0, 250, 100]).unwrap());
    f.recolor("op-111111", &a, [10, 200, 30, 180], [1, 2, 3, 180]);
    assert_eq!(f.render().fingerprint(), f.render().fingerprint());
}

#[test]
fn missing_bitmap_is_corrupt_state() {
    let mut f = Fixture::new(1, 1);
    let id = LayerId::new("layer-ghost0");
    let src = BitmapRef::layer_source(&id);
    f.project
        .import_layer(id, "ghost", Size::new(1, 1).unwrap(), src)
        .unwrap();
    assert!(matches!(
        render(&f.project, &f.store),
        Err(StudioError::CorruptState(_))
    ));
}

#[test]
fn unknown_canvas_size_is_corrupt_state() {
    let p = Project::new("empty", CanvasSettings::default());
    assert!(matches!(
        render(&p, &MemoryBitmapStore::new()),
        Err(StudioError::CorruptState(_))
    ));
}
