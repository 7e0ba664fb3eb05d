use super::*;

#[test]
fn png_keeps_straight_alpha_pixels() {
    let src = Bitmap::from_rgba8(2, 1, vec![100, 50, 200, 128, 1, 2, 3, 0]).unwrap();
    let bytes = encode_png(&src).unwrap();
    let back = decode_image(&bytes).unwrap();
    assert_eq!(back.size(), src.size());
    assert_eq!(back.pixel(0, 0), Some([100, 50, 200, 128]));
}

#[test]
fn garbage_bytes_are_codec_errors() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, StudioError::Codec(_)));
}

#[test]
fn write_png_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.png");
    let bmp = Bitmap::filled(3, 2, [9, 8, 7, 255]).unwrap();
    write_png(&path, &bmp).unwrap();
    assert_eq!(read_image(&path).unwrap(), bmp);
}

#[test]
fn missing_file_is_wrapped_io_error() {
    let err = read_image("does/not/exist.png").unwrap_err();
    assert!(matches!(err, StudioError::Other(_)));
    assert!(err.to_string().contains("does/not/exist.png"));
}
