use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit").join("decode").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

#[test]
fn decode_png_to_straight_rgba() {
    let dir = scratch("png");
    let path = dir.join("one.png");
    write_png(&path, 3, 2, [100, 50, 200, 128]);

    let frame = decode_frame(&path).unwrap();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert_eq!(frame.data.len(), 3 * 2 * 4);
    assert_eq!(&frame.data[..4], &[100, 50, 200, 128]);
}

#[test]
fn decode_sniffs_content_not_extension() {
    let dir = scratch("sniff");
    let path = dir.join("really_png.jpg");
    write_png(&path, 2, 2, [1, 2, 3, 255]);
    assert_eq!(decode_frame(&path).unwrap().geometry().width, 2);
}

#[test]
fn corrupt_file_is_decode_error_naming_path() {
    let dir = scratch("corrupt");
    let path = dir.join("bad.png");
    std::fs::write(&path, b"definitely not an image").unwrap();

    let err = decode_frame(&path).unwrap_err();
    assert!(matches!(err, StillreelError::Decode { .. }));
    assert!(err.to_string().contains("bad.png"));
}

#[test]
fn probe_returns_geometry_and_frame() {
    let dir = scratch("probe");
    let path = dir.join("first.png");
    write_png(&path, 7, 5, [0, 0, 0, 255]);
    let (geometry, frame) = probe_geometry(&path).unwrap();
    assert_eq!(geometry, FrameGeometry::new(7, 5).unwrap());
    assert_eq!(frame.geometry(), geometry);
}

#[test]
fn check_geometry_reports_first_offender() {
    let dir = scratch("check");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    let c = dir.join("c.png");
    write_png(&a, 4, 4, [0, 0, 0, 255]);
    write_png(&b, 6, 4, [0, 0, 0, 255]);
    write_png(&c, 2, 2, [0, 0, 0, 255]);

    let g = FrameGeometry::new(4, 4).unwrap();
    check_geometry(std::slice::from_ref(&a), g).unwrap();

    let err = check_geometry(&[a, b, c], g).unwrap_err();
    assert!(matches!(err, StillreelError::Geometry(_)));
    let msg = err.to_string();
    assert!(msg.contains("b.png"));
    assert!(msg.contains("6x4"));
}

#[test]
fn conform_rejects_or_fits() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![255, 0, 0, 255, 255, 0, 0, 255],
    };
    let target = FrameGeometry::new(4, 2).unwrap();
    let path = Path::new("x.png");

    let err = conform_frame(frame.clone(), target, GeometryPolicy::Reject, path).unwrap_err();
    assert!(matches!(err, StillreelError::Geometry(_)));

    let fitted = conform_frame(frame.clone(), target, GeometryPolicy::Fit, path).unwrap();
    assert_eq!(fitted.geometry(), target);
    assert_eq!(fitted.data.len(), target.rgba8_len());
    assert!(fitted.data[0] >= 254 && fitted.data[1] <= 1);

    let same =
        conform_frame(frame.clone(), frame.geometry(), GeometryPolicy::Reject, path).unwrap();
    assert_eq!(same, frame);
}
