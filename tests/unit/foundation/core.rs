use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(30, 1).is_ok());
}

#[test]
fn fps_parses_integer_and_rational() {
    assert_eq!("10".parse::<Fps>().unwrap(), Fps { num: 10, den: 1 });
    assert_eq!(
        "30000/1001".parse::<Fps>().unwrap(),
        Fps {
            num: 30_000,
            den: 1001
        }
    );
    assert!("abc".parse::<Fps>().is_err());
    assert!("0".parse::<Fps>().is_err());
    assert!("24/0".parse::<Fps>().is_err());
}

#[test]
fn fps_display_roundtrips_through_parse() {
    for s in ["10", "60", "30000/1001"] {
        assert_eq!(s.parse::<Fps>().unwrap().to_string(), s);
    }
}

#[test]
fn frames_to_secs_uses_rational_fps() {
    let fps = Fps::integer(10).unwrap();
    assert!((fps.frames_to_secs(25) - 2.5).abs() < 1e-12);
}

#[test]
fn frames_to_samples_rounds_to_nearest() {
    let fps = Fps::integer(10).unwrap();
    assert_eq!(fps.frames_to_samples(25, 48_000), 120_000);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    let samples = ntsc.frames_to_samples(300, 48_000);
    assert!(samples > 470_000 && samples < 490_000);
    assert_eq!(ntsc.frames_to_samples(0, 48_000), 0);
}

#[test]
fn geometry_validation_and_even_padding() {
    assert!(FrameGeometry::new(0, 4).is_err());
    let g = FrameGeometry::new(5, 4).unwrap();
    assert_eq!(g.rgba8_len(), 5 * 4 * 4);
    assert_eq!(
        g.even_padded(),
        FrameGeometry {
            width: 6,
            height: 4
        }
    );
    assert_eq!(g.to_string(), "5x4");
}

#[test]
fn progress_sequence_matches_floor_formula() {
    let total = 3;
    let seq: Vec<u8> = (1..=total).map(|i| progress_percent(i, total)).collect();
    assert_eq!(seq, vec![33, 66, 100]);

    let seq7: Vec<u8> = (1..=7).map(|i| progress_percent(i, 7)).collect();
    assert_eq!(seq7, vec![14, 28, 42, 57, 71, 85, 100]);
    assert!(seq7.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn progress_is_clamped() {
    assert_eq!(progress_percent(0, 0), 100);
    assert_eq!(progress_percent(9, 4), 100);
    assert_eq!(progress_percent(0, 4), 0);
}
