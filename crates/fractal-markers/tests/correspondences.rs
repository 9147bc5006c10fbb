use fractal_markers::{render_family, GrayImage, MarkerDetector, MarkerFamily, RenderLayout};
use nalgebra::Point2;

fn assert_on_model(layout: &RenderLayout, scale: f32, res: &fractal_markers::Correspondences) {
    assert_eq!(res.object_points.len(), res.image_points.len());
    for (obj, img) in res.object_points.iter().zip(&res.image_points) {
        assert_eq!(obj.z, 0.0);
        let want = layout.to_image(Point2::new(obj.x / scale, obj.y / scale));
        assert!(
            (img - want).norm() < 1.5,
            "object {obj:?} seen at {img:?}, expected {want:?}"
        );
    }
}

#[test]
fn rendered_family_yields_dense_correspondences() {
    let det = MarkerDetector::from_family(MarkerFamily::Fractal2L6).expect("builtin family");
    let (img, layout) = render_family(det.set(), 120.0, 40);

    let res = det.detect_with_correspondences(&img.view()).expect("valid image");
    assert!(res.markers.iter().any(|m| m.id == 0));
    // more than the outer corners of the detected markers
    assert!(res.correspondences.len() > 4 * res.markers.len());
    assert_on_model(&layout, 1.0, &res.correspondences);
}

#[test]
fn physical_scale_carries_into_object_points() {
    let det = MarkerDetector::from_family(MarkerFamily::Fractal2L6)
        .expect("builtin family")
        .with_physical_size(0.2)
        .expect("first conversion");
    // rendering uses model units, so draw from an unscaled copy
    let plain = MarkerDetector::from_family(MarkerFamily::Fractal2L6).expect("builtin family");
    let (img, layout) = render_family(plain.set(), 120.0, 40);

    let res = det.detect_with_correspondences(&img.view()).expect("valid image");
    assert!(!res.correspondences.is_empty());
    assert!(res
        .correspondences
        .object_points
        .iter()
        .all(|p| p.x.abs() <= 0.1 + 1e-5 && p.y.abs() <= 0.1 + 1e-5));
    assert_on_model(&layout, 0.1, &res.correspondences);
}

#[test]
fn occluded_root_corner_is_recovered_from_nested_marker() {
    let det = MarkerDetector::from_family(MarkerFamily::Fractal2L6).expect("builtin family");
    let (mut img, layout) = render_family(det.set(), 120.0, 40);
    // covers the root's top-left corner up to the first code cell
    occlude(&mut img, 20..60, 20..60);

    let res = det.detect_with_correspondences(&img.view()).expect("valid image");
    assert!(res.markers.iter().any(|m| m.id == 1), "nested marker detected");

    let sub_half = det.set().get(1).expect("nested model").corners()[1].x;
    let outside_sub = res
        .correspondences
        .object_points
        .iter()
        .filter(|p| p.x.abs() > sub_half + 1e-4 || p.y.abs() > sub_half + 1e-4)
        .count();
    assert!(outside_sub > 0, "root keypoints recovered");
    assert_on_model(&layout, 1.0, &res.correspondences);
}

fn occlude(img: &mut GrayImage, xs: std::ops::Range<usize>, ys: std::ops::Range<usize>) {
    for y in ys {
        for x in xs.clone() {
            img.set(x, y, 128);
        }
    }
}
