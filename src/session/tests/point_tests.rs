//! Tests for the point-prompt track.

use crate::compositor::OverlayStyle;
use crate::error::MaskError;
use crate::geometry::{DisplaySpace, Point, PointLabel, PointPrompt};
use crate::session::{AnnotationMode, AnnotationSession, Phase, Slot};

use super::fakes::{FakeSegmenter, SegmentReply, slot_image};

fn point_session(width: u32, height: u32) -> AnnotationSession {
    let mut session = AnnotationSession::new(Slot::Base, slot_image(width, height));
    session.set_mode(AnnotationMode::Point);
    session
}

fn prompt(x: f64, y: f64, label: PointLabel) -> PointPrompt<DisplaySpace> {
    PointPrompt::new(Point::new(x, y), label)
}

fn generate(session: &mut AnnotationSession, reply: SegmentReply) {
    let segmenter = FakeSegmenter::new(reply);
    session
        .create_mask(&segmenter, 256, &OverlayStyle::default())
        .unwrap();
}

#[test]
fn test_points_mapped_to_model_space() {
    let mut session = point_session(256, 256);
    session.add_point(prompt(50.0, 50.0, PointLabel::Positive)).unwrap();
    session.add_point(prompt(10.0, 10.0, PointLabel::Negative)).unwrap();
    session.add_point(prompt(80.0, 80.0, PointLabel::Positive)).unwrap();

    let request = session.segment_request(512, &OverlayStyle::default()).unwrap();
    assert_eq!(request.points, vec![[100, 100], [160, 160], [20, 20]]);
    assert_eq!(request.labels, vec![1, 1, 0]);
}

#[test]
fn test_model_space_truncates() {
    // 100 * 256 / 300 = 85.33 -> 85
    let mut session = point_session(300, 300);
    session.add_point(prompt(100.0, 299.0, PointLabel::Positive)).unwrap();

    let request = session.segment_request(256, &OverlayStyle::default()).unwrap();
    assert_eq!(request.points, vec![[85, 255]]);
}

#[test]
fn test_request_carries_model_sized_image() {
    let mut session = point_session(200, 100);
    session.add_point(prompt(1.0, 1.0, PointLabel::Positive)).unwrap();

    let style = OverlayStyle {
        color: [0, 255, 0],
        opacity: 90,
        draw_border: false,
    };
    let request = session.segment_request(256, &style).unwrap();
    let image = crate::codec::decode_base64_png(&request.image).unwrap();
    assert_eq!((image.width(), image.height()), (256, 256));
    assert_eq!(request.color, [0, 255, 0]);
    assert_eq!(request.alpha, 90);
}

#[test]
fn test_add_point_transitions() {
    let mut session = point_session(64, 64);
    assert_eq!(session.phase(), Phase::Empty);

    session.add_point(prompt(3.0, 4.0, PointLabel::Positive)).unwrap();
    assert_eq!(session.phase(), Phase::PointsCollected);
    assert_eq!(session.positive_points().len(), 1);
    assert!(session.mask().is_none(), "points alone never produce a mask");
}

#[test]
fn test_add_point_rejected_in_draw_mode() {
    let mut session = AnnotationSession::new(Slot::Base, slot_image(64, 64));
    let err = session
        .add_point(prompt(1.0, 1.0, PointLabel::Positive))
        .unwrap_err();
    assert!(matches!(err, MaskError::InvalidTransition { .. }));
    assert_eq!(session.phase(), Phase::Empty);
}

#[test]
fn test_create_mask_without_points_issues_no_call() {
    let mut session = point_session(64, 64);
    let segmenter = FakeSegmenter::new(SegmentReply::Full(512));

    let err = session
        .create_mask(&segmenter, 512, &OverlayStyle::default())
        .unwrap_err();
    assert!(matches!(err, MaskError::NoPoints));
    assert_eq!(segmenter.calls(), 0);
}

#[test]
fn test_create_mask_scales_to_display() {
    let mut session = point_session(200, 100);
    session.add_point(prompt(10.0, 10.0, PointLabel::Positive)).unwrap();
    let segmenter = FakeSegmenter::new(SegmentReply::Quadrant(256));

    session
        .create_mask(&segmenter, 256, &OverlayStyle::default())
        .unwrap();

    assert_eq!(session.phase(), Phase::MaskGenerated);
    let mask = session.mask().unwrap();
    assert_eq!(mask.dimensions(), (200, 100));
    assert!(mask.is_foreground(10, 10));
    assert!(!mask.is_foreground(150, 80));
    assert_eq!(mask.coverage(), 0.25);
}

#[test]
fn test_failed_segmentation_keeps_previous_mask() {
    let mut session = point_session(64, 64);
    session.add_point(prompt(5.0, 5.0, PointLabel::Positive)).unwrap();
    generate(&mut session, SegmentReply::Full(256));
    let before = session.mask().cloned().unwrap();

    for reply in [SegmentReply::Fail, SegmentReply::Malformed, SegmentReply::NoMask] {
        let segmenter = FakeSegmenter::new(reply);
        let err = session
            .create_mask(&segmenter, 256, &OverlayStyle::default())
            .unwrap_err();
        assert!(matches!(err, MaskError::Segmentation(_)), "got {:?}", err);
        assert_eq!(segmenter.calls(), 1);
        assert_eq!(session.phase(), Phase::MaskGenerated);
        assert_eq!(session.mask().unwrap().as_ref(), before.as_ref());
    }
}

#[test]
fn test_failed_first_segmentation_leaves_no_mask() {
    let mut session = point_session(64, 64);
    session.add_point(prompt(5.0, 5.0, PointLabel::Negative)).unwrap();

    let segmenter = FakeSegmenter::new(SegmentReply::Fail);
    assert!(session.create_mask(&segmenter, 256, &OverlayStyle::default()).is_err());
    assert_eq!(session.phase(), Phase::PointsCollected);
    assert!(session.mask().is_none());
}

#[test]
fn test_regenerate_mask_replaces_previous() {
    let mut session = point_session(64, 64);
    session.add_point(prompt(5.0, 5.0, PointLabel::Positive)).unwrap();
    generate(&mut session, SegmentReply::Quadrant(256));
    generate(&mut session, SegmentReply::Full(256));

    assert_eq!(session.mask().unwrap().coverage(), 1.0);
}

#[test]
fn test_points_rejected_after_mask_generated() {
    let mut session = point_session(64, 64);
    session.add_point(prompt(5.0, 5.0, PointLabel::Positive)).unwrap();
    generate(&mut session, SegmentReply::Full(256));

    let err = session
        .add_point(prompt(6.0, 6.0, PointLabel::Positive))
        .unwrap_err();
    assert!(matches!(err, MaskError::InvalidTransition { .. }));
    assert_eq!(session.positive_points().len(), 1);
}

#[test]
fn test_reset_clears_points_and_blocks_create() {
    let mut session = point_session(64, 64);
    session.add_point(prompt(5.0, 5.0, PointLabel::Positive)).unwrap();
    generate(&mut session, SegmentReply::Full(256));

    session.reset();
    assert_eq!(session.phase(), Phase::Empty);
    assert!(session.mask().is_none());
    assert!(session.prompts().is_empty());
    assert_eq!(session.mode(), AnnotationMode::Point);

    let segmenter = FakeSegmenter::new(SegmentReply::Full(256));
    let err = session
        .create_mask(&segmenter, 256, &OverlayStyle::default())
        .unwrap_err();
    assert!(matches!(err, MaskError::NoPoints));
    assert_eq!(segmenter.calls(), 0);
}

#[test]
fn test_natural_mask_matches_original_size() {
    let mut session = point_session(1024, 512);
    assert_eq!(session.display_size().as_tuple(), (512, 256));
    session.add_point(prompt(5.0, 5.0, PointLabel::Positive)).unwrap();
    generate(&mut session, SegmentReply::Full(256));

    let natural = session.natural_mask().unwrap().unwrap();
    assert_eq!(natural.dimensions(), (1024, 512));
    assert_eq!(natural.coverage(), 1.0);
}

#[test]
fn test_points_off_canvas_rejected() {
    let mut session = point_session(200, 100);
    let segmenter = FakeSegmenter::new(SegmentReply::Full(512));

    for (x, y) in [(-1.0, 10.0), (10.0, -0.5), (200.0, 10.0), (10.0, 100.0), (f64::NAN, 1.0)] {
        let err = session
            .add_point(prompt(x, y, PointLabel::Positive))
            .unwrap_err();
        assert!(matches!(err, MaskError::PointOutOfBounds { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Input);
    }
    assert_eq!(session.phase(), Phase::Empty);
    assert!(session.positive_points().is_empty());

    // Nothing collected, so no request goes out
    let err = session
        .create_mask(&segmenter, 512, &OverlayStyle::default())
        .unwrap_err();
    assert!(matches!(err, MaskError::NoPoints));
    assert_eq!(segmenter.calls(), 0);

    // The last pixel row and column are still on the canvas
    session.add_point(prompt(199.9, 99.0, PointLabel::Negative)).unwrap();
    assert_eq!(session.phase(), Phase::PointsCollected);
}
