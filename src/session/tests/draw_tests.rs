//! Tests for the drawing track and mask seeding.

use image::{Rgba, RgbaImage};

use crate::codec::{Mask, decode_base64_png, mask_from_image};
use crate::drawing::{DrawingObject, DrawingTool, StrokeStyle};
use crate::error::MaskError;
use crate::geometry::{DisplaySpace, Point, PointLabel, PointPrompt, Size};
use crate::session::{AnnotationMode, AnnotationSession, Phase, Slot};

use super::fakes::slot_image;

fn draw_session(width: u32, height: u32) -> AnnotationSession {
    AnnotationSession::new(Slot::Reference, slot_image(width, height))
}

fn full_canvas_rect(session: &AnnotationSession) -> DrawingObject {
    let size = session.display_size();
    DrawingObject::rect(
        0.0,
        0.0,
        size.width() as f32,
        size.height() as f32,
        &StrokeStyle::default(),
    )
}

#[test]
fn test_full_canvas_rect_yields_full_mask() {
    // 400x300 stays within the 512 display limit
    let mut session = draw_session(400, 300);
    assert_eq!(session.display_size().as_tuple(), (400, 300));

    let rect = full_canvas_rect(&session);
    session.update_drawing(vec![rect]).unwrap();

    assert_eq!(session.phase(), Phase::MaskDerived);
    let mask = session.mask().unwrap();
    assert_eq!(mask.dimensions(), (400, 300));
    assert_eq!(mask.coverage(), 1.0);
}

#[test]
fn test_large_image_display_limit() {
    let session = draw_session(800, 600);
    assert_eq!(session.display_size().as_tuple(), (512, 384));
    assert_eq!(session.image().natural_size().as_tuple(), (800, 600));
}

#[test]
fn test_redrawing_same_objects_is_idempotent() {
    let mut session = draw_session(120, 80);
    let stroke = DrawingObject::freehand(
        vec![[10.0, 10.0], [60.0, 40.0], [100.0, 20.0]],
        &StrokeStyle {
            stroke_width: 8.0,
            ..StrokeStyle::default()
        },
    );

    session.update_drawing(vec![stroke.clone()]).unwrap();
    let first = session.mask().cloned().unwrap();
    session.update_drawing(vec![stroke]).unwrap();

    assert_eq!(session.mask().unwrap().as_ref(), first.as_ref());
    assert!(first.coverage() > 0.0 && first.coverage() < 1.0);
}

#[test]
fn test_update_replaces_whole_surface() {
    let mut session = draw_session(100, 100);
    let rect = full_canvas_rect(&session);
    session.update_drawing(vec![rect]).unwrap();

    session.update_drawing(Vec::new()).unwrap();
    assert!(session.objects().is_empty());
    assert!(session.mask().unwrap().is_blank());
}

#[test]
fn test_append_objects_accumulates() {
    let mut session = draw_session(100, 100);
    let style = StrokeStyle::default();
    session
        .append_objects(vec![DrawingObject::rect(0.0, 0.0, 50.0, 100.0, &style)])
        .unwrap();
    session
        .append_objects(vec![DrawingObject::rect(50.0, 0.0, 50.0, 100.0, &style)])
        .unwrap();

    assert_eq!(session.objects().len(), 2);
    assert_eq!(session.mask().unwrap().coverage(), 1.0);
}

#[test]
fn test_drawing_rejected_in_point_mode() {
    let mut session = draw_session(50, 50);
    session.set_mode(AnnotationMode::Point);

    let rect = full_canvas_rect(&session);
    let err = session.update_drawing(vec![rect]).unwrap_err();
    assert!(matches!(err, MaskError::InvalidTransition { .. }));
    assert!(session.mask().is_none());
}

#[test]
fn test_tracks_are_independent() {
    let mut session = draw_session(50, 50);
    session.set_mode(AnnotationMode::Point);
    session
        .add_point(PointPrompt::new(
            Point::<DisplaySpace>::new(1.0, 1.0),
            PointLabel::Positive,
        ))
        .unwrap();

    // Switching tool mid-track does not let strokes join the point track
    session.set_mode(AnnotationMode::Draw {
        tool: DrawingTool::Rect,
    });
    let rect = full_canvas_rect(&session);
    let err = session.update_drawing(vec![rect]).unwrap_err();
    assert!(matches!(err, MaskError::InvalidTransition { .. }));
    assert_eq!(session.phase(), Phase::PointsCollected);
}

#[test]
fn test_drawing_buffer_alpha_threshold() {
    let mut session = draw_session(4, 2);
    let mut buffer = RgbaImage::new(4, 2);
    buffer.put_pixel(0, 0, Rgba([0, 0, 0, 1]));
    buffer.put_pixel(3, 1, Rgba([255, 255, 255, 255]));
    buffer.put_pixel(2, 0, Rgba([255, 255, 255, 0]));

    session.update_drawing_buffer(&buffer).unwrap();
    let mask = session.mask().unwrap();
    assert!(mask.is_foreground(0, 0));
    assert!(mask.is_foreground(3, 1));
    assert!(!mask.is_foreground(2, 0));
    assert_eq!(mask.foreground_count(), 2);
}

#[test]
fn test_drawing_buffer_size_must_match() {
    let mut session = draw_session(40, 30);
    let err = session
        .update_drawing_buffer(&RgbaImage::new(30, 40))
        .unwrap_err();
    assert!(matches!(err, MaskError::DimensionMismatch { .. }));
    assert_eq!(session.phase(), Phase::Empty);
}

#[test]
fn test_reset_rotates_canvas_key() {
    let mut session = draw_session(40, 30);
    assert_eq!(session.canvas_key(), "initial_ref_canvas");

    let rect = full_canvas_rect(&session);
    session.update_drawing(vec![rect]).unwrap();
    session.reset();
    assert_eq!(session.canvas_key(), "ref_canvas_1");
    assert_eq!(session.reset_counter(), 1);
    assert!(session.objects().is_empty());
    assert!(session.mask().is_none());

    session.reset();
    assert_eq!(session.canvas_key(), "ref_canvas_2");
}

#[test]
fn test_seed_creates_background_object() {
    let mut session = draw_session(64, 48);
    session.seed_from_mask(&Mask::full(Size::new(64, 48).unwrap())).unwrap();

    let initial = session.initial_drawing().unwrap();
    assert_eq!(initial.objects.len(), 1);
    match &initial.objects[0] {
        DrawingObject::Image {
            left,
            top,
            width,
            height,
            src,
            ..
        } => {
            assert_eq!((*left, *top), (0.0, 0.0));
            assert_eq!((*width, *height), (64, 48));
            let decoded = mask_from_image(&decode_base64_png(src).unwrap());
            assert_eq!(decoded.dimensions(), (64, 48));
            assert_eq!(decoded.coverage(), 1.0);
        }
        other => panic!("expected an image object, got {}", other.kind()),
    }
    assert_eq!(session.phase(), Phase::MaskDerived);
    assert_eq!(session.mask().unwrap().coverage(), 1.0);
}

#[test]
fn test_seed_rejected_on_surface_in_progress() {
    let mut session = draw_session(20, 20);
    let style = StrokeStyle::default();
    session
        .update_drawing(vec![DrawingObject::rect(0.0, 0.0, 5.0, 5.0, &style)])
        .unwrap();
    let before = session.mask().cloned().unwrap();

    let err = session
        .seed_from_mask(&Mask::full(Size::new(20, 20).unwrap()))
        .unwrap_err();
    assert!(matches!(err, MaskError::InvalidTransition { .. }));
    assert_eq!(session.mask().unwrap().as_ref(), before.as_ref());
    assert!(session.initial_drawing().is_none());
}

#[test]
fn test_strokes_over_seed_extend_mask() {
    let mut session = draw_session(40, 40);
    let left_half = Mask::from_gray(&image::GrayImage::from_fn(40, 40, |x, _| {
        image::Luma([if x < 20 { 255 } else { 0 }])
    }));
    session.seed_from_mask(&left_half).unwrap();

    let mut objects = session.objects().to_vec();
    objects.push(DrawingObject::rect(20.0, 0.0, 20.0, 40.0, &StrokeStyle::default()));
    session.update_drawing(objects).unwrap();

    assert_eq!(session.mask().unwrap().coverage(), 1.0);
}

#[test]
fn test_transform_mode_only_replaces() {
    let mut session = draw_session(60, 40);
    session.set_mode(AnnotationMode::Draw {
        tool: DrawingTool::Transform,
    });
    let rect = full_canvas_rect(&session);

    let err = session.append_objects(vec![rect.clone()]).unwrap_err();
    assert!(matches!(err, MaskError::InvalidTransition { .. }));
    assert_eq!(session.phase(), Phase::Empty);
    assert!(session.objects().is_empty());

    // Moving objects arrives as the whole rearranged surface
    session.update_drawing(vec![rect]).unwrap();
    assert_eq!(session.phase(), Phase::MaskDerived);
    assert_eq!(session.mask().unwrap().coverage(), 1.0);
}
