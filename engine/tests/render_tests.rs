use engine::graphics::{BLACK, Clip, CpuRenderer, Renderer2d, WHITE, text_extent};
use engine::surface::{SurfaceSize, frame_digest};
use engine::ui::Rect;

fn px(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
}

fn draw_scene(size: SurfaceSize) -> Vec<u8> {
    let mut frame = vec![0u8; size.rgba_len()];
    let mut gfx = CpuRenderer::new(&mut frame, size);
    gfx.clear(BLACK);
    gfx.fill_ellipse(20.0, 20.0, 6.0, 4.0, [255, 0, 0, 255], 200);
    gfx.fill_rotated_rect(40.0, 20.0, 5.0, 2.0, 30.0, [0, 255, 0, 255], 255);
    gfx.draw_text_scaled(2, 40, "OK", WHITE, 2);
    drop(gfx);
    frame
}

#[test]
fn identical_draws_share_a_digest() {
    let size = SurfaceSize::new(64, 64);
    assert_eq!(frame_digest(&draw_scene(size)), frame_digest(&draw_scene(size)));
}

#[test]
fn rotated_rect_at_ninety_degrees_stands_upright() {
    let size = SurfaceSize::new(20, 20);
    let mut frame = vec![0u8; size.rgba_len()];
    let mut gfx = CpuRenderer::new(&mut frame, size);
    gfx.clear(BLACK);
    gfx.fill_rotated_rect(10.0, 10.0, 8.0, 1.0, 90.0, WHITE, 255);

    assert_eq!(px(&frame, 20, 10, 3), WHITE);
    assert_eq!(px(&frame, 20, 3, 10), BLACK);
}

#[test]
fn soft_ellipse_fades_toward_the_rim() {
    let size = SurfaceSize::new(40, 40);
    let mut frame = vec![0u8; size.rgba_len()];
    let mut gfx = CpuRenderer::new(&mut frame, size);
    gfx.clear(BLACK);
    gfx.fill_soft_ellipse(20.0, 20.0, 16.0, 16.0, WHITE, 255);

    let centre = px(&frame, 40, 20, 20)[0];
    let rim = px(&frame, 40, 33, 20)[0];
    assert!(centre > 200, "centre {centre}");
    assert!(rim < centre / 4, "rim {rim}");
    assert_eq!(px(&frame, 40, 1, 1), BLACK);
}

#[test]
fn inside_clip_limits_an_ellipse() {
    let size = SurfaceSize::new(20, 20);
    let mut frame = vec![0u8; size.rgba_len()];
    let mut gfx = CpuRenderer::new(&mut frame, size);
    gfx.clear(BLACK);
    gfx.set_clip(Clip::Inside(Rect::new(0, 0, 10, 20)));
    gfx.fill_ellipse(10.0, 10.0, 8.0, 8.0, WHITE, 255);

    assert_eq!(px(&frame, 20, 8, 10), WHITE);
    assert_eq!(px(&frame, 20, 12, 10), BLACK);
}

#[test]
fn text_stays_within_its_extent() {
    let size = SurfaceSize::new(80, 30);
    let mut frame = vec![0u8; size.rgba_len()];
    let mut gfx = CpuRenderer::new(&mut frame, size);
    gfx.clear(BLACK);
    gfx.draw_text_scaled(4, 4, "HI", WHITE, 2);

    let (w, h) = text_extent("HI", 2);
    let area = Rect::new(4, 4, w, h);
    let mut lit = 0;
    for (i, p) in frame.chunks_exact(4).enumerate() {
        if p[0] == 255 {
            lit += 1;
            assert!(area.contains(i as u32 % 80, i as u32 / 80));
        }
    }
    assert!(lit > 0);
}
