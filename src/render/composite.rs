use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;
use crate::render::overlay::TextOverlay;

/// Source-over of a premultiplied overlay onto `dst`, clipped to the frame.
pub(crate) fn over_in_place(dst: &mut FrameRGBA, overlay: &TextOverlay) {
    let fw = dst.width as i64;
    let fh = dst.height as i64;
    let x0 = i64::from(overlay.x).max(0);
    let y0 = i64::from(overlay.y).max(0);
    let x1 = (i64::from(overlay.x) + i64::from(overlay.width)).min(fw);
    let y1 = (i64::from(overlay.y) + i64::from(overlay.height)).min(fh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let ow = overlay.width as usize;
    for y in y0..y1 {
        let oy = (y - i64::from(overlay.y)) as usize;
        let ox0 = (x0 - i64::from(overlay.x)) as usize;
        let src_row = &overlay.data[(oy * ow + ox0) * 4..(oy * ow + ox0 + (x1 - x0) as usize) * 4];
        let d_start = ((y as usize) * (fw as usize) + x0 as usize) * 4;
        let dst_row = &mut dst.data[d_start..d_start + src_row.len()];

        for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            let sa = u16::from(s[3]);
            if sa == 0 {
                continue;
            }
            if sa == 255 {
                d.copy_from_slice(s);
                continue;
            }
            let inv = 255 - sa;
            for c in 0..4 {
                d[c] = (u16::from(s[c]) + mul_div255_u16(u16::from(d[c]), inv)).min(255) as u8;
            }
        }
    }
}
