//! Row reordering for interlaced images

/// `(first row, row step)` of the four interlace passes
const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Display rows in the order in which an interlaced image stores them
pub fn interlaced_rows(height: usize) -> impl Iterator<Item = usize> {
    PASSES
        .into_iter()
        .flat_map(move |(offset, step)| (offset..height).step_by(step))
}

/// Moves the rows of an interlaced plane into display order.
///
/// Bytes past the last full row are kept where they are.
pub fn deinterlace(pixels: &[u8], width: usize) -> Vec<u8> {
    if width == 0 {
        return pixels.to_vec();
    }
    let height = pixels.len() / width;
    let mut out = vec![0; pixels.len()];
    for (row, to) in pixels.chunks_exact(width).zip(interlaced_rows(height)) {
        out[to * width..(to + 1) * width].copy_from_slice(row);
    }
    let tail = height * width;
    out[tail..].copy_from_slice(&pixels[tail..]);
    out
}
