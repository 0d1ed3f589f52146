//! Bounded intra-kernel row parallelism (spec.md §5): each primitive's
//! pixel loop may be split across `num_threads ∈ [1, 256]` worker threads,
//! but the scheduler always joins before the primitive returns. Row `i`
//! writes only row `i` of the output and reads only the input rows it
//! needs, so no further synchronization is required within a kernel run.

use rayon::ThreadPoolBuilder;

use crate::image::PremulImage;

/// Runs `paint_row(y, row)` for every output row, using up to
/// `num_threads` rayon workers. `num_threads` is clamped to `[1, 256]`
/// per spec.md §5; a pool failing to build (platform thread-spawn limits)
/// falls back to running rows on the calling thread.
pub fn par_rows<F>(output: &mut PremulImage, num_threads: usize, paint_row: F)
where
    F: Fn(u32, &mut [geom::PremulPixel]) + Sync,
{
    let num_threads = num_threads.clamp(1, 256);
    let height = output.height;

    if num_threads == 1 {
        for y in 0..height {
            paint_row(y, output.row_mut(y));
        }
        return;
    }

    match ThreadPoolBuilder::new().num_threads(num_threads).build() {
        Ok(pool) => pool.install(|| {
            use rayon::prelude::*;
            output
                .rows_mut()
                .enumerate()
                .par_bridge()
                .for_each(|(y, row)| paint_row(y as u32, row));
        }),
        Err(_) => {
            for y in 0..height {
                paint_row(y, output.row_mut(y));
            }
        }
    }
}
