//! Explicit 5-point update of the 2D heat equation over one band.
//!
//! `dst[r][c] = src[r][c] + ratio * ((up + down) + (left + right) - 4 src[r][c])`
//!
//! Computed for every stored row except the first and last, and every column
//! except the first and last. Those skipped cells are either grid boundary
//! values or ghost rows, and `dst` keeps whatever they held.

use crate::domain::*;
use crate::error::*;
use rayon::prelude::*;

/// The update for a single cell.
/// Neighbours are summed in pairs so a uniform field is reproduced exactly.
#[inline]
pub fn heat_5pt(
    theta_ratio: f64,
    centre: f64,
    up: f64,
    down: f64,
    left: f64,
    right: f64,
) -> f64 {
    centre + theta_ratio * ((up + down) + (left + right) - 4.0 * centre)
}

/// Apply one time step from `src` into `dst`.
/// `chunk_size` is the number of rows per task for multi-threading.
pub fn update(
    theta_ratio: f64,
    src: &Band,
    dst: &mut Band,
    chunk_size: usize,
) -> HeatResult<()> {
    profiling::scope!("stencil::update");
    if !dst.same_shape(src) {
        return Err(HeatError::invalid(format!(
            "stencil source {} and destination {} differ in shape",
            src.aabb(),
            dst.aabb()
        )));
    }

    let n = src.columns();
    let rows = src.stored_rows();
    if rows < 3 || n < 3 {
        return Ok(());
    }

    let chunk_rows = chunk_size.max(1);
    let input = src.buffer();
    dst.buffer_mut()[n..(rows - 1) * n]
        .par_chunks_mut(chunk_rows * n)
        .enumerate()
        .for_each(|(chunk, output)| {
            profiling::scope!("stencil::update Thread Callback");
            for (i, out_row) in output.chunks_mut(n).enumerate() {
                let r = 1 + chunk * chunk_rows + i;
                let window = &input[(r - 1) * n..(r + 2) * n];
                update_row(theta_ratio, window, out_row);
            }
        });
    Ok(())
}

/// `window` holds the rows above, at and below `out_row`.
fn update_row(theta_ratio: f64, window: &[f64], out_row: &mut [f64]) {
    let n = out_row.len();
    let (up, rest) = window.split_at(n);
    let (centre, down) = rest.split_at(n);
    for c in 1..n - 1 {
        out_row[c] = heat_5pt(
            theta_ratio,
            centre[c],
            up[c],
            down[c],
            centre[c - 1],
            centre[c + 1],
        );
    }
}
