use crate::util::*;
use rayon::prelude::*;

/// A buffer that represents some box of world coordinates.
/// Values are addressed by world coordinate and translated
/// into the buffer's own linear layout.
pub trait DomainView<const GRID_DIMENSION: usize>: Sync {
    fn aabb(&self) -> &AABB<GRID_DIMENSION>;

    fn buffer(&self) -> &[f64];

    fn buffer_mut(&mut self) -> &mut [f64];

    fn aabb_buffer_mut(&mut self) -> (&AABB<GRID_DIMENSION>, &mut [f64]);

    /// Value at `world_coord`, panics if the coordinate lies outside the view.
    #[track_caller]
    fn view(&self, world_coord: &Coord<GRID_DIMENSION>) -> f64 {
        assert!(
            self.aabb().contains(world_coord),
            "{} does not contain {:?}",
            self.aabb(),
            world_coord
        );
        let index = self.aabb().coord_to_linear(world_coord);
        self.buffer()[index]
    }

    fn try_view(&self, world_coord: &Coord<GRID_DIMENSION>) -> Option<f64> {
        if self.aabb().contains(world_coord) {
            let index = self.aabb().coord_to_linear(world_coord);
            Some(self.buffer()[index])
        } else {
            None
        }
    }

    #[track_caller]
    fn set_coord(&mut self, world_coord: &Coord<GRID_DIMENSION>, value: f64) {
        assert!(
            self.aabb().contains(world_coord),
            "{} does not contain {:?}",
            self.aabb(),
            world_coord
        );
        let index = self.aabb().coord_to_linear(world_coord);
        self.buffer_mut()[index] = value;
    }

    fn par_set_values<F: Fn(Coord<GRID_DIMENSION>) -> f64 + Send + Sync>(
        &mut self,
        f: F,
        chunk_size: usize,
    ) {
        let (aabb, buffer) = self.aabb_buffer_mut();
        par_set_values_impl(buffer, aabb, &f, chunk_size);
    }
}

/// Rust compiler can't figure out how to borrow aabb and buffer
/// at the same time inside the trait default.
/// By putting their borrows into one function call first we work around it.
fn par_set_values_impl<const GRID_DIMENSION: usize, F>(
    buffer: &mut [f64],
    aabb: &AABB<GRID_DIMENSION>,
    f: &F,
    chunk_size: usize,
) where
    F: Fn(Coord<GRID_DIMENSION>) -> f64 + Send + Sync,
{
    let chunk_size = chunk_size.max(1);
    buffer[0..aabb.buffer_size()]
        .par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(i, buffer_chunk): (usize, &mut [f64])| {
            let offset = i * chunk_size;
            for (j, value) in buffer_chunk.iter_mut().enumerate() {
                *value = f(aabb.linear_to_coord(offset + j));
            }
        });
}
