//! Moves rows between the coordinator's full grid and the workers' bands.

use crate::comm::*;
use crate::domain::*;
use crate::error::*;
use crate::partition::*;

/// Hand each worker its owned rows of `grid`, which only `root` provides.
/// The returned band's ghost rows are zero until the first exchange.
pub fn scatter<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    grid: Option<&Grid>,
    table: &PartitionTable,
) -> HeatResult<Band> {
    profiling::scope!("collector::scatter");
    let n = table.rows();
    if comm.rank() == root {
        match grid {
            Some(g) if g.size() == n => {}
            Some(g) => {
                return Err(HeatError::invalid(format!(
                    "grid of size {} does not match a partition of {} rows",
                    g.size(),
                    n
                )))
            }
            None => return Err(HeatError::invalid("coordinator has no grid to scatter")),
        }
    }

    let mut band = Band::new(table, comm.rank(), n)?;
    comm.scatter_varcount(
        root,
        grid.map(|g| g.buffer()),
        &table.cell_counts(n),
        &table.cell_offsets(n),
        band.owned_buffer_mut(),
    )?;
    log::debug!(
        "worker {} received rows {}..{}",
        comm.rank(),
        band.row_offset(),
        band.row_offset() + band.owned_rows()
    );
    Ok(band)
}

/// Reassemble the owned rows of every band on `root`.
/// Every other worker gets `None`.
pub fn gather<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    band: &Band,
    table: &PartitionTable,
) -> HeatResult<Option<Grid>> {
    profiling::scope!("collector::gather");
    let n = table.rows();
    let counts = table.cell_counts(n);
    let offsets = table.cell_offsets(n);

    if comm.rank() != root {
        comm.gather_varcount(root, band.owned_buffer(), &counts, &offsets, None)?;
        return Ok(None);
    }

    let mut grid = Grid::new(n)?;
    comm.gather_varcount(
        root,
        band.owned_buffer(),
        &counts,
        &offsets,
        Some(grid.buffer_mut()),
    )?;
    Ok(Some(grid))
}
