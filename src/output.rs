//! Plain-text grid dump: one line per row, every cell as `%8.3f` plus a tab.

use crate::domain::*;
use crate::error::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_grid<W: Write>(grid: &Grid, out: &mut W) -> HeatResult<()> {
    for r in 0..grid.size() {
        for v in grid.row(r) {
            write!(out, "{:8.3}\t", v)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_grid_file(grid: &Grid, path: &Path) -> HeatResult<()> {
    profiling::scope!("output::write_grid_file");
    let mut out = BufWriter::new(File::create(path)?);
    write_grid(grid, &mut out)?;
    out.flush()?;
    log::info!("wrote {}x{} grid to {}", grid.size(), grid.size(), path.display());
    Ok(())
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn format_test() {
        let g = Grid::from_buffer(2, vec![1.0, -0.5, 12.34567, 1234.0]).unwrap();
        let mut out = Vec::new();
        write_grid(&g, &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, "   1.000\t  -0.500\t\n  12.346\t1234.000\t\n");
    }

    #[test]
    fn file_test() {
        let path = std::env::temp_dir()
            .join(format!("halo_heat_output_{}.txt", std::process::id()));
        let g = Grid::from_buffer(1, vec![0.25]).unwrap();
        write_grid_file(&g, &path).unwrap();
        let s = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(s, "   0.250\t\n");
    }
}
