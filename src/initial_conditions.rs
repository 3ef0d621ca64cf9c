use crate::domain::*;
use crate::error::*;

/// Shape parameters of the exponential basis function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BasisParameters {
    pub alpha: f64,
    pub beta: f64,
}

impl BasisParameters {
    /// `exp(m * (x^2 - 2 b x y + y^2))` with `m = -1 / ((N - 1) a)^2`,
    /// where `x` is the column and `y` the row.
    pub fn value(&self, grid_size: usize, row: i32, column: i32) -> f64 {
        let x = column as f64;
        let y = row as f64;
        let form = x * x - 2.0 * self.beta * x * y + y * y;
        if form == 0.0 {
            // Also covers the single cell grid, whose multiplier is infinite.
            return 1.0;
        }

        let mut multiplier = (grid_size as f64 - 1.0) * self.alpha;
        multiplier *= multiplier;
        multiplier = -1.0 / multiplier;
        (multiplier * form).exp()
    }
}

/// Build the coordinator's initial grid.
pub fn generate_grid(
    basis: BasisParameters,
    grid_size: usize,
    chunk_size: usize,
) -> HeatResult<Grid> {
    profiling::scope!("initial_conditions::generate_grid");
    let mut grid = Grid::new(grid_size)?;
    grid.par_set_values(
        |c| basis.value(grid_size, c[0], c[1]),
        chunk_size * grid_size,
    );
    Ok(grid)
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn origin_is_one_test() {
        let basis = BasisParameters {
            alpha: 0.3,
            beta: 0.7,
        };
        let g = generate_grid(basis, 9, 2).unwrap();
        assert_approx_eq!(f64, g.get(0, 0), 1.0);

        let single = generate_grid(basis, 1, 1).unwrap();
        assert_eq!(single.get(0, 0), 1.0);
    }

    #[test]
    fn radial_test() {
        let basis = BasisParameters {
            alpha: 1.0,
            beta: 0.0,
        };
        let g = generate_grid(basis, 5, 1).unwrap();
        for r in 0..5 {
            for c in 0..5 {
                let e = (-((r * r + c * c) as f64) / 16.0).exp();
                assert_approx_eq!(f64, g.get(r, c), e, ulps = 2);
                assert_eq!(g.get(r, c), g.get(c, r));
            }
        }
        assert_approx_eq!(f64, g.get(4, 4), (-2.0f64).exp(), ulps = 2);
    }

    #[test]
    fn skew_test() {
        let basis = BasisParameters {
            alpha: 0.5,
            beta: 0.25,
        };
        // m = -1 / (8 * 0.5)^2 = -1/16
        let v = basis.value(9, 2, 3);
        let e = (-(9.0 - 2.0 * 0.25 * 6.0 + 4.0) / 16.0f64).exp();
        assert_approx_eq!(f64, v, e, ulps = 2);
    }
}
