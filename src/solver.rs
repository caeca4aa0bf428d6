//! Dense linear solves for the spline boundary systems.

use nalgebra::{Const, DimMin, SMatrix, SVector};

/// Solves `a · x = b` by LU decomposition with partial pivoting over
/// doubles. Returns `None` when a pivot degenerates (singular system);
/// this does not happen for well-formed spline anchors.
pub fn solve<const N: usize>(a: SMatrix<f64, N, N>, b: SVector<f64, N>) -> Option<SVector<f64, N>>
where
    Const<N>: DimMin<Const<N>, Output = Const<N>>,
{
    a.lu().solve(&b)
}
