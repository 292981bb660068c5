//! Row-wise iteration over an output bitmap, parallel with the `rayon`
//! feature.

/// Calls `f(y, row)` for every `row_bytes`-sized row of `out`.
///
/// `f` must only read from data it does not write, so rows can be computed
/// in any order.
pub(crate) fn for_each_row<F>(out: &mut [u8], row_bytes: usize, f: F)
where
    F: Fn(usize, &mut [u8]) + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }

    #[cfg(not(feature = "rayon"))]
    {
        out.chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}
