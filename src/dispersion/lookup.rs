//! dispersion::lookup — cumulative count table for digamma-type sums.
//!
//! Purpose
//! -------
//! Replace the per-observation harmonic sums that appear in the
//! negative-binomial score,
//!
//! ```text
//! Σᵢ Σ_{v=0}^{yᵢ−1} 1/(r+v)  =  Σᵢ [ψ(yᵢ+r) − ψ(r)],
//! ```
//!
//! by a single pass over a table indexed by count value. With
//! `table[v] = |{i : yᵢ > v}|` the double sum regroups exactly into
//! `Σ_v table[v]/(r+v)`, so an O(Σ yᵢ) loop becomes O(max y) per evaluation.
//!
//! Key behaviors
//! -------------
//! - [`build_cumulative_count_table`] validates the counts, builds a
//!   histogram of size `M+1` and turns it into a suffix sum in one
//!   top-down pass.
//! - [`CumulativeCountTable::digamma_sum`] and
//!   [`CumulativeCountTable::trigamma_sum`] evaluate the first- and
//!   second-order sums used by the score and its derivative.
//!
//! Invariants & assumptions
//! ------------------------
//! - `table.len() == max(y)`; an empty or all-zero count vector gives an
//!   empty table and both sums are exactly `0.0`.
//! - The table is non-increasing and `table[M−1]` is the frequency of the
//!   maximum count.
//! - The table remembers `n_obs`, the length of the count vector it was
//!   built from, so evaluators can reject a table paired with other counts.
//!
//! Performance
//! -----------
//! - Construction is O(n + M) time and O(M) extra space. The histogram is
//!   dropped after the suffix pass.
//! - Sums accumulate from `v = 0` upwards; the order is fixed so results are
//!   bit-for-bit reproducible across calls.

use crate::dispersion::errors::{DispersionError, DispersionResult};

/// CumulativeCountTable — `table[v]` = number of observations with count `> v`.
///
/// Fields
/// ------
/// - `counts`: `Vec<u64>`
///   Suffix sums of the count histogram, length `max(y)`.
/// - `n_obs`: `usize`
///   Number of observations the table was built from.
///
/// Invariants
/// ----------
/// - `counts` is non-increasing and `counts[0] <= n_obs` when non-empty.
/// - Only constructible through [`build_cumulative_count_table`], so the
///   invariants above always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeCountTable {
    counts: Vec<u64>,
    n_obs: usize,
}

impl CumulativeCountTable {
    /// Table entries, `table[v]` for `v = 0..M`.
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Table length `M`, i.e. the maximum count.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Maximum count in the source vector (equal to [`len`](Self::len)).
    pub fn max_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of observations in the source vector.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// `Σ_v table[v] / (r + v)`, equal to `Σᵢ [ψ(yᵢ+r) − ψ(r)]`.
    ///
    /// No validation of `r` happens here; callers check `r > 0` first.
    pub fn digamma_sum(&self, r: f64) -> f64 {
        self.counts.iter().enumerate().map(|(v, &c)| c as f64 / (r + v as f64)).sum()
    }

    /// `Σ_v table[v] / (r + v)²`, equal to `Σᵢ [ψ₁(r) − ψ₁(yᵢ+r)]`.
    pub fn trigamma_sum(&self, r: f64) -> f64 {
        self.counts
            .iter()
            .enumerate()
            .map(|(v, &c)| {
                let denom = r + v as f64;
                c as f64 / (denom * denom)
            })
            .sum()
    }
}

/// build_cumulative_count_table — histogram + suffix sum over the counts.
///
/// Parameters
/// ----------
/// - `y`: `&[i64]`
///   Observed counts, one per observation. May be empty.
///
/// Returns
/// -------
/// `DispersionResult<CumulativeCountTable>`
///   Table of length `M = max(y)` (0 for empty or all-zero input) with
///   `table[v] = |{i : yᵢ > v}|`.
///
/// Errors
/// ------
/// - `DispersionError::NegativeCount { index, value }`
///   The first negative entry of `y`.
/// - `DispersionError::CountTooLarge { value }`
///   `max(y) + 1` does not fit in `usize`, or the table for `max(y)` cannot
///   be allocated.
///
/// Panics
/// ------
/// - Never panics.
///
/// Examples
/// --------
/// ```rust
/// # use rust_overdispersion::dispersion::build_cumulative_count_table;
/// let table = build_cumulative_count_table(&[0, 1, 2]).unwrap();
/// assert_eq!(table.as_slice(), &[2, 1]);
/// ```
pub fn build_cumulative_count_table(y: &[i64]) -> DispersionResult<CumulativeCountTable> {
    let mut max_y: i64 = 0;
    for (index, &value) in y.iter().enumerate() {
        if value < 0 {
            return Err(DispersionError::NegativeCount { index, value });
        }
        max_y = max_y.max(value);
    }
    let m = usize::try_from(max_y)
        .ok()
        .filter(|&m| m < usize::MAX)
        .ok_or(DispersionError::CountTooLarge { value: max_y })?;

    let mut histogram = zeroed_counts(m + 1, max_y)?;
    for &value in y {
        // Non-negative and <= m after the scan above.
        histogram[value as usize] += 1;
    }

    let mut counts = zeroed_counts(m, max_y)?;
    let mut above: u64 = 0;
    for k in (1..=m).rev() {
        above += histogram[k];
        counts[k - 1] = above;
    }

    log::trace!("built cumulative count table: n_obs = {}, max count = {}", y.len(), m);
    Ok(CumulativeCountTable { counts, n_obs: y.len() })
}

// Allocation failure (including capacity overflow) is reported, not raised.
fn zeroed_counts(len: usize, max_y: i64) -> DispersionResult<Vec<u64>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| DispersionError::CountTooLarge { value: max_y })?;
    out.resize(len, 0_u64);
    Ok(out)
}
