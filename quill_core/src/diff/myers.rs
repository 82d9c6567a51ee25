//! Myers shortest edit script over arbitrary token sequences.
//!
//! The common prefix and suffix are stripped before the O(ND) search runs,
//! and each round keeps only the frontier slice the backtrack needs, so
//! memory stays O(D²) rather than O(D·(N+M)).

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use std::iter;

use tracing::debug;

/// One step of an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditOp {
    /// Token present on both sides.
    Keep,
    /// Token removed from the original.
    Delete,
    /// Token added by the modified side.
    Insert,
}

/// Compute an edit script turning `a` into `b`.
///
/// When the middle section needs more than `max_cost` edits the search is
/// abandoned and the middle is reported as one deletion followed by one
/// insertion.
pub(crate) fn edit_script<T: PartialEq>(a: &[T], b: &[T], max_cost: usize) -> Vec<EditOp> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut ops = Vec::with_capacity(a.len() + b.len());
    ops.extend(iter::repeat(EditOp::Keep).take(prefix));
    if let Some(trace) = shortest_path(a_mid, b_mid, max_cost) {
        ops.extend(backtrack(a_mid.len(), b_mid.len(), &trace));
    } else {
        debug!(
            original = a_mid.len(),
            modified = b_mid.len(),
            max_cost,
            "edit cost limit reached, reporting a block replacement"
        );
        ops.extend(iter::repeat(EditOp::Delete).take(a_mid.len()));
        ops.extend(iter::repeat(EditOp::Insert).take(b_mid.len()));
    }
    ops.extend(iter::repeat(EditOp::Keep).take(suffix));
    ops
}

/// Forward pass. `trace[d]` holds `v[k]` for `k` in `-(d+1)..=d+1` as it
/// stood before round `d`.
fn shortest_path<T: PartialEq>(a: &[T], b: &[T], max_cost: usize) -> Option<Vec<Vec<isize>>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    if n == 0 && m == 0 {
        return Some(Vec::new());
    }

    let max = a.len() + b.len();
    let offset = max as isize + 1;
    let mut v = vec![0_isize; 2 * max + 3];
    let mut trace = Vec::new();

    for d in 0..=max.min(max_cost) as isize {
        let low = (offset - d - 1) as usize;
        let high = (offset + d + 1) as usize;
        trace.push(v[low..=high].to_vec());

        let mut k = -d;
        while k <= d {
            let index = (offset + k) as usize;
            let mut x = if k == -d || (k != d && v[index - 1] < v[index + 1]) {
                v[index + 1]
            } else {
                v[index - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[index] = x;
            if x >= n && y >= m {
                return Some(trace);
            }
            k += 2;
        }
    }

    None
}

fn backtrack(n: usize, m: usize, trace: &[Vec<isize>]) -> Vec<EditOp> {
    let mut x = n as isize;
    let mut y = m as isize;
    let mut ops = Vec::with_capacity(n + m);

    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let at = |k: isize| v[(k + d + 1) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(EditOp::Keep);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            ops.push(if x == prev_x {
                EditOp::Insert
            } else {
                EditOp::Delete
            });
        }
        x = prev_x;
        y = prev_y;
    }

    ops.reverse();
    ops
}
