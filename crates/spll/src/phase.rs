//! Phase helpers. Phase is carried in cycles, `[0, 1)`.

use core::f32::consts::TAU;

/// Wrap a phase in cycles into `[0, 1)`.
///
/// Handles increments of any size and sign. Rounding can push
/// `x - floor(x)` to exactly `1.0` for tiny negative inputs; that case folds
/// to `0.0`. NaN passes through for the caller to detect.
#[must_use]
pub fn wrap(cycles: f32) -> f32 {
    let wrapped = cycles - libm::floorf(cycles);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// `(sin, cos)` of a phase given in cycles.
#[must_use]
pub fn sin_cos(cycles: f32) -> (f32, f32) {
    let radians = TAU * cycles;
    (libm::sinf(radians), libm::cosf(radians))
}

/// Wrap an angle in radians into `(-π, π]`.
#[must_use]
pub fn wrap_radians(radians: f32) -> f32 {
    let half_turns = wrap(radians / TAU + 0.5);
    let wrapped = (half_turns - 0.5) * TAU;
    if wrapped <= -core::f32::consts::PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
