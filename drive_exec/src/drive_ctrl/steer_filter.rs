//! Exponential smoothing of the steer demand

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use drive_if::eqpt::actuation::Control;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Smooths the steer demand across ticks.
///
/// Throttle and brake pass through unchanged so the coupling between them is kept. The filter is
/// owned by the executive, drive control itself never remembers previous commands.
#[derive(Debug, Clone)]
pub struct SteerFilter {
    alpha: f64,
    prev_steer: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerFilter {
    /// Create a new filter with the given smoothing factor.
    ///
    /// `alpha` is the weight of the newest sample, it is clamped to `(0, 1]`. An alpha of 1
    /// disables smoothing.
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() && alpha > 0.0 {
            alpha.min(1.0)
        } else {
            1.0
        };

        Self {
            alpha,
            prev_steer: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Filter the given control.
    pub fn apply(&mut self, control: &Control) -> Control {
        let steer = match self.prev_steer {
            Some(prev) => self.alpha * control.steer + (1.0 - self.alpha) * prev,
            None => control.steer,
        };
        let steer = clamp(&steer, &-1.0, &1.0);

        self.prev_steer = Some(steer);

        Control {
            steer,
            throttle: control.throttle,
            brake: control.brake,
        }
    }

    /// Forget the filter history, the next sample passes straight through.
    pub fn reset(&mut self) {
        self.prev_steer = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
