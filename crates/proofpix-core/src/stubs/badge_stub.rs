//! Recording [`BadgeRenderer`].

use parking_lot::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::traits::BadgeRenderer;

/// Records requested scores and returns a tiny fake payload.
#[derive(Debug, Default)]
pub struct StubBadgeRenderer {
    rendered: Mutex<Vec<u8>>,
    fail: bool,
}

impl StubBadgeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Scores passed to `render`, in call order.
    pub fn rendered_scores(&self) -> Vec<u8> {
        self.rendered.lock().clone()
    }
}

impl BadgeRenderer for StubBadgeRenderer {
    fn render(&self, score: u8) -> CoreResult<Vec<u8>> {
        self.rendered.lock().push(score);
        if self.fail {
            return Err(CoreError::Internal("injected badge failure".into()));
        }
        Ok(format!("badge:{}", score).into_bytes())
    }
}
