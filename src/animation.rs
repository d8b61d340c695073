//! Cooperative animation loop.
//!
//! The host owns the real frame callback (a window redraw, a timer, a test
//! loop). [`AnimationLoop`] only tracks which scheduled callback is current:
//! every [`request`](AnimationLoop::request) hands out a fresh
//! [`FrameHandle`], and [`fire`](AnimationLoop::fire) accepts a callback only
//! if its handle is still the pending one. A callback scheduled before a
//! cancel, a deactivation or a reconfiguration is rejected, so two loops
//! never drive one engine.

/// Identifies one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Bookkeeping for at most one in-flight frame callback.
#[derive(Debug, Clone)]
pub struct AnimationLoop {
    next_id: u64,
    pending: Option<FrameHandle>,
    active: bool,
    last_timestamp: Option<f64>,
    frames_fired: u64,
}

impl AnimationLoop {
    /// A new loop, active and with nothing scheduled.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: None,
            active: true,
            last_timestamp: None,
            frames_fired: 0,
        }
    }

    /// Schedule the next frame, replacing any pending one.
    ///
    /// Returns `None` while the loop is inactive.
    pub fn request(&mut self) -> Option<FrameHandle> {
        if !self.active {
            return None;
        }
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some(handle);
        Some(handle)
    }

    /// Drop the pending callback. Firing its handle later does nothing.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            log::trace!("Cancelled frame {}", handle.0);
        }
    }

    /// Cancel whatever is in flight and schedule afresh.
    pub fn restart(&mut self) -> Option<FrameHandle> {
        self.cancel();
        self.request()
    }

    /// Deliver a frame callback.
    ///
    /// Returns `true` and consumes the pending handle if `handle` is the
    /// current one and the loop is active. Stale or foreign handles return
    /// `false` and change nothing.
    pub fn fire(&mut self, handle: FrameHandle, timestamp_ms: f64) -> bool {
        if !self.active || self.pending != Some(handle) {
            log::trace!("Ignoring stale frame {}", handle.0);
            return false;
        }
        self.pending = None;
        self.last_timestamp = Some(timestamp_ms);
        self.frames_fired += 1;
        true
    }

    /// Turn the loop on or off. Deactivating cancels the pending callback;
    /// reactivating does not schedule one by itself.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        if !active {
            self.cancel();
        }
        log::debug!("Animation loop {}", if active { "resumed" } else { "stopped" });
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Timestamp of the last accepted callback.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    pub fn frames_fired(&self) -> u64 {
        self.frames_fired
    }
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_and_fire() {
        let mut anim = AnimationLoop::new();
        let handle = anim.request().unwrap();
        assert!(anim.is_pending());
        assert!(anim.fire(handle, 16.0));
        assert!(!anim.is_pending());
        assert_eq!(anim.last_timestamp(), Some(16.0));
        // a handle only fires once
        assert!(!anim.fire(handle, 32.0));
        assert_eq!(anim.frames_fired(), 1);
    }

    #[test]
    fn test_cancelled_handle_is_stale() {
        let mut anim = AnimationLoop::new();
        let handle = anim.request().unwrap();
        anim.cancel();
        assert!(!anim.fire(handle, 16.0));
        assert_eq!(anim.frames_fired(), 0);
    }

    #[test]
    fn test_restart_replaces_pending() {
        let mut anim = AnimationLoop::new();
        let old = anim.request().unwrap();
        let new = anim.restart().unwrap();
        assert_ne!(old, new);
        assert!(!anim.fire(old, 16.0));
        assert!(anim.fire(new, 16.0));
    }

    #[test]
    fn test_inactive_loop_schedules_nothing() {
        let mut anim = AnimationLoop::new();
        let handle = anim.request().unwrap();
        anim.set_active(false);
        assert!(!anim.is_pending());
        assert!(anim.request().is_none());
        assert!(!anim.fire(handle, 16.0));

        anim.set_active(true);
        assert!(!anim.is_pending());
        let handle = anim.request().unwrap();
        assert!(anim.fire(handle, 32.0));
    }
}
