use crate::frame::Frame;

/// Ticket for one pending per-frame callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

/// Requests that fired on a single frame, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredFrame {
    pub frame: Frame,
    pub handles: Vec<FrameHandle>,
}

impl FiredFrame {
    pub fn fired(&self, handle: FrameHandle) -> bool {
        self.handles.contains(&handle)
    }
}

/// One-shot per-frame callback registry.
///
/// Each request fires on the next pumped frame and is then forgotten; a
/// consumer that wants to keep animating must request again from inside its
/// callback. Cancelling before the pump guarantees the request never fires.
#[derive(Debug)]
pub struct FrameLoop {
    next_id: u64,
    next_frame: Frame,
    pending: Vec<FrameHandle>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            next_frame: Frame::first(),
            pending: Vec::new(),
        }
    }

    pub fn request(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(handle);
        handle
    }

    /// Returns whether `handle` was still pending.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|h| *h != handle);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Index of the frame the next pump will fire.
    pub fn next_frame(&self) -> Frame {
        self.next_frame
    }

    /// Fires every pending request and advances to the next frame.
    pub fn pump(&mut self) -> FiredFrame {
        let frame = self.next_frame;
        self.next_frame = frame.next();
        let handles = std::mem::take(&mut self.pending);
        if !handles.is_empty() {
            tracing::trace!(frame = frame.index, fired = handles.len(), "frame pumped");
        }
        FiredFrame { frame, handles }
    }
}
