//! The audio context the engine renders into.
//!
//! An [`AudioContext`] owns the output device (or, for [`OfflineContext`],
//! nothing at all) and pulls every connected [`RenderCallback`] once per
//! device buffer. The engine never talks to hardware itself: hosts inject a
//! context, and several engines may share one, in which case their outputs
//! are summed.
//!
//! `resume` and `suspend` are asynchronous because platforms may defer them
//! (autoplay policies wait for a user gesture). They gate whether callbacks
//! run; they never change what is connected.

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, info};

/// Lifecycle of an audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// Callbacks are not being pulled
    Suspended,
    /// Callbacks are pulled once per buffer
    Running,
    /// Terminal; nothing can be connected or resumed
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        })
    }
}

/// Refusals from an audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// Playback is blocked until the platform allows it (autoplay policy)
    #[error("playback not allowed yet; waiting for user activation")]
    NotAllowed,

    /// The context has been closed
    #[error("audio context is closed")]
    Closed,
}

/// Pulled by the context on its render thread.
///
/// `left` and `right` have equal length and arrive zeroed; the callback
/// overwrites them with its output.
pub trait RenderCallback: Send {
    /// Render one device buffer.
    fn render(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// Identifies a connected callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(u64);

/// Boxed future returned by [`AudioContext::resume`] and [`AudioContext::suspend`].
pub type ContextFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ContextError>> + Send + 'a>>;

/// An output the engine can render into.
pub trait AudioContext: Send + Sync {
    /// Device sample rate in Hz.
    fn sample_rate(&self) -> f32;

    /// Current state.
    fn state(&self) -> ContextState;

    /// Starts pulling `callback`. The context owns it until [`disconnect`](Self::disconnect).
    fn connect(&self, callback: Box<dyn RenderCallback>) -> Result<RenderHandle, ContextError>;

    /// Stops pulling the callback and drops it on the calling thread.
    fn disconnect(&self, handle: RenderHandle);

    /// Asks the platform to start pulling callbacks.
    fn resume(&self) -> ContextFuture<'_>;

    /// Stops pulling callbacks without disconnecting them.
    fn suspend(&self) -> ContextFuture<'_>;
}

struct OfflineInner {
    state: ContextState,
    callbacks: Vec<(RenderHandle, Box<dyn RenderCallback>)>,
    next_handle: u64,
    autoplay_blocked: bool,
    resume_requested: bool,
    scratch_l: Vec<f32>,
    scratch_r: Vec<f32>,
}

/// In-process context that renders on demand.
///
/// Starts suspended, like a browser context created without a user gesture.
/// [`render`](Self::render) pulls every connected callback synchronously
/// while running and returns silence otherwise.
///
/// ```rust
/// use spatium_engine::{AudioContext, ContextState, OfflineContext};
///
/// let ctx = OfflineContext::new(48000.0);
/// assert_eq!(ctx.state(), ContextState::Suspended);
/// let (l, r) = ctx.render(256);
/// assert!(l.iter().chain(&r).all(|&x| x == 0.0));
/// ```
pub struct OfflineContext {
    sample_rate: f32,
    inner: Mutex<OfflineInner>,
}

impl OfflineContext {
    /// Creates a suspended context at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            inner: Mutex::new(OfflineInner {
                state: ContextState::Suspended,
                callbacks: Vec::new(),
                next_handle: 0,
                autoplay_blocked: false,
                resume_requested: false,
                scratch_l: Vec::new(),
                scratch_r: Vec::new(),
            }),
        }
    }

    /// Renders `frames` stereo frames, summing every connected callback.
    pub fn render(&self, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        self.render_into(&mut left, &mut right);
        (left, right)
    }

    /// Like [`render`](Self::render), into caller-owned buffers.
    pub fn render_into(&self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);

        let mut guard = self.inner.lock();
        if guard.state != ContextState::Running {
            return;
        }

        let inner = &mut *guard;
        let frames = left.len().min(right.len());
        inner.scratch_l.resize(frames, 0.0);
        inner.scratch_r.resize(frames, 0.0);
        for (_, callback) in &mut inner.callbacks {
            inner.scratch_l.fill(0.0);
            inner.scratch_r.fill(0.0);
            callback.render(&mut inner.scratch_l, &mut inner.scratch_r);
            for (out, x) in left.iter_mut().zip(&inner.scratch_l) {
                *out += x;
            }
            for (out, x) in right.iter_mut().zip(&inner.scratch_r) {
                *out += x;
            }
        }
    }

    /// Makes every later `resume` fail with [`ContextError::NotAllowed`].
    pub fn block_autoplay(&self) {
        self.inner.lock().autoplay_blocked = true;
    }

    /// Lifts the autoplay block, resuming if a resume was refused meanwhile.
    pub fn allow_playback(&self) {
        let mut inner = self.inner.lock();
        inner.autoplay_blocked = false;
        if inner.resume_requested && inner.state == ContextState::Suspended {
            inner.state = ContextState::Running;
            info!("playback allowed; resuming deferred request");
        }
        inner.resume_requested = false;
    }

    /// Closes the context and drops every callback.
    pub fn close(&self) {
        let callbacks = {
            let mut inner = self.inner.lock();
            inner.state = ContextState::Closed;
            std::mem::take(&mut inner.callbacks)
        };
        debug!(dropped = callbacks.len(), "offline context closed");
    }

    /// Number of connected callbacks.
    pub fn callback_count(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl fmt::Debug for OfflineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("OfflineContext")
            .field("sample_rate", &self.sample_rate)
            .field("state", &inner.state)
            .field("callbacks", &inner.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl AudioContext for OfflineContext {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn state(&self) -> ContextState {
        self.inner.lock().state
    }

    fn connect(&self, callback: Box<dyn RenderCallback>) -> Result<RenderHandle, ContextError> {
        let mut inner = self.inner.lock();
        if inner.state == ContextState::Closed {
            return Err(ContextError::Closed);
        }
        let handle = RenderHandle(inner.next_handle);
        inner.next_handle += 1;
        inner.callbacks.push((handle, callback));
        Ok(handle)
    }

    fn disconnect(&self, handle: RenderHandle) {
        // Dropped after the lock is released
        let removed = {
            let mut inner = self.inner.lock();
            let index = inner.callbacks.iter().position(|(h, _)| *h == handle);
            index.map(|i| inner.callbacks.remove(i))
        };
        debug!(?handle, found = removed.is_some(), "callback disconnected");
    }

    fn resume(&self) -> ContextFuture<'_> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            match inner.state {
                ContextState::Closed => Err(ContextError::Closed),
                ContextState::Running => Ok(()),
                ContextState::Suspended if inner.autoplay_blocked => {
                    inner.resume_requested = true;
                    Err(ContextError::NotAllowed)
                }
                ContextState::Suspended => {
                    inner.state = ContextState::Running;
                    Ok(())
                }
            }
        })
    }

    fn suspend(&self) -> ContextFuture<'_> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            match inner.state {
                ContextState::Closed => Err(ContextError::Closed),
                _ => {
                    inner.state = ContextState::Suspended;
                    Ok(())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);

    impl RenderCallback for Constant {
        fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
            left.fill(self.0);
            right.fill(-self.0);
        }
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn suspended_context_renders_silence() {
        let ctx = OfflineContext::new(48000.0);
        ctx.connect(Box::new(Constant(0.5))).unwrap();
        let (l, _) = ctx.render(64);
        assert!(l.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn running_context_sums_callbacks() {
        let ctx = OfflineContext::new(48000.0);
        ctx.connect(Box::new(Constant(0.25))).unwrap();
        let second = ctx.connect(Box::new(Constant(0.5))).unwrap();
        block_on(ctx.resume()).unwrap();

        let (l, r) = ctx.render(32);
        assert!(l.iter().all(|&x| x == 0.75));
        assert!(r.iter().all(|&x| x == -0.75));

        ctx.disconnect(second);
        assert_eq!(ctx.callback_count(), 1);
        let (l, _) = ctx.render(32);
        assert!(l.iter().all(|&x| x == 0.25));
    }

    #[test]
    fn blocked_resume_is_deferred_until_allowed() {
        let ctx = OfflineContext::new(44100.0);
        ctx.block_autoplay();
        assert_eq!(block_on(ctx.resume()), Err(ContextError::NotAllowed));
        assert_eq!(ctx.state(), ContextState::Suspended);

        ctx.allow_playback();
        assert_eq!(ctx.state(), ContextState::Running);
    }

    #[test]
    fn allow_without_pending_resume_stays_suspended() {
        let ctx = OfflineContext::new(44100.0);
        ctx.block_autoplay();
        ctx.allow_playback();
        assert_eq!(ctx.state(), ContextState::Suspended);
    }

    #[test]
    fn closed_context_refuses_everything() {
        let ctx = OfflineContext::new(48000.0);
        ctx.connect(Box::new(Constant(1.0))).unwrap();
        ctx.close();
        assert_eq!(ctx.callback_count(), 0);
        assert_eq!(block_on(ctx.resume()), Err(ContextError::Closed));
        assert!(matches!(
            ctx.connect(Box::new(Constant(1.0))),
            Err(ContextError::Closed)
        ));
    }
}
