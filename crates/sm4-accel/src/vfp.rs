//! Scoped ownership of the SIMD/floating-point register file.
//!
//! A kernel that does not preserve vector state across context switches must
//! enable the register file before an accelerated routine touches it and put
//! it back exactly as it found it afterwards. [`RegisterFile`] is the host's
//! enable/disable pair; [`VfpGuard`] brackets a use so the restore runs on
//! every exit path, unwinding included.
//!
//! Ownership is per execution context. Two threads never contend for the
//! same register file, so nothing here takes a lock.

use core::cell::Cell;

use crate::error::Result;

/// Opaque token returned by [`RegisterFile::enable`].
///
/// Records whether the register file was already enabled, so the matching
/// [`RegisterFile::disable`] restores the prior state instead of blindly
/// turning it off. Neither `Clone` nor `Copy`: a token is spent exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a register-file token must be handed back to `disable`"]
pub struct VfpState(u32);

impl VfpState {
    const WAS_ENABLED: u32 = 1;

    /// Builds a token from a host-defined scalar.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Token for a register file that was idle before acquisition.
    pub const fn idle() -> Self {
        Self(0)
    }

    /// Token for a register file that was already enabled.
    pub const fn nested() -> Self {
        Self(Self::WAS_ENABLED)
    }

    /// The host-defined scalar.
    pub fn into_raw(self) -> u32 {
        self.0
    }

    /// Whether the register file was enabled before this acquisition.
    pub fn was_enabled(&self) -> bool {
        self.0 & Self::WAS_ENABLED != 0
    }
}

/// The host kernel's acquire/release pair for the vector register file.
pub trait RegisterFile {
    /// Enables the register file for the current context.
    ///
    /// Fails only when the host cannot offer the register file at all.
    fn enable(&self) -> Result<VfpState>;

    /// Restores the state captured by the matching [`enable`](Self::enable).
    fn disable(&self, state: VfpState);
}

impl<R: RegisterFile + ?Sized> RegisterFile for &R {
    fn enable(&self) -> Result<VfpState> {
        (**self).enable()
    }

    fn disable(&self, state: VfpState) {
        (**self).disable(state)
    }
}

#[derive(Clone, Copy)]
struct ContextState {
    depth: u32,
    acquisitions: u64,
}

thread_local! {
    static CONTEXT: Cell<ContextState> = const {
        Cell::new(ContextState {
            depth: 0,
            acquisitions: 0,
        })
    };
}

/// Host model where every thread is its own execution context.
///
/// User-space threads always own a usable register file, so `enable` never
/// fails; the bookkeeping mirrors what a kernel does on each core. Nested
/// acquisition is allowed. The context counts live acquisitions, so the
/// register file stays enabled until the last one is released, whatever
/// order the guards are dropped in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadContext;

impl ThreadContext {
    /// Whether the current context holds the register file.
    pub fn is_enabled() -> bool {
        CONTEXT.with(|c| c.get().depth > 0)
    }

    /// Number of live acquisitions on the current context.
    pub fn depth() -> u32 {
        CONTEXT.with(|c| c.get().depth)
    }

    /// Number of acquisitions made on the current context.
    pub fn acquisitions() -> u64 {
        CONTEXT.with(|c| c.get().acquisitions)
    }
}

impl RegisterFile for ThreadContext {
    fn enable(&self) -> Result<VfpState> {
        CONTEXT.with(|c| {
            let prior = c.get();
            c.set(ContextState {
                depth: prior.depth.saturating_add(1),
                acquisitions: prior.acquisitions.wrapping_add(1),
            });
            Ok(if prior.depth > 0 {
                VfpState::nested()
            } else {
                VfpState::idle()
            })
        })
    }

    fn disable(&self, state: VfpState) {
        CONTEXT.with(|c| {
            let mut current = c.get();
            if current.depth == 0 {
                log::warn!("register file released while idle");
                return;
            }
            current.depth -= 1;
            if state.was_enabled() != (current.depth > 0) {
                log::trace!("vfp released out of acquisition order");
            }
            c.set(current);
        })
    }
}

/// Holds the register file until dropped.
#[must_use = "the register file is released as soon as the guard is dropped"]
pub struct VfpGuard<'h, H: RegisterFile + ?Sized> {
    host: &'h H,
    state: Option<VfpState>,
}

impl<'h, H: RegisterFile + ?Sized> VfpGuard<'h, H> {
    /// Enables the register file on `host`.
    pub fn acquire(host: &'h H) -> Result<Self> {
        let state = host.enable()?;
        log::trace!("vfp acquired (nested: {})", state.was_enabled());
        Ok(Self {
            host,
            state: Some(state),
        })
    }
}

impl<H: RegisterFile + ?Sized> Drop for VfpGuard<'_, H> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            self.host.disable(state);
            log::trace!("vfp released");
        }
    }
}

/// Runs `f` with the register file held, releasing it afterwards.
pub fn with_vfp<H, T, F>(host: &H, f: F) -> Result<T>
where
    H: RegisterFile + ?Sized,
    F: FnOnce() -> T,
{
    let _guard = VfpGuard::acquire(host)?;
    Ok(f())
}
