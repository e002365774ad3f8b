//! Kernel selection.
//!
//! Kernels are registered as an ordered list of [`Candidate`]s, best first.
//! The first candidate whose capability check passes wins; the choice is
//! made once per process and cached.
//!
//! Set `SM4ACCEL_FORCE=portable` to pin the software kernel.

use std::sync::OnceLock;

#[cfg(target_arch = "aarch64")]
use crate::kernel::Neon;
use crate::kernel::{Portable, Sm4Kernel};

/// Environment variable read by [`ForceMode::from_env`].
pub const FORCE_ENV: &str = "SM4ACCEL_FORCE";

/// A kernel together with the capability check guarding it.
#[derive(Clone, Copy)]
pub struct Candidate {
    /// Human-readable name for diagnostics.
    pub name: &'static str,
    /// Runtime capability check.
    pub available: fn() -> bool,
    /// The kernel itself.
    pub kernel: &'static dyn Sm4Kernel,
}

impl core::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("available", &(self.available)())
            .finish()
    }
}

fn always() -> bool {
    true
}

const PORTABLE: Candidate = Candidate {
    name: "portable",
    available: always,
    kernel: &Portable,
};

static FALLBACK: Candidate = PORTABLE;

#[cfg(target_arch = "aarch64")]
static CANDIDATES: &[Candidate] = &[
    Candidate {
        name: "aarch64/neon",
        available: Neon::is_available,
        kernel: &Neon,
    },
    PORTABLE,
];

#[cfg(not(target_arch = "aarch64"))]
static CANDIDATES: &[Candidate] = &[PORTABLE];

/// Override for automatic selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ForceMode {
    /// Best available kernel (default).
    #[default]
    Auto,
    /// Software kernel regardless of hardware.
    Portable,
}

impl ForceMode {
    /// Parses a case-insensitive name: `auto` or `portable`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Some(ForceMode::Auto),
            "portable" | "software" => Some(ForceMode::Portable),
            _ => None,
        }
    }

    /// Reads [`FORCE_ENV`]; unset or unrecognised values mean `Auto`.
    pub fn from_env() -> Self {
        match std::env::var(FORCE_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                log::warn!("ignoring unrecognised {FORCE_ENV}={value:?}");
                ForceMode::Auto
            }),
            Err(_) => ForceMode::Auto,
        }
    }
}

/// All registered candidates, best first.
pub fn candidates() -> &'static [Candidate] {
    CANDIDATES
}

/// Picks the kernel for `force` against the current machine.
pub fn select(force: ForceMode) -> &'static Candidate {
    if force == ForceMode::Portable {
        return &FALLBACK;
    }
    CANDIDATES
        .iter()
        .find(|candidate| (candidate.available)())
        .unwrap_or(&FALLBACK)
}

/// The process-wide kernel, selected on first use.
pub fn kernel() -> &'static dyn Sm4Kernel {
    static SELECTED: OnceLock<&'static dyn Sm4Kernel> = OnceLock::new();
    *SELECTED.get_or_init(|| {
        let force = ForceMode::from_env();
        let selected = select(force);
        log::debug!("sm4 kernel: {} (force: {force:?})", selected.name);
        selected.kernel
    })
}

/// The software kernel.
pub fn portable() -> &'static dyn Sm4Kernel {
    FALLBACK.kernel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_force_modes() {
        assert_eq!(ForceMode::parse("auto"), Some(ForceMode::Auto));
        assert_eq!(ForceMode::parse(""), Some(ForceMode::Auto));
        assert_eq!(ForceMode::parse(" Portable "), Some(ForceMode::Portable));
        assert_eq!(ForceMode::parse("software"), Some(ForceMode::Portable));
        assert_eq!(ForceMode::parse("avx512"), None);
    }

    #[test]
    fn candidate_list_ends_with_portable_fallback() {
        let last = candidates().last().expect("non-empty");
        assert_eq!(last.name, "portable");
        assert!((last.available)());
    }

    #[test]
    fn forced_portable_selects_portable() {
        assert_eq!(select(ForceMode::Portable).kernel.name(), "portable");
    }

    #[test]
    fn auto_selects_an_available_candidate() {
        let chosen = select(ForceMode::Auto);
        assert!((chosen.available)());
        assert_eq!(chosen.kernel.name(), chosen.name);
    }

    #[test]
    fn cached_kernel_is_stable() {
        assert_eq!(kernel().name(), kernel().name());
    }
}
