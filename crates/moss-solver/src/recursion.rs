//! Unified recursion guard for cycle detection and depth limiting.
//!
//! Member resolution, castability checking, and substitution all recurse over
//! graphs that user code can make cyclic (mutually recursive definitions,
//! self-referential bounds). Each recursive computation owns a
//! [`RecursionGuard`] combining a visiting set with a depth limit; exceeding
//! either surfaces as an internal fault in the caller, never as a stack
//! overflow.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Named recursion limit presets.
///
/// Using profiles instead of raw numbers documents why a guard exists at each
/// call site and centralizes the values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Member-cache population across supertype chains, bounds, and
    /// expansions. depth = 64
    MemberResolution,
    /// Implicit-castability search through supertypes and caster members.
    /// depth = 64
    CastCheck,
    /// Generic substitution through deeply nested shapes. depth = 128
    Substitution,
}

impl RecursionProfile {
    const fn max_depth(self) -> usize {
        match self {
            RecursionProfile::MemberResolution => 64,
            RecursionProfile::CastCheck => 64,
            RecursionProfile::Substitution => 128,
        }
    }
}

/// Outcome of [`RecursionGuard::enter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Enter {
    /// Key entered; caller must `leave` it.
    Entered,
    /// Key is already being visited on this path.
    Cycle,
    /// Depth limit reached; the computation must bail out.
    LimitExceeded,
}

pub struct RecursionGuard<K> {
    visiting: FxHashSet<K>,
    max_depth: usize,
    exceeded: bool,
}

impl<K: Eq + Hash + Copy> RecursionGuard<K> {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            visiting: FxHashSet::default(),
            max_depth: profile.max_depth(),
            exceeded: false,
        }
    }

    pub fn enter(&mut self, key: K) -> Enter {
        if self.visiting.contains(&key) {
            return Enter::Cycle;
        }
        if self.visiting.len() >= self.max_depth {
            self.exceeded = true;
            return Enter::LimitExceeded;
        }
        self.visiting.insert(key);
        Enter::Entered
    }

    pub fn leave(&mut self, key: K) {
        let removed = self.visiting.remove(&key);
        debug_assert!(removed, "leave() without matching enter()");
    }

    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn depth(&self) -> usize {
        self.visiting.len()
    }
}
