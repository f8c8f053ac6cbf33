//! Recursion guard for structural walks over symbols.
//!
//! Canonical signatures, "mentions a type parameter" checks and generative
//! classification all walk member graphs that may be cyclic
//! (`interface Node { next: Node; }`). `RecursionGuard` combines:
//! 1. **Cycle detection** via a visiting set
//! 2. **Depth limiting** to keep the walk off the end of the stack
//! 3. **Iteration bounding** so that a pathological graph still terminates
//!
//! Limits come from [`RecursionProfile`] presets, which read
//! `sema_common::limits`.

use rustc_hash::FxHashSet;
use sema_common::limits;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Structural canonical signature of anonymous types.
    ///
    /// depth = `MAX_TYPE_WALK_DEPTH`, iterations = `MAX_TYPE_WALK_ITERATIONS`
    CanonicalSignature,

    /// Does a type mention any of a set of type parameters.
    ///
    /// depth = `MAX_TYPE_WALK_DEPTH`, iterations = `MAX_TYPE_WALK_ITERATIONS`
    TypeMentions,

    /// Search for self-references that wrap a type parameter.
    ///
    /// depth = `MAX_TYPE_WALK_DEPTH`, iterations = `MAX_TYPE_WALK_ITERATIONS`
    GenerativeClassification,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    /// Maximum recursion depth for this profile.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::CanonicalSignature | Self::TypeMentions | Self::GenerativeClassification => {
                limits::MAX_TYPE_WALK_DEPTH
            }
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    /// Maximum iteration count for this profile.
    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::Custom { max_iterations, .. } => max_iterations,
            _ => limits::MAX_TYPE_WALK_ITERATIONS,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// This key is already being visited.
    Cycle,
    /// Maximum recursion depth exceeded.
    DepthExceeded,
    /// Maximum iteration count exceeded.
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    /// Returns `true` if any limit was exceeded (depth or iterations).
    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Tracks recursion state for cycle detection, depth limiting and iteration
/// bounding.
///
/// ```ignore
/// let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeMentions);
/// match guard.enter(symbol) {
///     RecursionResult::Entered => {
///         let result = walk(symbol);
///         guard.leave(symbol);
///         result
///     }
///     RecursionResult::Cycle => false,
///     _ => false,
/// }
/// ```
///
/// In debug builds dropping a guard with entries still in the visiting set
/// panics, as does leaving a key that was never entered.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`.
    ///
    /// On [`RecursionResult::Entered`] the caller must call
    /// [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Sticky: stays `true` once any limit was hit.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries still in the visiting set",
                self.visiting.len(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_limits_come_from_limits_module() {
        let p = RecursionProfile::CanonicalSignature;
        assert_eq!(p.max_depth(), limits::MAX_TYPE_WALK_DEPTH);
        assert_eq!(p.max_iterations(), limits::MAX_TYPE_WALK_ITERATIONS);
    }

    #[test]
    fn enter_detects_cycles() {
        let mut guard = RecursionGuard::<u32>::with_profile(RecursionProfile::TypeMentions);
        assert_eq!(guard.enter(1), RecursionResult::Entered);
        assert_eq!(guard.enter(2), RecursionResult::Entered);
        assert!(guard.enter(1).is_cycle());
        assert_eq!(guard.depth(), 2);
        guard.leave(2);
        guard.leave(1);
        assert_eq!(guard.depth(), 0);
        assert!(!guard.is_exceeded());
    }

    #[test]
    fn depth_limit_is_sticky() {
        let mut guard = RecursionGuard::<u32>::with_profile(RecursionProfile::Custom {
            max_depth: 2,
            max_iterations: 100,
        });
        assert!(guard.enter(1).is_entered());
        assert!(guard.enter(2).is_entered());
        assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
        guard.leave(2);
        guard.leave(1);
        assert!(guard.is_exceeded());
    }

    #[test]
    fn iteration_limit() {
        let mut guard = RecursionGuard::<u32>::with_profile(RecursionProfile::Custom {
            max_depth: 10,
            max_iterations: 3,
        });
        for key in 0..3 {
            assert!(guard.enter(key).is_entered());
            guard.leave(key);
        }
        assert_eq!(guard.enter(9), RecursionResult::IterationExceeded);
        assert_eq!(guard.iterations(), 4);
    }
}
