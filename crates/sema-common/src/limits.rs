//! Centralized limits and thresholds for collection, binding and instantiation.
//!
//! Everything here is a recursion or work bound; none of these values change
//! observable results for well-formed input, they only stop runaway recursion on
//! pathological or cyclic declarations.

/// Maximum nesting depth of `bind_decl` re-entrancy (parent-first binding,
/// sibling binding and declared-type resolution all re-enter the binder).
///
/// # TypeScript example
///
/// ```typescript
/// // Every level forces its parent to bind first:
/// namespace A.B.C.D.E.F.G /* ... hundreds of segments ... */ {
///     export var x = 1;
/// }
/// ```
pub const MAX_BIND_DEPTH: u32 = 1_000;

/// Maximum depth for generic type instantiation.
///
/// Instantiation is lazy, so this only trips when a consumer keeps asking for
/// members of members of a diverging instantiation without consulting the
/// generative classification first.
///
/// # TypeScript example
///
/// ```typescript
/// interface IList<T> { owner: IList<IList<T>>; }
/// // IList<string>.owner.owner.owner ... never terminates structurally.
/// ```
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum depth of a structural walk over a type (canonical signatures,
/// "mentions a type parameter" checks, generative classification).
pub const MAX_TYPE_WALK_DEPTH: u32 = 100;

/// Maximum total number of steps for a single structural walk.
pub const MAX_TYPE_WALK_ITERATIONS: u32 = 100_000;

/// Maximum number of alias hops followed when resolving `import x = ...` chains.
///
/// # TypeScript example
///
/// ```typescript
/// import a = b;
/// import b = c;
/// import c = a; // cycle: stops here and resolves to nothing
/// ```
pub const MAX_ALIAS_CHAIN_DEPTH: u32 = 64;

/// Red zone (bytes) below which recursive binding grows the stack.
pub const STACK_RED_ZONE: usize = 64 * 1024;

/// Size (bytes) of each additional stack segment allocated when the red zone
/// is reached.
pub const STACK_GROWTH_SIZE: usize = 2 * 1024 * 1024;
