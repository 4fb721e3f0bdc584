pub use enclose::*;

/// Builds a [`Computed`](crate::Computed) from an expression, cloning the
/// listed handles into the closure and depending on each of them.
///
/// ```
/// use rebind::{computed, Var};
///
/// let a = Var::new(2);
/// let b = Var::new(3);
/// let sum = computed!((a, b) => a.get() + b.get());
///
/// a.set(10).unwrap();
/// assert_eq!(sum.get(), 13);
/// ```
#[macro_export]
macro_rules! computed {
    (() => $($b:tt)*) => {
        $crate::Computed::new(move || { $($b)* }, &[])
    };
    (( $($dep:ident),+ $(,)? ) => $($b:tt)*) => {
        $crate::Computed::new(
            $crate::macros::enclose!(($( $dep ),+) move || { $($b)* }),
            &[$( &$dep as &dyn $crate::Dependency ),+],
        )
    };
}
