//! Arity 0..=9 support for handler argument tuples, generated by a local
//! `macro_rules!` instead of ten hand-written impls.

use std::any::Any;

/// A tuple type usable as event-bus handler arguments: it knows its own
/// arity and can be identified at runtime via [`std::any::TypeId`].
pub trait Signature: Any {
    /// The number of positional elements in the tuple.
    const ARITY: usize;

    /// A human-readable rendering of the tuple's element types, used in
    /// diagnostics and [`crate::PublishResult`].
    fn canonical() -> &'static str {
        std::any::type_name::<Self>()
    }
}

macro_rules! count_tts {
    () => {0usize};
    ($_head:tt $($tail:tt)*) => {1usize + count_tts!($($tail)*)};
}

macro_rules! impl_signature {
    ($($t:ident)*) => {
        impl<$($t: 'static,)*> Signature for ($($t,)*) {
            const ARITY: usize = count_tts!($($t)*);
        }
    };
}

impl_signature!();
impl_signature!(A0);
impl_signature!(A0 A1);
impl_signature!(A0 A1 A2);
impl_signature!(A0 A1 A2 A3);
impl_signature!(A0 A1 A2 A3 A4);
impl_signature!(A0 A1 A2 A3 A4 A5);
impl_signature!(A0 A1 A2 A3 A4 A5 A6);
impl_signature!(A0 A1 A2 A3 A4 A5 A6 A7);
impl_signature!(A0 A1 A2 A3 A4 A5 A6 A7 A8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_matches_tuple_length() {
        assert_eq!(<()>::ARITY, 0);
        assert_eq!(<(i32,)>::ARITY, 1);
        assert_eq!(<(i32, String)>::ARITY, 2);
        assert_eq!(<(i32, i32, i32, i32, i32, i32, i32, i32, i32)>::ARITY, 9);
    }
}
