#[macro_export]
macro_rules! bits_ext {
    ($structname:ident, $len:literal) => {
        #[repr(transparent)]
        #[derive(PartialEq, Eq, Debug, Clone, Copy)]
        pub struct $structname($crate::bits::Bits<$len>);

        impl $crate::bits::BitsExt for $structname {
            fn from_num(bits: u8) -> Self {
                Self($crate::bits::Bits::from(bits))
            }

            fn from_bits(bits: Vec<bool>) -> Self {
                Self($crate::bits::Bits::from_bits(bits))
            }

            fn to_inner(&self) -> u8 {
                self.0.to_inner()
            }

            fn zero() -> Self {
                Self($crate::bits::Bits::from(0))
            }

            fn one() -> Self {
                Self($crate::bits::Bits::from(1))
            }

            fn bits(&self) -> &[bool] {
                self.0.bits()
            }
        }
    };
}

/// Declares the frame kinds the parser understands: a sum type for
/// dispatch plus one module-level const per kind carrying its wire byte.
#[macro_export]
macro_rules! frame_kinds {
    {$($typename:ident = $encoding:expr,)*} => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub enum FrameKind {
            $($typename),*
        }

        $(pub const $typename: u8 = $encoding;)*
    }
}
