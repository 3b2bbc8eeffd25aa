//! Enumerated Field Support.
//!
//! Enumerated fields carry a hardware-defined set of named values. Rust enums
//! implement [`FieldEnum`] (usually through [`field_enum!`](crate::field_enum))
//! to describe that set. Hardware does not stop software from writing an
//! encoding that has no name, so raw bits are never clamped: a value outside
//! the set is carried as [`EnumValue::Undefined`] with the raw bits as written.

use serde::Deserialize;

/// An enumeration usable as the value of a register field.
pub trait FieldEnum: Copy + 'static {
    /// Decodes raw field bits, returning `None` for encodings with no variant.
    fn from_bits(bits: u32) -> Option<Self>;

    /// Returns the raw encoding of the variant.
    fn bits(self) -> u32;

    /// Returns every `(name, encoding)` pair, in declaration order.
    fn variants() -> &'static [(&'static str, u32)];
}

/// Decoded value of an enumerated field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumValue<E> {
    /// The bits match a declared variant.
    Known(E),

    /// The bits match no declared variant and are preserved as written.
    Undefined(u32),
}

impl<E: FieldEnum> EnumValue<E> {
    /// Decodes raw field bits.
    pub fn from_bits(bits: u32) -> Self {
        match E::from_bits(bits) {
            Some(variant) => EnumValue::Known(variant),
            None => EnumValue::Undefined(bits),
        }
    }

    /// Returns the raw encoding, whether or not it is defined.
    pub fn bits(self) -> u32 {
        match self {
            EnumValue::Known(variant) => variant.bits(),
            EnumValue::Undefined(bits) => bits,
        }
    }

    /// Returns the variant if the encoding is defined.
    pub fn known(self) -> Option<E> {
        match self {
            EnumValue::Known(variant) => Some(variant),
            EnumValue::Undefined(_) => None,
        }
    }

    /// Returns `true` if the encoding matches no declared variant.
    pub fn is_undefined(self) -> bool {
        matches!(self, EnumValue::Undefined(_))
    }
}

impl<E: FieldEnum> From<E> for EnumValue<E> {
    fn from(variant: E) -> Self {
        EnumValue::Known(variant)
    }
}

/// A named encoding of an enumerated field, independent of any Rust type.
///
/// Register maps loaded from a description only know their variants at
/// runtime; typed fields convert their [`FieldEnum`] table into this form.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Variant {
    pub name: String,
    pub value: u32,
}

/// Returns the variant table of `E` in runtime form.
pub fn variants_of<E: FieldEnum>() -> Vec<Variant> {
    E::variants()
        .iter()
        .map(|(name, value)| Variant {
            name: (*name).to_string(),
            value: *value,
        })
        .collect()
}

/// Looks up the name of `bits` in a runtime variant table.
pub fn variant_name(variants: &[Variant], bits: u32) -> Option<&str> {
    variants
        .iter()
        .find(|v| v.value == bits)
        .map(|v| v.name.as_str())
}

/// Declares an enum usable as an enumerated register field.
///
/// Each variant is given its raw encoding. Encodings need not be contiguous;
/// gaps decode as [`EnumValue::Undefined`]. The macro derives `Clone`, `Copy`,
/// `Debug`, `PartialEq`, `Eq` and `Hash`.
///
/// ```
/// mmio_regs::field_enum! {
///     /// Oscillator operating mode.
///     pub enum Mode {
///         Xtal = 0,
///         XtalHp = 1,
///         DigExtClk = 3,
///     }
/// }
///
/// use mmio_regs::register::enumerated::FieldEnum;
/// assert_eq!(Mode::from_bits(3), Some(Mode::DigExtClk));
/// assert_eq!(Mode::from_bits(2), None);
/// ```
#[macro_export]
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::register::enumerated::FieldEnum for $name {
            fn from_bits(bits: u32) -> Option<Self> {
                $(
                    if bits == ($value) {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            fn bits(self) -> u32 {
                match self {
                    $( $name::$variant => $value ),+
                }
            }

            fn variants() -> &'static [(&'static str, u32)] {
                &[ $( (stringify!($variant), $value) ),+ ]
            }
        }
    };
}
