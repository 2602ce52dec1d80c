//! Operator overloads for [`It`].
//!
//! Every operator has an owned and a borrowed form, so a builder can be
//! reused without cloning: `&x + 1` leaves `x` available.

use super::{value_ops, It, Operand};
use serde_json::Value;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};

macro_rules! binary_operator {
    ($($trait:ident :: $method:ident => $symbol:literal, $apply:path;)+) => {
        $(
            impl<R: Into<Operand>> $trait<R> for It {
                type Output = It;

                fn $method(self, rhs: R) -> It {
                    self.binary($symbol, rhs.into(), $apply)
                }
            }

            impl<R: Into<Operand>> $trait<R> for &It {
                type Output = It;

                fn $method(self, rhs: R) -> It {
                    self.binary($symbol, rhs.into(), $apply)
                }
            }
        )+
    };
}

binary_operator! {
    Add::add => "+", value_ops::add;
    Sub::sub => "-", value_ops::sub;
    Mul::mul => "*", value_ops::mul;
    Div::div => "/", value_ops::div;
    Rem::rem => "%", value_ops::rem;
    BitAnd::bitand => "&", value_ops::bitand;
    BitOr::bitor => "|", value_ops::bitor;
    BitXor::bitxor => "^", value_ops::bitxor;
    Shl::shl => "<<", value_ops::shl;
    Shr::shr => ">>", value_ops::shr;
}

// One impl per primitive family keeps literals unambiguous: `5 + it()`
// infers `i64` and `0.5 * it()` infers `f64`.
macro_rules! reflected_operator {
    ($($lhs:ty),+ => $trait:ident :: $method:ident, $symbol:literal, $apply:path) => {
        $(
            impl $trait<It> for $lhs {
                type Output = It;

                fn $method(self, rhs: It) -> It {
                    rhs.reflected($symbol, Operand::from(self), $apply)
                }
            }

            impl $trait<&It> for $lhs {
                type Output = It;

                fn $method(self, rhs: &It) -> It {
                    rhs.reflected($symbol, Operand::from(self), $apply)
                }
            }
        )+
    };
}

macro_rules! reflected_operators {
    ($($lhs:ty),+) => {
        reflected_operator!($($lhs),+ => Add::add, "+", value_ops::add);
        reflected_operator!($($lhs),+ => Sub::sub, "-", value_ops::sub);
        reflected_operator!($($lhs),+ => Mul::mul, "*", value_ops::mul);
        reflected_operator!($($lhs),+ => Div::div, "/", value_ops::div);
        reflected_operator!($($lhs),+ => Rem::rem, "%", value_ops::rem);
        reflected_operator!($($lhs),+ => BitAnd::bitand, "&", value_ops::bitand);
        reflected_operator!($($lhs),+ => BitOr::bitor, "|", value_ops::bitor);
        reflected_operator!($($lhs),+ => BitXor::bitxor, "^", value_ops::bitxor);
        reflected_operator!($($lhs),+ => Shl::shl, "<<", value_ops::shl);
        reflected_operator!($($lhs),+ => Shr::shr, ">>", value_ops::shr);
    };
}

reflected_operators!(i64, f64, bool, &str, String, Value);

impl Neg for It {
    type Output = It;

    fn neg(self) -> It {
        It::neg(&self)
    }
}

impl Neg for &It {
    type Output = It;

    fn neg(self) -> It {
        It::neg(self)
    }
}

/// `!it()` is bitwise inversion.
impl Not for It {
    type Output = It;

    fn not(self) -> It {
        self.invert()
    }
}

impl Not for &It {
    type Output = It;

    fn not(self) -> It {
        self.invert()
    }
}
