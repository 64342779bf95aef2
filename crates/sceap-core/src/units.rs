//! Unit newtypes for low-voltage feeder quantities.
//!
//! Feeder schedules mix kW and kVA, V and kV, metres and kilometres. Keeping
//! each quantity in its own `#[repr(transparent)]` wrapper stops a cable length
//! from being added to a load by accident while costing nothing at runtime.
//!
//! ```
//! use sceap_core::units::{Kilowatts, Metres, Volts};
//!
//! let total = Kilowatts(10.0) + Kilowatts(15.0);
//! assert_eq!(total.value(), 25.0);
//!
//! let supply = Volts::from_kilovolts(11.0);
//! assert_eq!(supply, Volts(11_000.0));
//!
//! let run: Metres = [Metres(40.0), Metres(55.0)].iter().sum();
//! assert_eq!(run.value(), 95.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.2} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            #[inline]
            pub fn is_positive(self) -> bool {
                self.0.is_finite() && self.0 > 0.0
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Active power in kilowatts (kW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilowatts(pub f64);

impl_unit_ops!(Kilowatts, "kW");

impl Kilowatts {
    /// Active power drawn for an apparent power rating: `P = S × pf × η`
    #[inline]
    pub fn from_kva(kva: f64, power_factor: f64, efficiency: f64) -> Self {
        Kilowatts(kva * power_factor * efficiency)
    }
}

/// Line-to-line voltage in volts (V)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Volts(pub f64);

impl_unit_ops!(Volts, "V");

impl Volts {
    #[inline]
    pub fn from_kilovolts(kv: f64) -> Self {
        Volts(kv * 1000.0)
    }

    #[inline]
    pub fn to_kilovolts(self) -> f64 {
        self.0 / 1000.0
    }

    /// Drop expressed as a percentage of this nominal voltage (0 for a zero base)
    #[inline]
    pub fn percent_of(self, drop: Volts) -> f64 {
        if self.0.abs() < f64::EPSILON {
            0.0
        } else {
            drop.0 / self.0 * 100.0
        }
    }
}

/// Current in amperes (A)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

impl Amperes {
    #[inline]
    pub fn from_kiloamperes(ka: f64) -> Self {
        Amperes(ka * 1000.0)
    }
}

/// Cable route length in metres (m)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Metres(pub f64);

impl_unit_ops!(Metres, "m");

impl Metres {
    #[inline]
    pub fn to_kilometres(self) -> f64 {
        self.0 / 1000.0
    }
}

/// Conductor cross-section in square millimetres (mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareMillimetres(pub f64);

impl_unit_ops!(SquareMillimetres, "mm²");
