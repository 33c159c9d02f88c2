//! UI unit conversion
//!
//! The host stores lengths in centimeters and angles in radians; users work in
//! whatever units the UI is set to.

use crate::errors::CastError;
use crate::Value;
use hostbind_meta::UnitType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearUnit {
    Millimeter,
    #[default]
    Centimeter,
    Meter,
    Kilometer,
    Inch,
    Foot,
    Yard,
    Mile,
}

impl LinearUnit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mm" | "millimeter" => Some(LinearUnit::Millimeter),
            "cm" | "centimeter" => Some(LinearUnit::Centimeter),
            "m" | "meter" => Some(LinearUnit::Meter),
            "km" | "kilometer" => Some(LinearUnit::Kilometer),
            "in" | "inch" => Some(LinearUnit::Inch),
            "ft" | "foot" => Some(LinearUnit::Foot),
            "yd" | "yard" => Some(LinearUnit::Yard),
            "mi" | "mile" => Some(LinearUnit::Mile),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LinearUnit::Millimeter => "mm",
            LinearUnit::Centimeter => "cm",
            LinearUnit::Meter => "m",
            LinearUnit::Kilometer => "km",
            LinearUnit::Inch => "in",
            LinearUnit::Foot => "ft",
            LinearUnit::Yard => "yd",
            LinearUnit::Mile => "mi",
        }
    }

    /// Size of one unit in centimeters
    pub fn in_centimeters(self) -> f64 {
        match self {
            LinearUnit::Millimeter => 0.1,
            LinearUnit::Centimeter => 1.0,
            LinearUnit::Meter => 100.0,
            LinearUnit::Kilometer => 100_000.0,
            LinearUnit::Inch => 2.54,
            LinearUnit::Foot => 30.48,
            LinearUnit::Yard => 91.44,
            LinearUnit::Mile => 160_934.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngularUnit {
    Radian,
    #[default]
    Degree,
    ArcMinute,
    ArcSecond,
}

impl AngularUnit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rad" | "radian" => Some(AngularUnit::Radian),
            "deg" | "degree" => Some(AngularUnit::Degree),
            "min" | "minute" => Some(AngularUnit::ArcMinute),
            "sec" | "second" => Some(AngularUnit::ArcSecond),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AngularUnit::Radian => "rad",
            AngularUnit::Degree => "deg",
            AngularUnit::ArcMinute => "min",
            AngularUnit::ArcSecond => "sec",
        }
    }

    /// Size of one unit in radians
    pub fn in_radians(self) -> f64 {
        let degree = std::f64::consts::PI / 180.0;
        match self {
            AngularUnit::Radian => 1.0,
            AngularUnit::Degree => degree,
            AngularUnit::ArcMinute => degree / 60.0,
            AngularUnit::ArcSecond => degree / 3600.0,
        }
    }
}

/// The host's current UI units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitSettings {
    pub linear: LinearUnit,
    pub angular: AngularUnit,
}

impl UnitSettings {
    pub fn new(linear: LinearUnit, angular: AngularUnit) -> Self {
        Self { linear, angular }
    }

    /// Internal units per UI unit
    fn factor(&self, unit: UnitType) -> f64 {
        match unit {
            UnitType::Linear => self.linear.in_centimeters(),
            UnitType::Angular => self.angular.in_radians(),
        }
    }

    /// UI value to internal units
    pub fn to_internal(&self, unit: UnitType, value: &Value) -> Result<Value, CastError> {
        scale(value, self.factor(unit))
    }

    /// Internal value to UI units
    pub fn to_ui(&self, unit: UnitType, value: &Value) -> Result<Value, CastError> {
        scale(value, 1.0 / self.factor(unit))
    }
}

fn scale(value: &Value, factor: f64) -> Result<Value, CastError> {
    match value {
        Value::Int(_) | Value::Float(_) => value
            .as_f64()
            .map(|v| Value::Float(v * factor))
            .ok_or_else(|| CastError::mismatch("float", value)),
        Value::List(items) => items
            .iter()
            .map(|item| scale(item, factor))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => Err(CastError::mismatch("unit value", other)),
    }
}
