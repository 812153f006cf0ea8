//! Patient input schema and request validation
//!
//! A [`UserInput`] only exists once every field has passed its type and range
//! checks. Validation does not stop at the first bad field: all problems of a
//! request body are collected into one [`ValidationErrors`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{FieldError, ValidationErrors};

/// Upper bound for the family history of diabetes among parents
pub const MAX_FAMILY_PARENTS: u8 = 2;
/// Upper bound for the family history of diabetes among siblings
pub const MAX_FAMILY_SIBLINGS: u8 = 4;
/// Upper bound for the family history of diabetes among grandparents
pub const MAX_FAMILY_GRANDPARENTS: u8 = 4;

/// Patient gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn is_male(&self) -> bool {
        matches!(self, Gender::Male)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    /// Case-insensitive: "Male", "MALE" and "male" are the same gender.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

/// Validated patient biometrics for a single prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "Value")]
pub struct UserInput {
    pub gender: Gender,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    /// Ignored for male patients
    pub pregnancies: Option<u32>,
    pub family_parents: u8,
    pub family_siblings: u8,
    pub family_grandparents: u8,
}

impl UserInput {
    /// Validate a JSON request body and build the input from it.
    ///
    /// Unknown keys are ignored. `Pregnancies` and the three family counters
    /// may be absent or null.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let Some(map) = body.as_object() else {
            return Err(FieldError::body(
                "model_attributes_type",
                "Input should be a valid dictionary or object to extract fields from",
            )
            .into());
        };

        let mut reader = FieldReader::new(map);

        let gender = reader.gender("Gender");
        let glucose = reader.real("Glucose", Lower::Inclusive(0.0));
        let blood_pressure = reader.real("BloodPressure", Lower::Inclusive(0.0));
        let skin_thickness = reader.real("SkinThickness", Lower::Inclusive(0.0));
        let insulin = reader.real("Insulin", Lower::Inclusive(0.0));
        let age = reader.integer("Age", None, u32::MAX as i64);
        let weight = reader.real("Weight", Lower::Inclusive(0.0));
        let height = reader.real("Height", Lower::Exclusive(0.0));
        let pregnancies = reader.optional_integer("Pregnancies", u32::MAX as i64);
        let family_parents =
            reader.integer("FamilyParents", Some(0), MAX_FAMILY_PARENTS as i64);
        let family_siblings =
            reader.integer("FamilySiblings", Some(0), MAX_FAMILY_SIBLINGS as i64);
        let family_grandparents =
            reader.integer("FamilyGrandparents", Some(0), MAX_FAMILY_GRANDPARENTS as i64);

        let errors = reader.finish();
        match (
            gender,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            age,
            weight,
            height,
            pregnancies,
            family_parents,
            family_siblings,
            family_grandparents,
        ) {
            (
                Some(gender),
                Some(glucose),
                Some(blood_pressure),
                Some(skin_thickness),
                Some(insulin),
                Some(age),
                Some(weight),
                Some(height),
                Some(pregnancies),
                Some(family_parents),
                Some(family_siblings),
                Some(family_grandparents),
            ) if errors.is_empty() => Ok(Self {
                gender,
                glucose,
                blood_pressure,
                skin_thickness,
                insulin,
                age: age as u32,
                weight,
                height,
                pregnancies: pregnancies.map(|p| p as u32),
                family_parents: family_parents as u8,
                family_siblings: family_siblings as u8,
                family_grandparents: family_grandparents as u8,
            }),
            _ => Err(errors),
        }
    }
}

impl TryFrom<Value> for UserInput {
    type Error = ValidationErrors;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

/// Lower bound of a real-valued field
#[derive(Debug, Clone, Copy)]
enum Lower {
    Inclusive(f64),
    Exclusive(f64),
}

/// Reads typed fields out of a JSON object, recording every failure
struct FieldReader<'a> {
    map: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            errors: ValidationErrors::new(),
        }
    }

    fn finish(self) -> ValidationErrors {
        self.errors
    }

    fn reject(&mut self, name: &str, kind: &str, msg: impl Into<String>) {
        self.errors.push(FieldError::field(name, kind, msg));
    }

    fn required(&mut self, name: &str) -> Option<&'a Value> {
        match self.map.get(name) {
            Some(value) => Some(value),
            None => {
                self.reject(name, "missing", "Field required");
                None
            }
        }
    }

    fn gender(&mut self, name: &str) -> Option<Gender> {
        match self.required(name)? {
            Value::String(s) => match s.parse() {
                Ok(gender) => Some(gender),
                Err(_) => {
                    self.reject(name, "enum", "Input should be 'male' or 'female'");
                    None
                }
            },
            _ => {
                self.reject(name, "string_type", "Input should be a valid string");
                None
            }
        }
    }

    fn real(&mut self, name: &str, lower: Lower) -> Option<f64> {
        let value = match self.required(name)? {
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        let Some(value) = value else {
            self.reject(name, "float_type", "Input should be a valid number");
            return None;
        };

        match lower {
            Lower::Inclusive(min) if value < min => {
                self.reject(
                    name,
                    "greater_than_equal",
                    format!("Input should be greater than or equal to {}", min),
                );
                None
            }
            Lower::Exclusive(min) if value <= min => {
                self.reject(
                    name,
                    "greater_than",
                    format!("Input should be greater than {}", min),
                );
                None
            }
            _ => Some(value),
        }
    }

    /// Integer field with an inclusive range of `0..=max`.
    ///
    /// A missing or null field takes `default` when one is given.
    fn integer(&mut self, name: &str, default: Option<i64>, max: i64) -> Option<i64> {
        let value = match (self.map.get(name), default) {
            (None | Some(Value::Null), Some(default)) => return Some(default),
            (None, None) => {
                self.reject(name, "missing", "Field required");
                return None;
            }
            (Some(value), _) => value,
        };
        self.bounded_integer(name, value, max)
    }

    /// Nullable integer field; `Ok(None)` is encoded as `Some(None)`.
    fn optional_integer(&mut self, name: &str, max: i64) -> Option<Option<i64>> {
        match self.map.get(name) {
            None | Some(Value::Null) => Some(None),
            Some(value) => self.bounded_integer(name, value, max).map(Some),
        }
    }

    fn bounded_integer(&mut self, name: &str, value: &Value, max: i64) -> Option<i64> {
        let parsed = match value {
            Value::Number(n) => integer_from_number(n),
            _ => Err(NotInteger::WrongType),
        };

        let value = match parsed {
            Ok(v) => v,
            Err(NotInteger::Fractional) => {
                self.reject(
                    name,
                    "int_from_float",
                    "Input should be a valid integer, got a number with a fractional part",
                );
                return None;
            }
            Err(NotInteger::WrongType) => {
                self.reject(name, "int_type", "Input should be a valid integer");
                return None;
            }
        };

        if value < 0 {
            self.reject(
                name,
                "greater_than_equal",
                "Input should be greater than or equal to 0",
            );
            None
        } else if value > max {
            self.reject(
                name,
                "less_than_equal",
                format!("Input should be less than or equal to {}", max),
            );
            None
        } else {
            Some(value)
        }
    }
}

enum NotInteger {
    WrongType,
    Fractional,
}

/// Integers are accepted as JSON integers or as floats with no fractional part.
fn integer_from_number(n: &Number) -> Result<i64, NotInteger> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        // Larger than i64::MAX; every caller's upper bound is far below this.
        return Ok(i64::MAX);
    }
    match n.as_f64() {
        Some(f) if f.fract() != 0.0 => Err(NotInteger::Fractional),
        Some(f) if f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(NotInteger::WrongType),
    }
}
