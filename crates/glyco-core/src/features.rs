//! Feature derivation
//!
//! Maps a validated [`UserInput`] to the 8-column feature vector the scaler and
//! classifier were fitted on. The column order is fixed by [`FEATURES`]; the
//! only place it becomes positional is [`FeatureVector::to_row`].

use serde::Serialize;

use crate::error::PreprocessingError;
use crate::input::UserInput;

/// Number of model input columns
pub const N_FEATURES: usize = 8;

/// Model input columns, in the order the scaler was fitted on
pub const FEATURES: [&str; N_FEATURES] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Family history weights for the pedigree score
pub const PARENT_WEIGHT: f64 = 0.5;
pub const SIBLING_WEIGHT: f64 = 0.1;
pub const GRANDPARENT_WEIGHT: f64 = 0.25;

/// Upper clamp of the pedigree score
pub const MAX_PEDIGREE: f64 = 1.0;

/// Derived model input
///
/// Field order matches [`FEATURES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureVector {
    pub pregnancies: u32,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub pedigree: f64,
    pub age: u32,
}

impl FeatureVector {
    /// Derive the feature vector from validated input.
    ///
    /// Inputs are expected to be range-validated already; anything that still
    /// yields a non-finite value is reported as a [`PreprocessingError`].
    pub fn derive(input: &UserInput) -> Result<Self, PreprocessingError> {
        let pregnancies = if input.gender.is_male() {
            0
        } else {
            input.pregnancies.unwrap_or(0)
        };

        Ok(Self {
            pregnancies,
            glucose: truncate("Glucose", input.glucose)?,
            blood_pressure: truncate("BloodPressure", input.blood_pressure)?,
            skin_thickness: truncate("SkinThickness", input.skin_thickness)?,
            insulin: truncate("Insulin", input.insulin)?,
            bmi: bmi(input.weight, input.height)?,
            pedigree: pedigree_score(
                input.family_parents,
                input.family_siblings,
                input.family_grandparents,
            ),
            age: input.age,
        })
    }

    /// Positional form for the model boundary, in [`FEATURES`] order.
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        [
            self.pregnancies as f64,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.pedigree,
            self.age as f64,
        ]
    }
}

/// Body mass index, `weight / height²` rounded to 2 decimals.
pub fn bmi(weight: f64, height: f64) -> Result<f64, PreprocessingError> {
    if !(height > 0.0) {
        return Err(PreprocessingError::NonPositiveHeight(height));
    }
    let value = round_to(weight / (height * height), 2);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PreprocessingError::NonFinite {
            feature: "BMI",
            value,
        })
    }
}

/// Heuristic stand-in for the diabetes pedigree function.
///
/// Weighted family history, clamped to [`MAX_PEDIGREE`] and rounded to 3
/// decimals. The weights must stay in line with what the model was trained on.
pub fn pedigree_score(parents: u8, siblings: u8, grandparents: u8) -> f64 {
    let raw = PARENT_WEIGHT * parents as f64
        + SIBLING_WEIGHT * siblings as f64
        + GRANDPARENT_WEIGHT * grandparents as f64;
    round_to(raw.min(MAX_PEDIGREE), 3)
}

/// Round to `decimals` places, ties to even on the exact binary value.
///
/// `round_to(15.625, 2)` is `15.62`. A scaled product that only looks like a
/// tie after the multiplication is resolved by the sign of its rounding error.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }

    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        // Exact residual of the multiplication
        let error = value.mul_add(factor, -scaled);
        if error > 0.0 {
            floor + 1.0
        } else if error < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / factor
}

/// Drop the fractional part; magnitude is kept as is.
fn truncate(feature: &'static str, value: f64) -> Result<f64, PreprocessingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value.trunc())
    } else {
        Err(PreprocessingError::NonFinite { feature, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Gender;

    fn input(gender: Gender) -> UserInput {
        UserInput {
            gender,
            glucose: 120.0,
            blood_pressure: 70.0,
            skin_thickness: 20.0,
            insulin: 80.0,
            age: 45,
            weight: 80.0,
            height: 1.8,
            pregnancies: Some(3),
            family_parents: 1,
            family_siblings: 0,
            family_grandparents: 2,
        }
    }

    #[test]
    fn test_male_example() {
        let features = FeatureVector::derive(&input(Gender::Male)).unwrap();
        assert_eq!(features.pregnancies, 0);
        assert_eq!(features.bmi, 24.69);
        assert_eq!(features.pedigree, 1.0);
        assert_eq!(
            features.to_row(),
            [0.0, 120.0, 70.0, 20.0, 80.0, 24.69, 1.0, 45.0]
        );
    }

    #[test]
    fn test_female_example_without_family() {
        let mut female = input(Gender::Female);
        female.family_parents = 0;
        female.family_grandparents = 0;

        let features = FeatureVector::derive(&female).unwrap();
        assert_eq!(features.pregnancies, 3);
        assert_eq!(features.pedigree, 0.0);
    }

    #[test]
    fn test_female_absent_pregnancies_defaults_to_zero() {
        let mut female = input(Gender::Female);
        female.pregnancies = None;
        assert_eq!(FeatureVector::derive(&female).unwrap().pregnancies, 0);
    }

    #[test]
    fn test_truncation_not_rounding() {
        let mut sample = input(Gender::Female);
        sample.glucose = 120.99;
        sample.blood_pressure = 70.5;
        sample.skin_thickness = 0.9;
        sample.insulin = 80.01;

        let features = FeatureVector::derive(&sample).unwrap();
        assert_eq!(features.glucose, 120.0);
        assert_eq!(features.blood_pressure, 70.0);
        assert_eq!(features.skin_thickness, 0.0);
        assert_eq!(features.insulin, 80.0);
    }

    #[test]
    fn test_large_values_not_clamped() {
        let mut sample = input(Gender::Female);
        sample.glucose = 1e30;
        sample.insulin = 2.5e20;

        let features = FeatureVector::derive(&sample).unwrap();
        assert_eq!(features.to_row()[1], 1e30);
        assert_eq!(features.insulin, 2.5e20);
    }

    #[test]
    fn test_pedigree_weights_and_clamp() {
        assert_eq!(pedigree_score(0, 0, 0), 0.0);
        assert_eq!(pedigree_score(1, 0, 0), 0.5);
        assert_eq!(pedigree_score(0, 1, 0), 0.1);
        assert_eq!(pedigree_score(0, 3, 0), 0.3);
        assert_eq!(pedigree_score(0, 0, 1), 0.25);
        assert_eq!(pedigree_score(0, 3, 1), 0.55);
        assert_eq!(pedigree_score(2, 4, 4), 1.0);
    }

    #[test]
    fn test_pedigree_in_unit_interval() {
        for parents in 0..=2 {
            for siblings in 0..=4 {
                for grandparents in 0..=4 {
                    let score = pedigree_score(parents, siblings, grandparents);
                    assert!((0.0..=1.0).contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_bmi_rounding() {
        assert_eq!(bmi(80.0, 1.8).unwrap(), 24.69);
        assert_eq!(bmi(0.0, 1.7).unwrap(), 0.0);
        assert_eq!(bmi(70.0, 1.75).unwrap(), 22.86);
    }

    #[test]
    fn test_bmi_ties_round_to_even() {
        // 62.5 / 4 = 15.625 and 30.5 / 4 = 7.625 are exact in binary
        assert_eq!(bmi(62.5, 2.0).unwrap(), 15.62);
        assert_eq!(bmi(30.5, 2.0).unwrap(), 7.62);
        // 87.5 / 4 = 21.875
        assert_eq!(bmi(87.5, 2.0).unwrap(), 21.88);
    }

    #[test]
    fn test_round_to_near_ties() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        // Stored below the tie, so it rounds down
        assert_eq!(round_to(1.005, 2), 1.0);
        // Stored above the tie, so it rounds up
        assert_eq!(round_to(2.675000000000001, 2), 2.68);
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }

    #[test]
    fn test_bmi_rejects_bad_height() {
        assert_eq!(
            bmi(80.0, 0.0),
            Err(PreprocessingError::NonPositiveHeight(0.0))
        );
        assert!(matches!(
            bmi(f64::MAX, 1e-200),
            Err(PreprocessingError::NonFinite { feature: "BMI", .. })
        ));
    }

    #[test]
    fn test_feature_names_order() {
        let features = FeatureVector::derive(&input(Gender::Male)).unwrap();
        let value = serde_json::to_value(features).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = FEATURES.to_vec();
        expected.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
        assert_eq!(features.to_row().len(), FEATURES.len());
    }
}
