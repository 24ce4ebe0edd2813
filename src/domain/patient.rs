//! Patient record types for cardiac risk assessment.
//!
//! Based on the UCI heart disease feature set. Every coded field is a closed
//! enumeration that owns its dataset code and display label, so validation,
//! model encoding and presentation all go through the same type.

use serde::{Deserialize, Serialize};

/// Declares a closed enumeration backed by a dataset integer code.
///
/// Generated enums (de)serialize as their integer code and reject unknown
/// codes at the parsing boundary.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in code order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Dataset code consumed by the predictive models.
            #[must_use]
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Look up a variant by dataset code.
            ///
            /// # Errors
            /// Returns a message naming the field when the code is unknown.
            pub fn from_code(code: u8) -> Result<Self, String> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    other => Err(format!("{} code {} is not recognised", $field, other)),
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                Self::from_code(code)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.code()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

coded_enum! {
    /// Biological sex.
    Sex ("sex") {
        Female = 0 => "Female",
        Male = 1 => "Male",
    }
}

coded_enum! {
    /// Chest pain type (`cp`).
    ChestPainType ("cp") {
        TypicalAngina = 0 => "Typical angina",
        AtypicalAngina = 1 => "Atypical angina",
        NonAnginalPain = 2 => "Non-anginal pain",
        Asymptomatic = 3 => "Asymptomatic",
    }
}

impl ChestPainType {
    /// True for every variant that reports some kind of pain.
    #[must_use]
    pub fn indicates_pain(self) -> bool {
        !matches!(self, Self::Asymptomatic)
    }
}

coded_enum! {
    /// Fasting blood sugar above 120 mg/dl (`fbs`).
    FastingBloodSugar ("fbs") {
        Normal = 0 => "120 mg/dl or below",
        High = 1 => "Above 120 mg/dl",
    }
}

coded_enum! {
    /// Resting electrocardiographic result (`restecg`).
    RestingEcg ("restecg") {
        Normal = 0 => "Normal",
        StTWaveAbnormality = 1 => "ST-T wave abnormality",
        LeftVentricularHypertrophy = 2 => "Left ventricular hypertrophy",
    }
}

coded_enum! {
    /// Exercise induced angina (`exang`).
    ExerciseAngina ("exang") {
        No = 0 => "No pain during exercise",
        Yes = 1 => "Pain during exercise",
    }
}

coded_enum! {
    /// Slope of the peak exercise ST segment (`slope`).
    StSlope ("slope") {
        Upsloping = 0 => "Upsloping",
        Flat = 1 => "Flat",
        Downsloping = 2 => "Downsloping",
    }
}

coded_enum! {
    /// Number of major vessels colored by fluoroscopy (`ca`).
    MajorVessels ("ca") {
        Zero = 0 => "No vessels",
        One = 1 => "One vessel",
        Two = 2 => "Two vessels",
        Three = 3 => "Three vessels",
        Four = 4 => "Four vessels",
    }
}

coded_enum! {
    /// Thalassemia status (`thal`).
    Thalassemia ("thal") {
        Normal = 1 => "Normal",
        FixedDefect = 2 => "Fixed defect",
        ReversibleDefect = 3 => "Reversible defect",
    }
}

/// Clinical record for one patient.
///
/// Field aliases accept the dataset column names (`cp`, `trestbps`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,

    pub sex: Sex,

    #[serde(alias = "cp")]
    pub chest_pain: ChestPainType,

    /// Resting blood pressure in mmHg
    #[serde(alias = "trestbps")]
    pub resting_bp: f64,

    /// Serum cholesterol in mg/dl
    #[serde(alias = "chol")]
    pub cholesterol: f64,

    #[serde(alias = "fbs")]
    pub fasting_blood_sugar: FastingBloodSugar,

    #[serde(alias = "restecg")]
    pub resting_ecg: RestingEcg,

    /// Maximum heart rate achieved in bpm
    #[serde(alias = "thalach")]
    pub max_heart_rate: f64,

    #[serde(alias = "exang")]
    pub exercise_angina: ExerciseAngina,

    /// ST depression induced by exercise relative to rest
    #[serde(alias = "oldpeak")]
    pub st_depression: f64,

    #[serde(alias = "slope")]
    pub st_slope: StSlope,

    #[serde(alias = "ca")]
    pub major_vessels: MajorVessels,

    #[serde(alias = "thal")]
    pub thalassemia: Thalassemia,
}

impl PatientRecord {
    /// Validate that all numeric fields are finite and within expected ranges.
    ///
    /// Coded fields are closed enumerations and cannot hold invalid values.
    ///
    /// # Errors
    /// Returns every violation found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let checks: [(&str, f64, f64, f64); 5] = [
            ("Age", self.age, 1.0, 120.0),
            ("Resting BP", self.resting_bp, 50.0, 250.0),
            ("Cholesterol", self.cholesterol, 100.0, 600.0),
            ("Max heart rate", self.max_heart_rate, 50.0, 250.0),
            ("ST depression", self.st_depression, 0.0, 10.0),
        ];

        let errors: Vec<String> = checks
            .iter()
            .filter(|(_, value, min, max)| !value.is_finite() || !(*min..=*max).contains(value))
            .map(|(name, value, min, max)| format!("{name} {value} out of range [{min}, {max}]"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Patient used across tests: 65-year-old male with typical angina.
#[cfg(test)]
pub(crate) fn sample_record() -> PatientRecord {
    PatientRecord {
        age: 65.0,
        sex: Sex::Male,
        chest_pain: ChestPainType::TypicalAngina,
        resting_bp: 150.0,
        cholesterol: 260.0,
        fasting_blood_sugar: FastingBloodSugar::High,
        resting_ecg: RestingEcg::Normal,
        max_heart_rate: 145.0,
        exercise_angina: ExerciseAngina::Yes,
        st_depression: 2.5,
        st_slope: StSlope::Flat,
        major_vessels: MajorVessels::One,
        thalassemia: Thalassemia::FixedDefect,
    }
}
