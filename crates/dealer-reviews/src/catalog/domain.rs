use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const MAKE_NAME_MAX: usize = 50;
pub const MAKE_DESCRIPTION_MAX: usize = 500;
pub const MODEL_NAME_MAX: usize = 60;

/// Identifier wrapper for car makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CarMakeId(pub u64);

/// Identifier wrapper for car models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CarModelId(pub u64);

/// Manufacturer entry, e.g. "Audi".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarMake {
    pub id: CarMakeId,
    pub name: String,
    pub description: Option<String>,
}

impl fmt::Display for CarMake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name:{},Description:{}",
            self.name,
            self.description.as_deref().unwrap_or_default()
        )
    }
}

/// Body style offered for a car model.
///
/// Serialized as its stored code; deserialized from either the code or the
/// label, ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CarType {
    Sedan,
    #[default]
    Suv,
    Wagon,
    Sport,
    Coupe,
    Mini,
    Van,
    Pickup,
    Truck,
    Other,
}

impl CarType {
    pub const ALL: [CarType; 10] = [
        CarType::Sedan,
        CarType::Suv,
        CarType::Wagon,
        CarType::Sport,
        CarType::Coupe,
        CarType::Mini,
        CarType::Van,
        CarType::Pickup,
        CarType::Truck,
        CarType::Other,
    ];

    /// Stored value, as persisted and sent to the review store.
    pub fn code(self) -> &'static str {
        match self {
            CarType::Sedan => "Sedan",
            CarType::Suv => "SUV",
            CarType::Wagon => "Wagon",
            CarType::Sport => "Sport",
            CarType::Coupe => "Coupe",
            CarType::Mini => "Mini",
            CarType::Van => "Van",
            CarType::Pickup => "Pickup",
            CarType::Truck => "Truck",
            CarType::Other => "Other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CarType::Sedan => "Sedan",
            CarType::Suv => "SUV",
            CarType::Wagon => "Station wagon",
            CarType::Sport => "Sports Car",
            CarType::Coupe => "Coupe",
            CarType::Mini => "Mini van",
            CarType::Van => "Van",
            CarType::Pickup => "Pick-up truck",
            CarType::Truck => "Truck",
            CarType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown car type '{0}'")]
pub struct UnknownCarType(pub String);

impl FromStr for CarType {
    type Err = UnknownCarType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        CarType::ALL
            .into_iter()
            .find(|kind| {
                kind.code().eq_ignore_ascii_case(needle) || kind.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownCarType(raw.to_string()))
    }
}

impl Serialize for CarType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for CarType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A concrete model sold by a dealer, linked to its make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarModel {
    pub id: CarModelId,
    pub make_id: CarMakeId,
    pub dealer_id: Option<i64>,
    pub name: String,
    pub car_type: CarType,
    pub year: Option<NaiveDate>,
}

impl fmt::Display for CarModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = match self.year {
            Some(year) => year.to_string(),
            None => "None".to_string(),
        };
        write!(
            f,
            "Name: {}Built At:{}Model :{}",
            self.name,
            year,
            self.car_type.code()
        )
    }
}

/// Payload for registering a make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCarMake {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for registering a model under an existing make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCarModel {
    pub make_id: CarMakeId,
    #[serde(default)]
    pub dealer_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub car_type: CarType,
    #[serde(default)]
    pub year: Option<NaiveDate>,
}

/// Model joined with its make, as offered on the review form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarModelDetail {
    pub id: CarModelId,
    pub make: String,
    pub name: String,
    pub car_type: &'static str,
    pub year: Option<i32>,
    pub dealer_id: Option<i64>,
}

impl CarModelDetail {
    pub fn new(model: &CarModel, make: &CarMake) -> Self {
        use chrono::Datelike;

        Self {
            id: model.id,
            make: make.name.clone(),
            name: model.name.clone(),
            car_type: model.car_type.label(),
            year: model.year.map(|date| date.year()),
            dealer_id: model.dealer_id,
        }
    }
}
