use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::Deserialize;
use tracing::info;

use super::domain::{
    CarMake, CarMakeId, CarModel, CarModelDetail, CarModelId, NewCarMake, NewCarModel,
    MAKE_DESCRIPTION_MAX, MAKE_NAME_MAX, MODEL_NAME_MAX,
};

/// Storage abstraction for the locally maintained make/model catalog.
pub trait CatalogRepository: Send + Sync {
    fn add_make(&self, make: NewCarMake) -> Result<CarMake, CatalogError>;
    fn add_model(&self, model: NewCarModel) -> Result<CarModel, CatalogError>;
    fn make(&self, id: CarMakeId) -> Result<Option<CarMake>, CatalogError>;
    fn model(&self, id: CarModelId) -> Result<Option<CarModel>, CatalogError>;
    fn makes(&self) -> Result<Vec<CarMake>, CatalogError>;
    fn models(&self) -> Result<Vec<CarModel>, CatalogError>;
    /// Removes a make together with every model referencing it.
    fn remove_make(&self, id: CarMakeId) -> Result<usize, CatalogError>;

    fn model_details(&self) -> Result<Vec<CarModelDetail>, CatalogError> {
        let makes: BTreeMap<CarMakeId, CarMake> = self
            .makes()?
            .into_iter()
            .map(|make| (make.id, make))
            .collect();

        Ok(self
            .models()?
            .iter()
            .filter_map(|model| {
                makes
                    .get(&model.make_id)
                    .map(|make| CarModelDetail::new(model, make))
            })
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{field} must be between 1 and {max} characters")]
    InvalidLength { field: &'static str, max: usize },
    #[error("car make {0} does not exist")]
    UnknownMake(u64),
    #[error("failed to read catalog fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog fixture: {0}")]
    Fixture(#[from] serde_json::Error),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct CatalogState {
    next_make: u64,
    next_model: u64,
    makes: BTreeMap<CarMakeId, CarMake>,
    models: BTreeMap<CarModelId, CarModel>,
}

/// Process-local catalog; ids are handed out sequentially starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    #[serde(default)]
    makes: Vec<FixtureMake>,
}

#[derive(Debug, Deserialize)]
struct FixtureMake {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    models: Vec<FixtureModel>,
}

#[derive(Debug, Deserialize)]
struct FixtureModel {
    name: String,
    #[serde(default)]
    dealer_id: Option<i64>,
    #[serde(default)]
    car_type: super::domain::CarType,
    #[serde(default)]
    year: Option<chrono::NaiveDate>,
}

impl InMemoryCatalog {
    pub fn from_fixture_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_fixture_str(&raw)?;
        info!(
            path = %path.as_ref().display(),
            makes = catalog.lock()?.makes.len(),
            "catalog fixture loaded"
        );
        Ok(catalog)
    }

    pub fn from_fixture_str(raw: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_json::from_str(raw)?;
        let catalog = Self::default();

        for make in fixture.makes {
            let created = catalog.add_make(NewCarMake {
                name: make.name,
                description: make.description,
            })?;
            for model in make.models {
                catalog.add_model(NewCarModel {
                    make_id: created.id,
                    dealer_id: model.dealer_id,
                    name: model.name,
                    car_type: model.car_type,
                    year: model.year,
                })?;
            }
        }

        Ok(catalog)
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogState>, CatalogError> {
        self.state
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), CatalogError> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(CatalogError::InvalidLength { field, max });
    }
    Ok(())
}

impl CatalogRepository for InMemoryCatalog {
    fn add_make(&self, make: NewCarMake) -> Result<CarMake, CatalogError> {
        check_length("name", &make.name, MAKE_NAME_MAX)?;
        let description = make
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if let Some(text) = &description {
            check_length("description", text, MAKE_DESCRIPTION_MAX)?;
        }

        let mut state = self.lock()?;
        state.next_make += 1;
        let record = CarMake {
            id: CarMakeId(state.next_make),
            name: make.name.trim().to_string(),
            description,
        };
        state.makes.insert(record.id, record.clone());
        Ok(record)
    }

    fn add_model(&self, model: NewCarModel) -> Result<CarModel, CatalogError> {
        check_length("name", &model.name, MODEL_NAME_MAX)?;

        let mut state = self.lock()?;
        if !state.makes.contains_key(&model.make_id) {
            return Err(CatalogError::UnknownMake(model.make_id.0));
        }

        state.next_model += 1;
        let record = CarModel {
            id: CarModelId(state.next_model),
            make_id: model.make_id,
            dealer_id: model.dealer_id,
            name: model.name.trim().to_string(),
            car_type: model.car_type,
            year: model.year,
        };
        state.models.insert(record.id, record.clone());
        Ok(record)
    }

    fn make(&self, id: CarMakeId) -> Result<Option<CarMake>, CatalogError> {
        Ok(self.lock()?.makes.get(&id).cloned())
    }

    fn model(&self, id: CarModelId) -> Result<Option<CarModel>, CatalogError> {
        Ok(self.lock()?.models.get(&id).cloned())
    }

    fn makes(&self) -> Result<Vec<CarMake>, CatalogError> {
        Ok(self.lock()?.makes.values().cloned().collect())
    }

    fn models(&self) -> Result<Vec<CarModel>, CatalogError> {
        Ok(self.lock()?.models.values().cloned().collect())
    }

    fn remove_make(&self, id: CarMakeId) -> Result<usize, CatalogError> {
        let mut state = self.lock()?;
        if state.makes.remove(&id).is_none() {
            return Err(CatalogError::UnknownMake(id.0));
        }

        let before = state.models.len();
        state.models.retain(|_, model| model.make_id != id);
        Ok(before - state.models.len())
    }
}
