//! Locally stored car make/model catalog offered on the review form.

pub mod domain;
pub mod repository;

pub use domain::{
    CarMake, CarMakeId, CarModel, CarModelDetail, CarModelId, CarType, NewCarMake, NewCarModel,
    UnknownCarType,
};
pub use repository::{CatalogError, CatalogRepository, InMemoryCatalog};
