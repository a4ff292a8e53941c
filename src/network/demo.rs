//! Demo seeding: one regulator, the catalog's producers and manufacturers,
//! and one container per catalog entry.
//!
//! The catalog is a fixed dataset. The default one is embedded from
//! `assets/demo/catalog.toml`; callers may supply their own.

use crate::core::error::LedgerError;
use crate::core::registry::{self, UnitOfWork};
use crate::core::resource::RecordKind;
use crate::network::HandlerContext;
use crate::network::model::{
    Container, ContainerDetails, ContainerStatus, Manufacturer, Producer, Regulator,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const EMBEDDED_CATALOG: &str = include_str!("../../assets/demo/catalog.toml");

/// Containers are owned starting from this producer index.
pub const OWNER_OFFSET: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoCatalog {
    pub regulator: String,
    pub producers: Vec<String>,
    pub manufacturers: Vec<CatalogManufacturer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogManufacturer {
    pub name: String,
    #[serde(default)]
    pub models: Vec<CatalogModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogModel {
    pub model: String,
    #[serde(default)]
    pub containers: Vec<CatalogContainer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogContainer {
    pub vin: String,
    pub colour: String,
    pub status: ContainerStatus,
}

impl DemoCatalog {
    pub fn embedded() -> Result<Self, LedgerError> {
        Self::from_toml(EMBEDDED_CATALOG)
    }

    pub fn from_toml(content: &str) -> Result<Self, LedgerError> {
        toml::from_str(content)
            .map_err(|e| LedgerError::ValidationError(format!("invalid demo catalog: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let content = fs::read_to_string(path).map_err(LedgerError::IoError)?;
        Self::from_toml(&content)
    }

    /// Number of containers the catalog describes.
    pub fn container_count(&self) -> usize {
        self.manufacturers
            .iter()
            .flat_map(|m| &m.models)
            .map(|model| model.containers.len())
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemoSummary {
    pub regulators: usize,
    pub producers: usize,
    pub manufacturers: usize,
    pub containers: usize,
}

/// Hands out container owners from the producer list in order, starting at
/// [`OWNER_OFFSET`]. Never wraps; running out is an error.
pub struct OwnerAllocator<'a> {
    producers: &'a [Producer],
    next: usize,
}

impl<'a> OwnerAllocator<'a> {
    pub fn new(producers: &'a [Producer]) -> Self {
        Self { producers, next: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.producers.len().saturating_sub(OWNER_OFFSET)
    }

    pub fn next_owner(&mut self) -> Result<&'a Producer, LedgerError> {
        let index = self.next + OWNER_OFFSET;
        let producer = self.producers.get(index).ok_or_else(|| {
            LedgerError::ValidationError(format!(
                "no producer left to own container #{} ({} producers, owners start at index {})",
                self.next + 1,
                self.producers.len(),
                OWNER_OFFSET
            ))
        })?;
        self.next += 1;
        Ok(producer)
    }
}

pub fn setup_demo(
    ctx: &HandlerContext<'_>,
    uow: &mut dyn UnitOfWork,
    catalog: &DemoCatalog,
) -> Result<DemoSummary, LedgerError> {
    let people = catalog
        .producers
        .iter()
        .map(|name| Producer::new(name, None))
        .collect::<Result<Vec<_>, _>>()?;

    let mut allocator = OwnerAllocator::new(&people);
    let wanted = catalog.container_count();
    if wanted > allocator.capacity() {
        return Err(LedgerError::ValidationError(format!(
            "demo catalog has {} containers but only {} of {} producers can own one",
            wanted,
            allocator.capacity(),
            people.len()
        )));
    }

    let manufacturers = catalog
        .manufacturers
        .iter()
        .map(|m| Manufacturer::new(&m.name, Some(&m.name)))
        .collect::<Result<Vec<_>, _>>()?;

    let regulator = Regulator::new(&catalog.regulator, Some(&catalog.regulator))?;

    let mut containers = Vec::with_capacity(wanted);
    for manufacturer in &catalog.manufacturers {
        let make = ctx
            .factory
            .new_relationship(RecordKind::Manufacturer, &manufacturer.name)?;
        for model in &manufacturer.models {
            for template in &model.containers {
                let owner = allocator.next_owner()?;
                let mut container = Container::new(
                    &template.vin,
                    ContainerDetails {
                        make: make.clone(),
                        model_type: model.model.clone(),
                        colour: template.colour.clone(),
                    },
                    template.status,
                )?;
                container.owner = Some(
                    ctx.factory
                        .new_relationship(RecordKind::Producer, &owner.id)?,
                );
                containers.push(container);
            }
        }
    }

    registry::registry::<Regulator>(uow).add(&regulator)?;
    registry::registry::<Manufacturer>(uow).add_all(&manufacturers)?;
    registry::registry::<Producer>(uow).add_all(&people)?;
    registry::registry::<Container>(uow).add_all(&containers)?;

    Ok(DemoSummary {
        regulators: 1,
        producers: people.len(),
        manufacturers: manufacturers.len(),
        containers: containers.len(),
    })
}
