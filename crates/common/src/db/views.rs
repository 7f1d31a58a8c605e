//! Read models assembled from several entities

use crate::countries;
use crate::db::models::{Coffee, Processing, Roaster, TastingNote};
use serde::Serialize;

/// A coffee with its related rows resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoffeeDetails {
    pub coffee: Coffee,
    pub processing: Option<Processing>,
    pub roaster: Option<Roaster>,
    /// Sorted by name
    pub tasting_notes: Vec<TastingNote>,
}

impl CoffeeDetails {
    pub fn processing_name(&self) -> Option<&str> {
        self.processing.as_ref().map(|p| p.name.as_str())
    }

    pub fn roaster_name(&self) -> Option<&str> {
        self.roaster.as_ref().map(|r| r.name.as_str())
    }

    pub fn tasting_note_names(&self) -> Vec<&str> {
        self.tasting_notes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Flag of the origin country, empty when the country is unknown
    pub fn flag(&self) -> String {
        coffee_flag(&self.coffee)
    }

    /// "<name> (<roaster>)" or just the name when there is no roaster
    pub fn title(&self) -> String {
        match self.roaster_name() {
            Some(roaster) => format!("{} ({})", self.coffee.name, roaster),
            None => self.coffee.name.clone(),
        }
    }
}

/// Flag for a coffee's origin country
pub fn coffee_flag(coffee: &Coffee) -> String {
    countries::country_flag(&coffee.country)
}

/// A roaster with the number of the user's coffees it roasted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoasterSummary {
    pub roaster: Roaster,
    pub coffees: i64,
}

/// A processing method with the number of coffees using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingUsage {
    pub processing: Processing,
    pub used: i64,
}
