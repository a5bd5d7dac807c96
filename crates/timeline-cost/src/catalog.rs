use crate::curve::{CurveDefinition, CurveProfile, CurveShape, Steepness};
use crate::error::CurveError;
use std::collections::BTreeMap;
use tracing::debug;

pub const LINEAR: &str = "linear";
pub const FRONT_LOADED: &str = "front_loaded";
pub const BACK_LOADED: &str = "back_loaded";
pub const BELL: &str = "bell";

/// Read-only set of curve profiles keyed by id.
///
/// Built once when a project is loaded and shared by every recalculation of
/// that project. Custom definitions are validated here, never at sampling time.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveCatalog {
    profiles: BTreeMap<String, CurveProfile>,
}

impl CurveCatalog {
    /// The four built-in shapes.
    pub fn standard() -> Self {
        let profiles = [
            CurveProfile::new(LINEAR, "Linear", CurveShape::Linear),
            CurveProfile::new(FRONT_LOADED, "Front-loaded", CurveShape::FrontLoaded),
            CurveProfile::new(BACK_LOADED, "Back-loaded", CurveShape::BackLoaded),
            CurveProfile::new(BELL, "Bell (S-curve)", CurveShape::Bell),
        ]
        .into_iter()
        .map(|profile| (profile.id.clone(), profile))
        .collect();
        Self { profiles }
    }

    /// Built-in shapes plus validated host definitions.
    pub fn load(definitions: Vec<CurveDefinition>) -> Result<Self, CurveError> {
        let mut catalog = Self::standard();
        for definition in definitions {
            if catalog.profiles.contains_key(&definition.id) {
                return Err(CurveError::DuplicateProfile(definition.id));
            }
            let profile = definition.into_profile()?;
            debug!(curve = %profile.id, "loaded custom curve profile");
            catalog.profiles.insert(profile.id.clone(), profile);
        }
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Result<&CurveProfile, CurveError> {
        self.profiles
            .get(id)
            .ok_or_else(|| CurveError::UnknownProfile(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn interpolate(
        &self,
        id: &str,
        steepness: Steepness,
        period_count: u32,
    ) -> Result<Vec<f64>, CurveError> {
        Ok(self.get(id)?.interpolate(steepness, period_count))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &CurveProfile> {
        self.profiles.values()
    }

    /// Host definitions for every custom profile, in id order.
    pub fn custom_definitions(&self) -> Vec<CurveDefinition> {
        self.profiles
            .values()
            .filter_map(|profile| match &profile.shape {
                CurveShape::Custom(points) => Some(CurveDefinition {
                    id: profile.id.clone(),
                    display_name: profile.display_name.clone(),
                    points: points.as_slice().to_vec(),
                }),
                _ => None,
            })
            .collect()
    }
}

impl Default for CurveCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
