//! Resource map: every resource distribution, grouped by body.
//!
//! Built once per session by [`ResourceMap::load`] and read-only afterwards.
//! A malformed declaration never aborts the load: it becomes a
//! [`DefinitionError`] in the [`LoadReport`] and the rest of the data still
//! loads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::band::{BandDefinition, ResourceBand};
use crate::body::BodyCatalog;
use crate::discovery::DiscoveryTracker;
use crate::error::{CatalogError, DefinitionError};
use crate::seed::{band_rng, BandStreamKey};
use crate::settings::Settings;

/// One resource at one body, as declared in data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub resource_name: String,
    pub body: String,
    #[serde(default)]
    pub bands: Vec<BandDefinition>,
}

/// All bands of one resource at one body.
#[derive(Debug, Clone)]
pub struct ResourceDistribution {
    pub resource_name: String,
    pub body: String,
    bands: Vec<ResourceBand>,
}

impl ResourceDistribution {
    /// Build the bands of a declaration without initializing them.
    pub fn new(def: &ResourceDefinition, settings: &Settings) -> Result<Self, DefinitionError> {
        let bands = def
            .bands
            .iter()
            .map(|b| ResourceBand::new(&def.resource_name, &def.body, b, settings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            resource_name: def.resource_name.clone(),
            body: def.body.clone(),
            bands,
        })
    }

    /// Initialize every band from its own seeded stream.
    pub fn initialize(&mut self, bodies: &BodyCatalog, game_seed: u64) {
        for (index, band) in self.bands.iter_mut().enumerate() {
            let key = BandStreamKey {
                body: &self.body,
                resource: &self.resource_name,
                band: &band.name,
                index,
            };
            let mut rng = band_rng(game_seed, &key);
            band.initialize(bodies, &mut rng);
        }
    }

    /// Sum of every band's sample; overlapping bands add.
    #[inline]
    pub fn sample(&self, altitude: f64, latitude: f64, longitude: f64) -> f64 {
        self.bands
            .iter()
            .map(|b| b.sample(altitude, latitude, longitude))
            .sum()
    }

    pub fn bands(&self) -> &[ResourceBand] {
        &self.bands
    }
}

/// What a load produced.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub distributions: usize,
    pub bands: usize,
    pub skipped: Vec<DefinitionError>,
}

/// Seed and lookups a load needs.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub bodies: &'a BodyCatalog,
    pub settings: &'a Settings,
    pub game_seed: u64,
}

/// Body → resource distributions.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    by_body: HashMap<String, Vec<ResourceDistribution>>,
}

impl ResourceMap {
    /// Parse a JSON array of resource declarations and load it.
    ///
    /// Only a document that is not an array at all is an error; individual
    /// entries that fail to parse are skipped and reported.
    pub fn load_json(
        json: &str,
        ctx: &LoadContext<'_>,
        tracker: &mut DiscoveryTracker,
    ) -> Result<(Self, LoadReport), CatalogError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut skipped = Vec::new();
        let mut defs = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<ResourceDefinition>(entry) {
                Ok(def) => defs.push((index, def)),
                Err(source) => skipped.push(DefinitionError::Malformed { index, source }),
            }
        }
        let (map, mut report) = Self::load_indexed(defs, ctx, tracker);
        skipped.append(&mut report.skipped);
        report.skipped = skipped;
        for err in &report.skipped {
            log::warn!("Skipping resource definition: {}", err);
        }
        Ok((map, report))
    }

    /// Build and initialize every declared distribution, then bootstrap the
    /// always-discovered and always-identified bands without reward.
    pub fn load(
        defs: Vec<ResourceDefinition>,
        ctx: &LoadContext<'_>,
        tracker: &mut DiscoveryTracker,
    ) -> (Self, LoadReport) {
        let (map, report) = Self::load_indexed(defs.into_iter().enumerate().collect(), ctx, tracker);
        for err in &report.skipped {
            log::warn!("Skipping resource definition: {}", err);
        }
        (map, report)
    }

    fn load_indexed(
        defs: Vec<(usize, ResourceDefinition)>,
        ctx: &LoadContext<'_>,
        tracker: &mut DiscoveryTracker,
    ) -> (Self, LoadReport) {
        let mut map = Self::default();
        let mut report = LoadReport::default();

        for (index, def) in defs {
            let built = Self::check_names(index, &def)
                .and_then(|()| ResourceDistribution::new(&def, ctx.settings));
            let mut dist = match built {
                Ok(dist) => dist,
                Err(err) => {
                    report.skipped.push(err);
                    continue;
                }
            };
            dist.initialize(ctx.bodies, ctx.game_seed);
            report.distributions += 1;
            report.bands += dist.bands.len();
            map.by_body.entry(dist.body.clone()).or_default().push(dist);
        }

        map.bootstrap(ctx.settings, tracker);

        log::info!(
            "Loaded {} resource distributions ({} bands) across {} bodies",
            report.distributions,
            report.bands,
            map.by_body.len()
        );
        (map, report)
    }

    /// Mark always-discovered and always-identified bands, and every band
    /// when the reveal settings are on. Grants no science.
    pub fn bootstrap(&self, settings: &Settings, tracker: &mut DiscoveryTracker) {
        for band in self.all_bands() {
            if band.always_discovered || settings.reveal_all_discovered {
                tracker.discover(band, false);
            }
            if band.always_identified || settings.reveal_all_identified {
                tracker.identify(band, false);
            }
        }
    }

    fn check_names(index: usize, def: &ResourceDefinition) -> Result<(), DefinitionError> {
        if def.resource_name.trim().is_empty() {
            return Err(DefinitionError::MissingField {
                index,
                field: "resourceName",
            });
        }
        if def.body.trim().is_empty() {
            return Err(DefinitionError::MissingField { index, field: "body" });
        }
        Ok(())
    }

    /// Concentration of `resource` at a position around `body`.
    #[inline]
    pub fn sample(&self, resource: &str, body: &str, altitude: f64, latitude: f64, longitude: f64) -> f64 {
        self.distributions(body)
            .iter()
            .filter(|d| d.resource_name == resource)
            .map(|d| d.sample(altitude, latitude, longitude))
            .sum()
    }

    /// Names of the resources present at `body`, in declaration order.
    pub fn body_resources(&self, body: &str) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for dist in self.distributions(body) {
            if !names.contains(&dist.resource_name.as_str()) {
                names.push(&dist.resource_name);
            }
        }
        names
    }

    /// Bands of `resource` at `body`; empty when either is unknown.
    pub fn body_distributions(&self, body: &str, resource: &str) -> Vec<&ResourceBand> {
        self.distributions(body)
            .iter()
            .filter(|d| d.resource_name == resource)
            .flat_map(|d| d.bands.iter())
            .collect()
    }

    pub fn band(&self, body: &str, resource: &str, band: &str) -> Option<&ResourceBand> {
        self.distributions(body)
            .iter()
            .filter(|d| d.resource_name == resource)
            .flat_map(|d| d.bands.iter())
            .find(|b| b.name == band)
    }

    pub fn distributions(&self, body: &str) -> &[ResourceDistribution] {
        self.by_body.get(body).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.by_body.keys().map(String::as_str)
    }

    pub fn all_bands(&self) -> impl Iterator<Item = &ResourceBand> {
        self.by_body
            .values()
            .flatten()
            .flat_map(|d| d.bands.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.by_body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::CelestialBody;

    const DEFS: &str = r#"[
        {
            "resourceName": "XenonGas",
            "body": "Kerbin",
            "bands": [
                { "name": "Faint", "minAbundance": 0.5, "maxAbundance": 0.5 },
                {
                    "name": "Shell",
                    "minAbundance": 2.0,
                    "maxAbundance": 2.0,
                    "distributionType": "Spherical",
                    "altLowerBound": 100000,
                    "altUpperBound": 200000,
                    "alwaysDiscovered": true
                }
            ]
        },
        { "resourceName": "Antimatter", "body": "Kerbin", "bands": [{ "name": "Belt" }] },
        { "resourceName": "Broken", "body": "Kerbin", "bands": [{ "name": 7 }] },
        { "resourceName": "", "body": "Mun" },
        { "resourceName": "Dust", "body": "Mun", "bands": [{ "minAbundance": 3, "maxAbundance": 1 }] },
        { "resourceName": "Helium3", "body": "Mun", "bands": [{ "name": "Regolith", "minAbundance": 1, "maxAbundance": 4 }] }
    ]"#;

    fn bodies() -> BodyCatalog {
        BodyCatalog::new([
            CelestialBody {
                name: "Kerbin".into(),
                radius: 600_000.0,
                science_value: 1.0,
                atmosphere: None,
            },
            CelestialBody {
                name: "Mun".into(),
                radius: 200_000.0,
                science_value: 4.0,
                atmosphere: None,
            },
        ])
    }

    fn load(seed: u64) -> (ResourceMap, LoadReport, DiscoveryTracker) {
        let settings = Settings::default();
        let bodies = bodies();
        let ctx = LoadContext {
            bodies: &bodies,
            settings: &settings,
            game_seed: seed,
        };
        let mut tracker = DiscoveryTracker::new(&settings);
        let (map, report) = ResourceMap::load_json(DEFS, &ctx, &mut tracker).unwrap();
        (map, report, tracker)
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let (map, report, _) = load(1);
        assert_eq!(report.distributions, 3);
        assert_eq!(report.bands, 4);
        assert_eq!(report.skipped.len(), 3);
        assert!(matches!(report.skipped[0], DefinitionError::Malformed { index: 2, .. }));
        assert!(matches!(
            report.skipped[1],
            DefinitionError::MissingField { index: 3, field: "resourceName" }
        ));
        assert!(matches!(report.skipped[2], DefinitionError::AbundanceRange { .. }));
        assert_eq!(map.body_resources("Mun"), vec!["Helium3"]);
    }

    #[test]
    fn overlapping_bands_add() {
        let (map, _, _) = load(1);
        let inside = map.sample("XenonGas", "Kerbin", 750_000.0, 0.0, 0.0);
        let outside = map.sample("XenonGas", "Kerbin", 650_000.0, 0.0, 0.0);
        assert!((inside - 2.5).abs() < 1e-12);
        assert!((outside - 0.5).abs() < 1e-12);
        let by_band: f64 = map
            .body_distributions("Kerbin", "XenonGas")
            .iter()
            .map(|b| b.sample(750_000.0, 0.0, 0.0))
            .sum();
        assert_eq!(inside, by_band);
    }

    #[test]
    fn queries_on_unknown_names_are_empty() {
        let (map, _, _) = load(1);
        assert!(map.body_resources("Jool").is_empty());
        assert!(map.body_distributions("Kerbin", "Ore").is_empty());
        assert_eq!(map.sample("Ore", "Kerbin", 0.0, 0.0, 0.0), 0.0);
        assert!(map.band("Kerbin", "XenonGas", "Missing").is_none());
        assert!(map.band("Kerbin", "XenonGas", "Shell").is_some());
    }

    #[test]
    fn always_discovered_bands_bootstrap_without_reward() {
        let (_, _, mut tracker) = load(1);
        assert!(tracker.is_discovered("XenonGas", "Shell", "Kerbin"));
        assert!(!tracker.is_discovered("XenonGas", "Faint", "Kerbin"));
        assert_eq!(tracker.science_awarded(), 0.0);
        assert_eq!(tracker.drain_events().len(), 1);
    }

    #[test]
    fn same_seed_same_map() {
        let (a, _, _) = load(77);
        let (b, _, _) = load(77);
        let (c, _, _) = load(78);
        let pick = |m: &ResourceMap| m.band("Mun", "Helium3", "Regolith").map(|b| b.abundance());
        assert_eq!(pick(&a), pick(&b));
        assert_ne!(pick(&a), pick(&c));
    }

    #[test]
    fn non_array_document_is_an_error() {
        let settings = Settings::default();
        let bodies = bodies();
        let ctx = LoadContext {
            bodies: &bodies,
            settings: &settings,
            game_seed: 0,
        };
        let mut tracker = DiscoveryTracker::new(&settings);
        assert!(ResourceMap::load_json("{}", &ctx, &mut tracker).is_err());
    }
}
