//! Resource bands: one physical deposit of one resource around one body.
//!
//! A band is built from its declarative [`BandDefinition`], then
//! [`ResourceBand::initialize`] runs once per session: it resolves the body,
//! jitters the distribution and rolls the abundance from the band's own
//! seeded stream. After that the band is read-only.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::body::{Atmosphere, BodyCatalog};
use crate::curve::FloatCurve;
use crate::distribution::{DistributionModel, FalloffType, SphericalShell};
use crate::error::DefinitionError;
use crate::settings::Settings;

/// Which intake regime can harvest a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HarvestType {
    /// Inside an atmosphere (local pressure > 0).
    #[default]
    Atmosphere,
    /// In vacuum (local pressure == 0).
    Exosphere,
    /// Either regime.
    Omni,
}

/// Shape selector in a band declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistributionKind {
    #[default]
    Uniform,
    Spherical,
}

/// Declarative form of a band, as written in resource definition files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BandDefinition {
    pub name: String,
    pub title: Option<String>,
    pub band_type: HarvestType,
    pub count_scale: f64,
    pub rotate_rate: f64,
    pub min_abundance: f64,
    pub max_abundance: f64,
    pub use_air_density: bool,
    pub density_curve: Option<FloatCurve>,
    pub always_discovered: bool,
    pub always_identified: bool,
    pub remote_discovery_scale: f64,
    pub discovery_science_reward: Option<f64>,
    pub identify_science_reward: Option<f64>,
    pub distribution_type: DistributionKind,

    pub lat_upper_bound: f64,
    pub lat_lower_bound: f64,
    pub lat_peak: f64,
    pub lat_variability: f64,
    pub lat_falloff_type: FalloffType,

    pub alt_lower_bound: f64,
    pub alt_upper_bound: f64,
    pub alt_peak: f64,
    pub alt_variability: f64,
    pub altitude_squish: f64,
    pub alt_falloff_type: FalloffType,
}

impl Default for BandDefinition {
    fn default() -> Self {
        let shell = SphericalShell::default();
        Self {
            name: "GenericBand".into(),
            title: None,
            band_type: HarvestType::Atmosphere,
            count_scale: 1.0,
            rotate_rate: 1.0,
            min_abundance: 0.0,
            max_abundance: 0.0,
            use_air_density: false,
            density_curve: None,
            always_discovered: false,
            always_identified: false,
            remote_discovery_scale: 1.0,
            discovery_science_reward: None,
            identify_science_reward: None,
            distribution_type: DistributionKind::Uniform,
            lat_upper_bound: shell.max_latitude,
            lat_lower_bound: shell.min_latitude,
            lat_peak: shell.center_latitude,
            lat_variability: 0.0,
            lat_falloff_type: FalloffType::None,
            alt_lower_bound: shell.min_altitude,
            alt_upper_bound: shell.max_altitude,
            alt_peak: shell.center_altitude,
            alt_variability: 0.0,
            altitude_squish: 0.0,
            alt_falloff_type: FalloffType::None,
        }
    }
}

impl BandDefinition {
    /// Reject values that would make sampling or the abundance roll misbehave.
    pub fn validate(&self, resource: &str, body: &str) -> Result<(), DefinitionError> {
        let non_finite = |field: &'static str| DefinitionError::NonFinite {
            resource: resource.to_string(),
            body: body.to_string(),
            band: self.name.clone(),
            field,
        };
        let numbers: [(&'static str, f64); 13] = [
            ("minAbundance", self.min_abundance),
            ("maxAbundance", self.max_abundance),
            ("remoteDiscoveryScale", self.remote_discovery_scale),
            ("latUpperBound", self.lat_upper_bound),
            ("latLowerBound", self.lat_lower_bound),
            ("latPeak", self.lat_peak),
            ("latVariability", self.lat_variability),
            ("altLowerBound", self.alt_lower_bound),
            ("altUpperBound", self.alt_upper_bound),
            ("altPeak", self.alt_peak),
            ("altVariability", self.alt_variability),
            ("altitudeSquish", self.altitude_squish),
            ("countScale", self.count_scale),
        ];
        if let Some((field, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(non_finite(*field));
        }
        if self.min_abundance > self.max_abundance {
            return Err(DefinitionError::AbundanceRange {
                resource: resource.to_string(),
                body: body.to_string(),
                band: self.name.clone(),
                min: self.min_abundance,
                max: self.max_abundance,
            });
        }
        Ok(())
    }

    /// Declared distribution, with altitudes scaled by `game_scale`.
    fn distribution(&self, game_scale: f64) -> DistributionModel {
        match self.distribution_type {
            DistributionKind::Uniform => DistributionModel::Uniform,
            DistributionKind::Spherical => DistributionModel::Spherical(SphericalShell {
                min_latitude: self.lat_lower_bound,
                max_latitude: self.lat_upper_bound,
                center_latitude: self.lat_peak,
                latitude_variability: self.lat_variability,
                latitude_falloff: self.lat_falloff_type,
                min_altitude: self.alt_lower_bound * game_scale,
                max_altitude: self.alt_upper_bound * game_scale,
                center_altitude: self.alt_peak * game_scale,
                altitude_variability: self.alt_variability * game_scale,
                altitude_squish: self.altitude_squish,
                altitude_falloff: self.alt_falloff_type,
                body_radius: 0.0,
            }),
        }
    }
}

/// Response of air-density-coupled bands when the definition gives no curve.
pub fn default_density_curve() -> FloatCurve {
    FloatCurve::linear(&[(0.0, 0.0), (1.0, 1.0), (12.0, 12.0)])
}

/// One deposit of a resource around one body.
#[derive(Debug, Clone)]
pub struct ResourceBand {
    pub name: String,
    pub title: String,
    pub resource_name: String,
    pub body_name: String,
    pub band_type: HarvestType,
    pub particle_count_scale: f64,
    pub particle_rotate_rate: f64,
    pub always_discovered: bool,
    pub always_identified: bool,
    pub remote_discovery_scale: f64,
    pub discovery_science_reward: f64,
    pub identify_science_reward: f64,

    min_abundance: f64,
    max_abundance: f64,
    use_air_density: bool,
    density_curve: FloatCurve,
    declared: DistributionModel,

    // Rolled by `initialize`.
    abundance: f64,
    distribution: DistributionModel,
    body_radius: f64,
    body_science_value: f64,
    atmosphere: Option<Atmosphere>,
}

impl ResourceBand {
    pub fn new(
        resource_name: &str,
        body_name: &str,
        def: &BandDefinition,
        settings: &Settings,
    ) -> Result<Self, DefinitionError> {
        def.validate(resource_name, body_name)?;
        let declared = def.distribution(settings.game_scale);
        let density_curve = if def.use_air_density {
            def.density_curve.clone().unwrap_or_else(default_density_curve)
        } else {
            FloatCurve::default()
        };
        Ok(Self {
            name: def.name.clone(),
            title: def.title.clone().unwrap_or_else(|| def.name.clone()),
            resource_name: resource_name.to_string(),
            body_name: body_name.to_string(),
            band_type: def.band_type,
            particle_count_scale: def.count_scale,
            particle_rotate_rate: def.rotate_rate,
            always_discovered: def.always_discovered,
            always_identified: def.always_identified,
            remote_discovery_scale: def.remote_discovery_scale,
            discovery_science_reward: def
                .discovery_science_reward
                .unwrap_or(settings.base_discover_science_reward),
            identify_science_reward: def
                .identify_science_reward
                .unwrap_or(settings.base_identify_science_reward),
            min_abundance: def.min_abundance,
            max_abundance: def.max_abundance,
            use_air_density: def.use_air_density,
            density_curve,
            distribution: declared.clone(),
            declared,
            abundance: 0.0,
            body_radius: 0.0,
            body_science_value: 1.0,
            atmosphere: None,
        })
    }

    /// Resolve the body, jitter the distribution and roll the abundance.
    ///
    /// Always starts from the declared bounds, so calling it again with an
    /// identically seeded stream reproduces the same band.
    pub fn initialize<R: Rng + ?Sized>(&mut self, bodies: &BodyCatalog, rng: &mut R) {
        match bodies.get(&self.body_name) {
            Some(body) => {
                self.body_radius = body.radius;
                self.body_science_value = body.science_value;
                self.atmosphere = body.atmosphere;
            }
            None => {
                log::warn!(
                    "Band {} of {} references unknown body {}; it will stay inert",
                    self.name,
                    self.resource_name,
                    self.body_name
                );
                self.body_radius = 0.0;
                self.body_science_value = 1.0;
                self.atmosphere = None;
            }
        }

        let mut distribution = self.declared.clone();
        distribution.set_body_radius(self.body_radius);
        distribution.initialize(rng);
        self.distribution = distribution;

        self.abundance = if self.max_abundance > self.min_abundance {
            rng.gen_range(self.min_abundance..=self.max_abundance)
        } else {
            self.min_abundance
        };
    }

    /// Concentration in t/m³ at an absolute position.
    #[inline]
    pub fn sample(&self, altitude: f64, latitude: f64, longitude: f64) -> f64 {
        let mut result = self.abundance * self.distribution.sample(altitude, latitude, longitude);
        if self.use_air_density && result != 0.0 {
            let pressure = self
                .atmosphere
                .map_or(0.0, |a| a.pressure_atm(altitude - self.body_radius));
            result *= self.density_curve.evaluate(pressure);
        }
        result
    }

    /// Whether `altitude` is within `threshold` of the band's peak.
    pub fn check_distance_to_center(&self, altitude: f64, threshold: f64) -> bool {
        (altitude - self.distribution.center()).abs() < threshold
    }

    pub fn abundance(&self) -> f64 {
        self.abundance
    }

    pub fn distribution(&self) -> &DistributionModel {
        &self.distribution
    }

    pub fn body_radius(&self) -> f64 {
        self.body_radius
    }

    /// Science multiplier of the owning body; 1 when the body is unknown.
    pub fn body_science_value(&self) -> f64 {
        self.body_science_value
    }

    pub fn uses_air_density(&self) -> bool {
        self.use_air_density
    }
}

impl std::fmt::Display for ResourceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resource band {} (abundance {}, {})",
            self.name, self.abundance, self.distribution
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::CelestialBody;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bodies() -> BodyCatalog {
        BodyCatalog::new([
            CelestialBody {
                name: "Origin".into(),
                radius: 0.0,
                science_value: 1.0,
                atmosphere: None,
            },
            CelestialBody {
                name: "Kerbin".into(),
                radius: 600_000.0,
                science_value: 1.0,
                atmosphere: Some(Atmosphere {
                    depth: 70_000.0,
                    surface_pressure_atm: 1.0,
                    scale_height: 5_600.0,
                    density_asl: 1.225,
                }),
            },
        ])
    }

    fn band(body: &str, def: &BandDefinition, seed: u64) -> ResourceBand {
        let mut band = ResourceBand::new("XenonGas", body, def, &Settings::default()).unwrap();
        band.initialize(&bodies(), &mut ChaCha8Rng::seed_from_u64(seed));
        band
    }

    #[test]
    fn uniform_band_samples_abundance() {
        let def = BandDefinition {
            min_abundance: 2.0,
            max_abundance: 2.0,
            ..BandDefinition::default()
        };
        let b = band("Origin", &def, 1);
        assert_eq!(b.sample(0.0, 0.0, 0.0), 2.0);
        assert_eq!(b.sample(5.0e7, 80.0, -120.0), 2.0);
    }

    #[test]
    fn spherical_linear_half_way() {
        let def = BandDefinition {
            min_abundance: 3.0,
            max_abundance: 3.0,
            distribution_type: DistributionKind::Spherical,
            alt_lower_bound: 0.0,
            alt_upper_bound: 100_000.0,
            alt_peak: 50_000.0,
            alt_falloff_type: FalloffType::Linear,
            ..BandDefinition::default()
        };
        let b = band("Origin", &def, 1);
        assert!((b.sample(75_000.0, 0.0, 0.0) - 1.5).abs() < 1e-12);
        assert_eq!(b.sample(50_000.0, 0.0, 0.0), 3.0);
    }

    #[test]
    fn abundance_is_seeded() {
        let def = BandDefinition {
            min_abundance: 1.0,
            max_abundance: 10.0,
            ..BandDefinition::default()
        };
        let a = band("Origin", &def, 5);
        let b = band("Origin", &def, 5);
        assert_eq!(a.abundance(), b.abundance());
        assert!(a.abundance() >= 1.0 && a.abundance() <= 10.0);
    }

    #[test]
    fn reinitialize_reproduces_bounds() {
        let def = BandDefinition {
            min_abundance: 1.0,
            max_abundance: 2.0,
            distribution_type: DistributionKind::Spherical,
            alt_peak: 40_000.0,
            alt_variability: 10_000.0,
            ..BandDefinition::default()
        };
        let mut b = band("Kerbin", &def, 11);
        let first = b.distribution().clone();
        let first_abundance = b.abundance();
        b.initialize(&bodies(), &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(b.distribution(), &first);
        assert_eq!(b.abundance(), first_abundance);
    }

    #[test]
    fn unknown_body_is_inert() {
        let def = BandDefinition {
            min_abundance: 1.0,
            max_abundance: 1.0,
            distribution_type: DistributionKind::Spherical,
            ..BandDefinition::default()
        };
        let b = band("Eeloo", &def, 1);
        assert_eq!(b.body_radius(), 0.0);
        assert_eq!(b.sample(50_000.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn game_scale_stretches_altitudes() {
        let def = BandDefinition {
            min_abundance: 1.0,
            max_abundance: 1.0,
            distribution_type: DistributionKind::Spherical,
            alt_upper_bound: 10_000.0,
            ..BandDefinition::default()
        };
        let settings = Settings {
            game_scale: 2.0,
            ..Settings::default()
        };
        let mut b = ResourceBand::new("Dust", "Origin", &def, &settings).unwrap();
        b.initialize(&bodies(), &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(b.sample(15_000.0, 0.0, 0.0), 1.0);
        assert_eq!(b.distribution().max_size(), 20_000.0);
    }

    #[test]
    fn air_density_coupling_uses_pressure() {
        let def = BandDefinition {
            min_abundance: 1.0,
            max_abundance: 1.0,
            use_air_density: true,
            ..BandDefinition::default()
        };
        let b = band("Kerbin", &def, 1);
        // Surface pressure of 1 atm maps to 1 on the default curve.
        assert!((b.sample(600_000.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!(b.sample(610_000.0, 0.0, 0.0) < 1.0);
        assert_eq!(b.sample(700_000.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn distance_to_center_is_absolute() {
        let def = BandDefinition {
            distribution_type: DistributionKind::Spherical,
            alt_peak: 20_000.0,
            ..BandDefinition::default()
        };
        let b = band("Kerbin", &def, 1);
        assert!(b.check_distance_to_center(620_500.0, 1_000.0));
        assert!(!b.check_distance_to_center(20_000.0, 1_000.0));
    }

    #[test]
    fn rewards_fall_back_to_settings() {
        let settings = Settings {
            base_discover_science_reward: 4.0,
            ..Settings::default()
        };
        let def = BandDefinition {
            identify_science_reward: Some(9.0),
            ..BandDefinition::default()
        };
        let b = ResourceBand::new("Dust", "Origin", &def, &settings).unwrap();
        assert_eq!(b.discovery_science_reward, 4.0);
        assert_eq!(b.identify_science_reward, 9.0);
        assert_eq!(b.title, "GenericBand");
    }

    #[test]
    fn inverted_abundance_is_rejected() {
        let def = BandDefinition {
            min_abundance: 5.0,
            max_abundance: 1.0,
            ..BandDefinition::default()
        };
        assert!(matches!(
            ResourceBand::new("Dust", "Origin", &def, &Settings::default()),
            Err(DefinitionError::AbundanceRange { .. })
        ));
    }

    #[test]
    fn definition_keys_follow_file_format() {
        let json = r#"{
            "name": "Upper",
            "bandType": "Exosphere",
            "distributionType": "Spherical",
            "altLowerBound": 1000,
            "altUpperBound": 5000,
            "altFalloffType": "Linear",
            "densityCurve": [[0, 0], [1, 2]]
        }"#;
        let def: BandDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.band_type, HarvestType::Exosphere);
        assert_eq!(def.alt_lower_bound, 1000.0);
        assert_eq!(def.alt_upper_bound, 5000.0);
        assert_eq!(def.alt_falloff_type, FalloffType::Linear);
        assert_eq!(def.lat_upper_bound, 90.0);
        assert!(def.density_curve.is_some());
    }
}
