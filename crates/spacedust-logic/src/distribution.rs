//! Distribution models: where inside a band the resource actually is.
//!
//! A model maps an absolute position `(altitude, latitude, longitude)` to a
//! unitless density factor in `[0, 1]`. The band multiplies that factor by
//! its abundance.
//!
//! # Variants
//!
//! | Variant | Shape | `center()` / `max_size()` |
//! |---------|-------|---------------------------|
//! | `Uniform` | 1 everywhere | 0 / 0 |
//! | `Spherical` | altitude shell × latitude band | absolute altitude |
//!
//! The spherical factor is the *product* of the altitude and latitude
//! factors, so density vanishes outside either range.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shape of the density decay from a band's center toward its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FalloffType {
    /// Hard edge: 1 inside the bounds, 0 outside.
    #[default]
    None,
    /// Triangular profile: 1 at the center, 0 at whichever bound is on the
    /// sample's side of the center.
    Linear,
}

/// Factor for one axis of a shell.
///
/// With `Linear` falloff a side whose bound coincides with the center is flat
/// (factor 1 up to the bound) instead of dividing by zero.
#[inline]
pub fn axis_factor(value: f64, min: f64, center: f64, max: f64, falloff: FalloffType) -> f64 {
    if value < min || value > max {
        return 0.0;
    }
    match falloff {
        FalloffType::None => 1.0,
        FalloffType::Linear => {
            let (distance, span) = if value > center {
                (value - center, max - center)
            } else {
                (center - value, center - min)
            };
            if span <= 0.0 {
                1.0
            } else {
                1.0 - (distance / span).clamp(0.0, 1.0)
            }
        }
    }
}

/// A shell around a body bounded in altitude and latitude.
///
/// Altitude bounds are surface-relative; samples take absolute altitude and
/// the body radius is subtracted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphericalShell {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub center_latitude: f64,
    pub latitude_variability: f64,
    pub latitude_falloff: FalloffType,

    pub min_altitude: f64,
    pub max_altitude: f64,
    pub center_altitude: f64,
    pub altitude_variability: f64,
    /// Flattening toward the poles: the altitude half-widths shrink by
    /// `squish × |lat| / 90`.
    pub altitude_squish: f64,
    pub altitude_falloff: FalloffType,

    /// Radius of the owning body, injected at band initialization.
    pub body_radius: f64,
}

impl Default for SphericalShell {
    fn default() -> Self {
        Self {
            min_latitude: -90.0,
            max_latitude: 90.0,
            center_latitude: 0.0,
            latitude_variability: 0.0,
            latitude_falloff: FalloffType::None,
            min_altitude: 0.0,
            max_altitude: 100_000.0,
            center_altitude: 0.0,
            altitude_variability: 0.0,
            altitude_squish: 0.0,
            altitude_falloff: FalloffType::None,
            body_radius: 0.0,
        }
    }
}

impl SphericalShell {
    pub fn sample(&self, altitude: f64, latitude: f64, _longitude: f64) -> f64 {
        let lat_factor = axis_factor(
            latitude,
            self.min_latitude,
            self.center_latitude,
            self.max_latitude,
            self.latitude_falloff,
        );
        if lat_factor == 0.0 {
            return 0.0;
        }
        lat_factor * self.altitude_factor(altitude, latitude)
    }

    fn altitude_factor(&self, altitude: f64, latitude: f64) -> f64 {
        let altitude = altitude - self.body_radius;
        let (min, max) = self.altitude_bounds_at(latitude);
        axis_factor(altitude, min, self.center_altitude, max, self.altitude_falloff)
    }

    /// Surface-relative altitude bounds at a latitude, after squish.
    pub fn altitude_bounds_at(&self, latitude: f64) -> (f64, f64) {
        if self.altitude_squish == 0.0 {
            return (self.min_altitude, self.max_altitude);
        }
        let scale = (1.0 - self.altitude_squish * latitude.abs() / 90.0).max(0.0);
        (
            self.center_altitude - (self.center_altitude - self.min_altitude) * scale,
            self.center_altitude + (self.max_altitude - self.center_altitude) * scale,
        )
    }

    /// Jitter every bound by up to its axis variability.
    ///
    /// Draw order is fixed (latitude min, max, center, then altitude min,
    /// max, center) so a given stream always produces the same bounds.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.min_latitude += jitter(rng, self.latitude_variability);
        self.max_latitude += jitter(rng, self.latitude_variability);
        self.center_latitude += jitter(rng, self.latitude_variability);

        self.min_altitude += jitter(rng, self.altitude_variability);
        self.max_altitude += jitter(rng, self.altitude_variability);
        self.center_altitude += jitter(rng, self.altitude_variability);

        if self.min_latitude > self.max_latitude {
            std::mem::swap(&mut self.min_latitude, &mut self.max_latitude);
        }
        if self.min_altitude > self.max_altitude {
            std::mem::swap(&mut self.min_altitude, &mut self.max_altitude);
        }
        self.center_latitude = self
            .center_latitude
            .clamp(self.min_latitude, self.max_latitude);
        self.center_altitude = self
            .center_altitude
            .clamp(self.min_altitude, self.max_altitude);
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, variability: f64) -> f64 {
    let v = variability.abs();
    if v > 0.0 {
        rng.gen_range(-v..=v)
    } else {
        0.0
    }
}

/// Closed set of distribution shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DistributionModel {
    Uniform,
    Spherical(SphericalShell),
}

impl DistributionModel {
    /// Density factor in `[0, 1]` at an absolute position.
    #[inline]
    pub fn sample(&self, altitude: f64, latitude: f64, longitude: f64) -> f64 {
        match self {
            DistributionModel::Uniform => 1.0,
            DistributionModel::Spherical(shell) => shell.sample(altitude, latitude, longitude),
        }
    }

    /// Absolute altitude of the density peak.
    pub fn center(&self) -> f64 {
        match self {
            DistributionModel::Uniform => 0.0,
            DistributionModel::Spherical(shell) => shell.center_altitude + shell.body_radius,
        }
    }

    /// Absolute altitude of the outer edge.
    pub fn max_size(&self) -> f64 {
        match self {
            DistributionModel::Uniform => 0.0,
            DistributionModel::Spherical(shell) => shell.max_altitude + shell.body_radius,
        }
    }

    /// Apply the seeded jitter. The only operation that moves bounds.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            DistributionModel::Uniform => {}
            DistributionModel::Spherical(shell) => shell.initialize(rng),
        }
    }

    pub fn set_body_radius(&mut self, radius: f64) {
        if let DistributionModel::Spherical(shell) = self {
            shell.body_radius = radius;
        }
    }
}

impl std::fmt::Display for DistributionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionModel::Uniform => write!(f, "Uniform distribution"),
            DistributionModel::Spherical(s) => write!(
                f,
                "Spherical distribution (altitude {:.1}-{:.1} km, center {:.1} km; latitude {:.1}-{:.1}, center {:.1})",
                s.min_altitude / 1000.0,
                s.max_altitude / 1000.0,
                s.center_altitude / 1000.0,
                s.min_latitude,
                s.max_latitude,
                s.center_latitude
            ),
        }
    }
}
