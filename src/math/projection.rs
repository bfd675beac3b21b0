//! Map projections between geographic and planar coordinates.
//!
//! ## Purpose
//!
//! Observations are selected and fitted in a planar (metric) coordinate
//! system; output centroids are reported back as latitude/longitude. This
//! module provides the two projections a run needs: an identity passthrough
//! for data that is already planar, and ellipsoidal polar stereographic on
//! WGS84 (variant B, latitude of true scale).
//!
//! ## Design notes
//!
//! * Southern projections are evaluated by reflecting through the equator
//!   and reusing the northern formulas.
//! * The inverse iterates the conformal-latitude series to convergence.
//! * Generic over `Float` so `no_std` builds go through `libm`.
//!
//! ## Key concepts
//!
//! * **Latitude of true scale**: The parallel where the scale factor is exactly 1.
//! * **Central meridian**: The longitude mapped to the negative (north) or
//!   positive (south) y axis.
//!
//! ## Non-goals
//!
//! * General CRS handling or datum shifts.

// External dependencies
use num_traits::Float;

/// WGS84 semi-major axis (m).
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const MAX_INVERSE_ITERATIONS: usize = 20;

// ============================================================================
// Projection
// ============================================================================

/// Parameters of an ellipsoidal polar stereographic projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarStereographic {
    /// Latitude of true scale (degrees); its sign selects the pole.
    pub latitude_of_true_scale: f64,
    /// Central meridian (degrees).
    pub central_meridian: f64,
    /// Ellipsoid semi-major axis (m).
    pub semi_major_axis: f64,
    /// Ellipsoid flattening.
    pub flattening: f64,
}

impl PolarStereographic {
    /// Antarctic Polar Stereographic (EPSG:3031).
    pub const ANTARCTIC: Self = Self {
        latitude_of_true_scale: -71.0,
        central_meridian: 0.0,
        semi_major_axis: WGS84_A,
        flattening: WGS84_F,
    };

    /// NSIDC Sea Ice Polar Stereographic North (EPSG:3413).
    pub const GREENLAND: Self = Self {
        latitude_of_true_scale: 70.0,
        central_meridian: -45.0,
        semi_major_axis: WGS84_A,
        flattening: WGS84_F,
    };
}

/// Planar coordinate system of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Projection {
    /// Coordinates are already planar; `forward` and `inverse` pass them through.
    #[default]
    Identity,
    /// Ellipsoidal polar stereographic.
    PolarStereographic(PolarStereographic),
}

impl Projection {
    /// Antarctic Polar Stereographic (EPSG:3031).
    pub const EPSG_3031: Self = Self::PolarStereographic(PolarStereographic::ANTARCTIC);

    /// NSIDC Sea Ice Polar Stereographic North (EPSG:3413).
    pub const EPSG_3413: Self = Self::PolarStereographic(PolarStereographic::GREENLAND);

    /// Look up a preset by EPSG code.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            3031 => Some(Self::EPSG_3031),
            3413 => Some(Self::EPSG_3413),
            _ => None,
        }
    }

    /// Project `(lon, lat)` in degrees to planar `(x, y)` in meters.
    pub fn forward<T: Float>(&self, lon: T, lat: T) -> (T, T) {
        match self {
            Self::Identity => (lon, lat),
            Self::PolarStereographic(p) => p.forward(lon, lat),
        }
    }

    /// Convert planar `(x, y)` in meters back to `(lon, lat)` in degrees.
    pub fn inverse<T: Float>(&self, x: T, y: T) -> (T, T) {
        match self {
            Self::Identity => (x, y),
            Self::PolarStereographic(p) => p.inverse(x, y),
        }
    }
}

// ============================================================================
// Polar Stereographic Formulas
// ============================================================================

struct Constants<T> {
    e: T,
    sign: T,
    lon0: T,
    /// ρ = rho_factor · t(φ)
    rho_factor: T,
}

impl PolarStereographic {
    fn constants<T: Float>(&self) -> Constants<T> {
        let c = |v: f64| T::from(v).unwrap();
        let one = T::one();
        let two = c(2.0);

        let a = c(self.semi_major_axis);
        let f = c(self.flattening);
        let e = (two * f - f * f).sqrt();
        let sign = if self.latitude_of_true_scale < 0.0 {
            -one
        } else {
            one
        };
        let lat_c = (sign * c(self.latitude_of_true_scale)).to_radians();
        let lon0 = sign * c(self.central_meridian).to_radians();

        let rho_factor = if (lat_c - c(90.0).to_radians()).abs() < c(1e-10) {
            two * a / (((one + e).powf(one + e)) * ((one - e).powf(one - e))).sqrt()
        } else {
            let m_c = lat_c.cos() / (one - e * e * lat_c.sin() * lat_c.sin()).sqrt();
            a * m_c / conformal_t(lat_c, e)
        };

        Constants {
            e,
            sign,
            lon0,
            rho_factor,
        }
    }

    /// Project `(lon, lat)` in degrees to planar `(x, y)` in meters.
    pub fn forward<T: Float>(&self, lon: T, lat: T) -> (T, T) {
        let k = self.constants::<T>();
        let phi = (k.sign * lat).to_radians();
        let lam = (k.sign * lon).to_radians();

        let rho = k.rho_factor * conformal_t(phi, k.e);
        let x = rho * (lam - k.lon0).sin();
        let y = -rho * (lam - k.lon0).cos();

        (k.sign * x, k.sign * y)
    }

    /// Convert planar `(x, y)` in meters back to `(lon, lat)` in degrees.
    pub fn inverse<T: Float>(&self, x: T, y: T) -> (T, T) {
        let k = self.constants::<T>();
        let one = T::one();
        let two = T::from(2.0).unwrap();
        let half_pi = T::from(core::f64::consts::FRAC_PI_2).unwrap();
        let tol = T::from(1e-12).unwrap();

        let xs = k.sign * x;
        let ys = k.sign * y;
        let rho = (xs * xs + ys * ys).sqrt();
        let t = rho / k.rho_factor;

        let mut phi = half_pi - two * t.atan();
        let half_e = k.e / two;
        for _ in 0..MAX_INVERSE_ITERATIONS {
            let es = k.e * phi.sin();
            let next = half_pi - two * (t * ((one - es) / (one + es)).powf(half_e)).atan();
            let delta = (next - phi).abs();
            phi = next;
            if delta < tol {
                break;
            }
        }

        let lam = if rho == T::zero() {
            k.lon0
        } else {
            k.lon0 + xs.atan2(-ys)
        };

        let mut lon = k.sign * lam.to_degrees();
        let full = T::from(360.0).unwrap();
        let half = T::from(180.0).unwrap();
        if lon > half {
            lon = lon - full;
        } else if lon < -half {
            lon = lon + full;
        }

        (lon, k.sign * phi.to_degrees())
    }
}

/// Snyder's `t(φ) = tan(π/4 − φ/2) / ((1 − e·sinφ)/(1 + e·sinφ))^(e/2)`.
fn conformal_t<T: Float>(phi: T, e: T) -> T {
    let one = T::one();
    let two = T::from(2.0).unwrap();
    let quarter_pi = T::from(core::f64::consts::FRAC_PI_4).unwrap();
    let es = e * phi.sin();
    (quarter_pi - phi / two).tan() / ((one - es) / (one + es)).powf(e / two)
}
