//! Transverse Mercator projection using the Krüger n-series.
//!
//! Fourth-order series in the third flattening `n` (Krüger 1912, as
//! restated by Karney 2011). Both directions are accurate to well below a
//! millimetre within the few degrees of longitude the Finnish and UTM zones
//! span. Going grid to grid through geographic coordinates and back drifts
//! by a few micrometres, not floating-point epsilon.

use geo::Coord;

/// Reference ellipsoid, described by its semi-major axis and flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres.
    pub a: f64,
    /// Flattening.
    pub f: f64,
}

/// GRS80, the ellipsoid of ETRS89 (EPSG:3067 and the ETRS-GK zones).
pub const GRS80: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    f: 1.0 / 298.257_222_101,
};

/// WGS84, the ellipsoid of the UTM zones.
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    f: 1.0 / 298.257_223_563,
};

/// Parameters of one transverse Mercator projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Central meridian in degrees.
    pub central_meridian: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

/// Multipliers `2j` of the four series terms.
const HARMONICS: [f64; 4] = [2.0, 4.0, 6.0, 8.0];

/// Series coefficients derived from an ellipsoid.
struct Series {
    /// Rectifying radius `A`.
    radius: f64,
    /// First eccentricity.
    e: f64,
    alpha: [f64; 4],
    beta: [f64; 4],
    delta: [f64; 4],
}

impl Series {
    fn new(ellipsoid: Ellipsoid) -> Self {
        let f = ellipsoid.f;
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;

        Self {
            radius: ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0),
            e: (f * (2.0 - f)).sqrt(),
            alpha: [
                n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4,
                13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4,
                61.0 / 240.0 * n3 - 103.0 / 140.0 * n4,
                49561.0 / 161_280.0 * n4,
            ],
            beta: [
                n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4,
                1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4,
                17.0 / 480.0 * n3 - 37.0 / 840.0 * n4,
                4397.0 / 161_280.0 * n4,
            ],
            delta: [
                2.0 * n - 2.0 / 3.0 * n2 - 2.0 * n3 + 116.0 / 45.0 * n4,
                7.0 / 3.0 * n2 - 8.0 / 5.0 * n3 - 227.0 / 45.0 * n4,
                56.0 / 15.0 * n3 - 136.0 / 35.0 * n4,
                4279.0 / 630.0 * n4,
            ],
        }
    }
}

impl TransverseMercator {
    /// Projects geographic degrees (`x` = longitude, `y` = latitude) to
    /// easting/northing in metres.
    #[must_use]
    pub fn project(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        let series = Series::new(self.ellipsoid);
        let lat = lon_lat.y.to_radians();
        let dlon = (lon_lat.x - self.central_meridian).to_radians();

        let sin_lat = lat.sin();
        let t = (sin_lat.atanh() - series.e * (series.e * sin_lat).atanh()).sinh();
        let xi_prime = t.atan2(dlon.cos());
        let eta_prime = (dlon.sin() / t.hypot(1.0)).atanh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (alpha, k) in series.alpha.iter().zip(HARMONICS) {
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let scaled = self.scale_factor * series.radius;
        Coord {
            x: self.false_easting + scaled * eta,
            y: self.false_northing + scaled * xi,
        }
    }

    /// Inverse of [`Self::project`]: easting/northing in metres back to
    /// longitude/latitude degrees.
    #[must_use]
    pub fn unproject(&self, easting_northing: Coord<f64>) -> Coord<f64> {
        let series = Series::new(self.ellipsoid);
        let scaled = self.scale_factor * series.radius;
        let xi = (easting_northing.y - self.false_northing) / scaled;
        let eta = (easting_northing.x - self.false_easting) / scaled;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (beta, k) in series.beta.iter().zip(HARMONICS) {
            xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_prime.sin() / eta_prime.cosh()).asin();
        let mut lat = chi;
        for (delta, k) in series.delta.iter().zip(HARMONICS) {
            lat += delta * (k * chi).sin();
        }
        let dlon = eta_prime.sinh().atan2(xi_prime.cos());

        Coord {
            x: self.central_meridian + dlon.to_degrees(),
            y: lat.to_degrees(),
        }
    }
}
