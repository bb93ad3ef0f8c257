// Gauss-Krüger -> geographic coordinates, good enough to pick a weather
// grid cell. No datum shift is applied, so results are on the Bessel
// ellipsoid (off by ~100m from WGS84).

const BESSEL_A: f64 = 6377397.155;
const BESSEL_F: f64 = 1.0 / 299.1528128;

/// Used when a stop has no coordinate.
pub const DRESDEN_CENTER: (f64, f64) = (51.05, 13.74);

/// Inverse Gauss-Krüger projection. The zone is taken from the leading
/// digit of the easting (e.g. 4621157 -> zone 4, central meridian 12°E).
/// Returns (latitude, longitude) in degrees.
pub fn gk_to_wgs84(easting: f64, northing: f64) -> (f64, f64) {
    let a = BESSEL_A;
    let b = a * (1.0 - BESSEL_F);
    let n = (a - b) / (a + b);
    let e2 = (a * a - b * b) / (a * a);
    let ep2 = (a * a - b * b) / (b * b);

    let zone = (easting / 1_000_000.0).floor();
    let lambda0 = (zone * 3.0).to_radians();
    let y = easting - (zone * 1_000_000.0 + 500_000.0);

    // Footpoint latitude.
    let alpha = (a + b) / 2.0 * (1.0 + n.powi(2) / 4.0 + n.powi(4) / 64.0);
    let beta = 3.0 * n / 2.0 - 27.0 * n.powi(3) / 32.0;
    let gamma = 21.0 * n.powi(2) / 16.0 - 55.0 * n.powi(4) / 32.0;
    let delta = 151.0 * n.powi(3) / 96.0;
    let epsilon = 1097.0 * n.powi(4) / 512.0;
    let yy = northing / alpha;
    let phi_f = yy
        + beta * (2.0 * yy).sin()
        + gamma * (4.0 * yy).sin()
        + delta * (6.0 * yy).sin()
        + epsilon * (8.0 * yy).sin();

    let t = phi_f.tan();
    let t2 = t * t;
    let eta2 = ep2 * phi_f.cos().powi(2);
    let nf = a / (1.0 - e2 * phi_f.sin().powi(2)).sqrt();
    let cos_f = phi_f.cos();

    let phi = phi_f
        + t / (2.0 * nf.powi(2)) * (-1.0 - eta2) * y.powi(2)
        + t / (24.0 * nf.powi(4)) * (5.0 + 3.0 * t2 + 6.0 * eta2 - 6.0 * t2 * eta2) * y.powi(4);
    let lambda = lambda0
        + y / (nf * cos_f)
        + (-1.0 - 2.0 * t2 - eta2) * y.powi(3) / (6.0 * nf.powi(3) * cos_f)
        + (5.0 + 28.0 * t2 + 24.0 * t2 * t2) * y.powi(5) / (120.0 * nf.powi(5) * cos_f);

    return (phi.to_degrees(), lambda.to_degrees());
}

pub fn project_or_default(coordinate: Option<(f64, f64)>) -> (f64, f64) {
    return match coordinate {
        Some((easting, northing)) => gk_to_wgs84(easting, northing),
        None => DRESDEN_CENTER,
    };
}
