//! Odwzorowanie poprzeczne Mercatora (Gaussa-Krügera)
//!
//! Parametryzowane stałymi strefy, z prekonfigurowanym układem PL-1992
//! (EPSG:2180): południk osiowy 19°E, skala 0.9993, przesunięcia
//! +500 km / -5300 km.

use super::ellipsoid::GRS80;
use super::Geographic;

/// Stałe strefy odwzorowania poprzecznego Mercatora
#[derive(Debug, Clone, Copy)]
pub struct TmParams {
    /// Południk osiowy w stopniach
    pub lon0_deg: f64,
    /// Skala na południku osiowym
    pub k0: f64,
    /// False easting w metrach
    pub false_easting: f64,
    /// False northing w metrach
    pub false_northing: f64,
}

/// Układ PL-1992 (EPSG:2180), jedna strefa dla całej Polski
pub const PUWG_1992: TmParams = TmParams {
    lon0_deg: 19.0,
    k0: 0.9993,
    false_easting: 500_000.0,
    false_northing: -5_300_000.0,
};

/// Długość łuku południka od równika do szerokości `phi` (radiany)
fn meridian_arc(phi: f64) -> f64 {
    let e2 = GRS80::E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    GRS80::A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Konwertuje współrzędne geograficzne na płaskie (x = easting, y = northing)
pub fn geographic_to_tm(geo: Geographic, params: &TmParams) -> (f64, f64) {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    let lon0 = params.lon0_deg.to_radians();
    let phi = geo.lat;

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
    let t = tan_phi.powi(2);
    let c = ep2 * cos_phi.powi(2);
    let aa = (geo.lon - lon0) * cos_phi;
    let m = meridian_arc(phi);

    let x = params.false_easting
        + params.k0
            * n
            * (aa
                + (1.0 - t + c) * aa.powi(3) / 6.0
                + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0);

    let y = params.false_northing
        + params.k0
            * (m + n
                * tan_phi
                * (aa.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * aa.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * aa.powi(6)
                        / 720.0));

    (x, y)
}

/// Konwertuje współrzędne płaskie na geograficzne
pub fn tm_to_geographic(x: f64, y: f64, params: &TmParams) -> Geographic {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    let lon0 = params.lon0_deg.to_radians();

    // Współrzędne zredukowane
    let x = x - params.false_easting;
    let y = y - params.false_northing;

    // Szerokość przybliżona (footprint latitude)
    let m = y / params.k0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * params.k0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}
