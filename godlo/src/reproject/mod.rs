//! Lekka reprojekcja w czystym Ruście (bez zależności zewnętrznych)
//!
//! Jedyna transformacja potrzebna przy obliczaniu zasięgów arkuszy to
//! WGS84 → PL-1992 (EPSG:2180). Różnica datum ETRS89/WGS84 jest pomijalna
//! przy dokładnościach siatki arkuszowej.

mod ellipsoid;
mod transverse;

pub use ellipsoid::GRS80;
pub use transverse::{geographic_to_tm, tm_to_geographic, TmParams, PUWG_1992};

/// Punkt we współrzędnych geograficznych (radiany)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Długość geograficzna w radianach
    pub lon: f64,
    /// Szerokość geograficzna w radianach
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Konwertuje na stopnie
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Tworzy ze stopni
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Transformuje punkt WGS84 (stopnie) na współrzędne PL-1992 (metry)
pub fn wgs84_to_puwg1992(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    geographic_to_tm(Geographic::from_degrees(lon_deg, lat_deg), &PUWG_1992)
}
