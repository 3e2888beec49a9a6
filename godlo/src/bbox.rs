//! Obliczanie zasięgu arkusza z godła
//!
//! Zasięg w WGS84 powstaje przez odtworzenie kolejnych podziałów arkusza
//! 1:1M (4° szerokości × 6° długości): podział 2×2 dla działów literowych
//! i siatka 12×12 dla numerowanych arkuszy 1:200k. Zasięg w PL-1992 to
//! obwiednia czterech przetransformowanych narożników.

use crate::reproject;
use crate::types::{Arkusz200k, BBox, Crs};
use crate::Godlo;

/// Pozycja symbolu w siatce 2×2 jako (wiersz, kolumna), 0-indeksowana.
///
/// Początek w narożniku północno-zachodnim: wiersz rośnie na południe.
/// A/a/1 = NW, B/b/2 = NE, C/c/3 = SW, D/d/4 = SE.
pub(crate) fn quadrant_position(symbol: char) -> Option<(u8, u8)> {
    match symbol {
        'A' | 'a' | '1' => Some((0, 0)),
        'B' | 'b' | '2' => Some((0, 1)),
        'C' | 'c' | '3' => Some((1, 0)),
        'D' | 'd' | '4' => Some((1, 1)),
        _ => None,
    }
}

/// Granice geograficzne w stopniach: (południe, północ, zachód, wschód)
type Bounds = (f64, f64, f64, f64);

/// Połowi granice, wybierając ćwiartkę (wiersz, kolumna) siatki 2×2.
fn bisect(bounds: Bounds, row: u8, col: u8) -> Bounds {
    let (south, north, west, east) = bounds;
    let height = (north - south) / 2.0;
    let width = (east - west) / 2.0;
    let new_north = north - f64::from(row) * height;
    let new_west = west + f64::from(col) * width;
    (new_north - height, new_north, new_west, new_west + width)
}

impl Godlo {
    /// Oblicza bounding box arkusza w zadanym układzie odniesienia.
    pub fn bbox(&self, crs: Crs) -> BBox {
        let (south, north, west, east) = self.bbox_wgs84();

        match crs {
            Crs::Epsg4326 => BBox::new(west, south, east, north, Crs::Epsg4326),
            Crs::Epsg2180 => {
                // Obwiednia czterech narożników: obrót między układami
                // sprawia, że transformacja dwóch przeciwległych narożników
                // dawałaby prostokąt za mały.
                let corners = [
                    (west, south),
                    (west, north),
                    (east, south),
                    (east, north),
                ];

                let mut min_x = f64::INFINITY;
                let mut min_y = f64::INFINITY;
                let mut max_x = f64::NEG_INFINITY;
                let mut max_y = f64::NEG_INFINITY;

                for (lon, lat) in corners {
                    let (x, y) = reproject::wgs84_to_puwg1992(lon, lat);
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }

                BBox::new(min_x, min_y, max_x, max_y, Crs::Epsg2180)
            }
        }
    }

    /// Zasięg arkusza w WGS84: (południe, północ, zachód, wschód) w stopniach.
    fn bbox_wgs84(&self) -> Bounds {
        let c = self.components();

        // Arkusz bazowy 1:1M: pas A zaczyna się na równiku (4° na pas),
        // słup 31 na południku 0°E (6° na słup).
        let row_1m = f64::from(c.pas as u32 - 'A' as u32);
        let south = row_1m * 4.0;
        let west = (f64::from(c.slup) - 31.0) * 6.0;
        let mut bounds = (south, south + 4.0, west, west + 6.0);

        // Rozstrzyganie po kształcie wartości, nie po skali: litera oznacza
        // pojedynczy podział 2×2, numer pozycję w siatce 12×12.
        match c.arkusz_200k {
            None => return bounds,
            Some(Arkusz200k::Litera(litera)) => {
                if let Some((row, col)) = quadrant_position(litera) {
                    bounds = bisect(bounds, row, col);
                }
            }
            Some(Arkusz200k::Numer(numer)) => {
                let (south, north, west, east) = bounds;
                let row = f64::from((numer - 1) / 12);
                let col = f64::from((numer - 1) % 12);
                let height = (north - south) / 12.0; // 20'
                let width = (east - west) / 12.0; // 30'
                let new_north = north - row * height;
                let new_west = west + col * width;
                bounds = (new_north - height, new_north, new_west, new_west + width);
            }
        }

        let finer = [
            c.arkusz_100k,
            c.arkusz_50k,
            c.arkusz_25k.map(digit_symbol),
            c.arkusz_10k.map(digit_symbol),
        ];

        for symbol in finer.into_iter().flatten() {
            if let Some((row, col)) = quadrant_position(symbol) {
                bounds = bisect(bounds, row, col);
            }
        }

        bounds
    }
}

fn digit_symbol(n: u8) -> char {
    (b'0' + n) as char
}
