//! Typy danych dla crate'a godlo

use std::fmt;
use std::str::FromStr;

use geo::{Coord, LineString, Polygon, Rect};

use crate::error::GodloError;

/// Skala mapy, od najmniej do najbardziej szczegółowej
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scale {
    /// 1:1 000 000 (arkusz 4° × 6°)
    S1M,
    /// 1:500 000
    S500k,
    /// 1:200 000 (20' × 30', 36 arkuszy na jeden 1:500k)
    S200k,
    /// 1:100 000
    S100k,
    /// 1:50 000
    S50k,
    /// 1:25 000
    S25k,
    /// 1:10 000
    S10k,
}

impl Scale {
    /// Hierarchia skal w kolejności od najgrubszej do najdrobniejszej
    pub const HIERARCHY: [Scale; 7] = [
        Scale::S1M,
        Scale::S500k,
        Scale::S200k,
        Scale::S100k,
        Scale::S50k,
        Scale::S25k,
        Scale::S10k,
    ];

    /// Indeks skali w hierarchii (0 = 1:1M, 6 = 1:10k)
    pub fn index(self) -> usize {
        match self {
            Scale::S1M => 0,
            Scale::S500k => 1,
            Scale::S200k => 2,
            Scale::S100k => 3,
            Scale::S50k => 4,
            Scale::S25k => 5,
            Scale::S10k => 6,
        }
    }

    /// Reprezentacja tekstowa, np. "1:100000"
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::S1M => "1:1000000",
            Scale::S500k => "1:500000",
            Scale::S200k => "1:200000",
            Scale::S100k => "1:100000",
            Scale::S50k => "1:50000",
            Scale::S25k => "1:25000",
            Scale::S10k => "1:10000",
        }
    }

    /// Czy skala jest drobniejsza (bardziej szczegółowa) niż `other`
    pub fn is_finer_than(self, other: Scale) -> bool {
        self.index() > other.index()
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = GodloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::HIERARCHY
            .iter()
            .copied()
            .find(|scale| scale.as_str() == s)
            .ok_or_else(|| GodloError::InvalidScale(s.to_string()))
    }
}

/// Układ współrzędnych płaskich, w którym interpretowane jest godło
///
/// Wartość jest metadaną arkusza: nie wpływa na parsowanie ani na obliczanie
/// zasięgu, wchodzi natomiast do porównywania godeł.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Uklad {
    /// PL-1992 (jedna strefa, EPSG:2180)
    #[default]
    U1992,
    /// PL-2000 (strefy południkowe)
    U2000,
}

impl Uklad {
    pub fn as_str(self) -> &'static str {
        match self {
            Uklad::U1992 => "1992",
            Uklad::U2000 => "2000",
        }
    }
}

impl fmt::Display for Uklad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Uklad {
    type Err = GodloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1992" => Ok(Uklad::U1992),
            "2000" => Ok(Uklad::U2000),
            other => Err(GodloError::InvalidUklad(other.to_string())),
        }
    }
}

/// Trzecia składowa godła: litera działu 1:500k albo numer arkusza 1:200k
///
/// W notacji źródłowej to samo pole niesie dwa znaczenia zależnie od skali.
/// Rozstrzygamy je raz, przy parsowaniu, zamiast ponownie badać kształt
/// tekstu w każdym miejscu użycia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arkusz200k {
    /// Litera A-D działu 1:500k
    Litera(char),
    /// Numer 1-144 arkusza 1:200k w siatce 12×12 arkusza 1:1M
    Numer(u16),
}

impl fmt::Display for Arkusz200k {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arkusz200k::Litera(c) => write!(f, "{c}"),
            Arkusz200k::Numer(n) => write!(f, "{n}"),
        }
    }
}

/// Składowe godła wyodrębnione z dopasowanego wzorca
///
/// Pola drobniejsze niż skala arkusza są zawsze `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Components {
    /// Pas (wiersz siatki 1:1M): litera A-Z
    pub pas: char,
    /// Słup (kolumna siatki 1:1M)
    pub slup: u8,
    /// Dział 1:500k (litera) albo numer arkusza 1:200k
    pub arkusz_200k: Option<Arkusz200k>,
    /// Ćwiartka 1:100k: A-D
    pub arkusz_100k: Option<char>,
    /// Ćwiartka 1:50k: a-d
    pub arkusz_50k: Option<char>,
    /// Ćwiartka 1:25k: 1-4
    pub arkusz_25k: Option<u8>,
    /// Ćwiartka 1:10k: 1-4
    pub arkusz_10k: Option<u8>,
}

impl Components {
    /// Pary (nazwa, wartość) w kolejności składowych, do wyświetlania
    pub fn as_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pas", self.pas.to_string()),
            ("slup", self.slup.to_string()),
        ];
        if let Some(a) = self.arkusz_200k {
            pairs.push(("arkusz_200k", a.to_string()));
        }
        if let Some(c) = self.arkusz_100k {
            pairs.push(("arkusz_100k", c.to_string()));
        }
        if let Some(c) = self.arkusz_50k {
            pairs.push(("arkusz_50k", c.to_string()));
        }
        if let Some(n) = self.arkusz_25k {
            pairs.push(("arkusz_25k", n.to_string()));
        }
        if let Some(n) = self.arkusz_10k {
            pairs.push(("arkusz_10k", n.to_string()));
        }
        pairs
    }
}

/// Układ odniesienia, w którym wyrażony jest bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// WGS84, współrzędne geograficzne w stopniach
    Epsg4326,
    /// PL-1992, współrzędne płaskie w metrach
    Epsg2180,
}

impl Crs {
    pub fn as_str(self) -> &'static str {
        match self {
            Crs::Epsg4326 => "EPSG:4326",
            Crs::Epsg2180 => "EPSG:2180",
        }
    }

    /// Kod EPSG
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Epsg4326 => 4326,
            Crs::Epsg2180 => 2180,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crs {
    type Err = GodloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EPSG:4326" => Ok(Crs::Epsg4326),
            "EPSG:2180" => Ok(Crs::Epsg2180),
            other => Err(GodloError::InvalidCrs(other.to_string())),
        }
    }
}

/// Bounding box arkusza w zadanym układzie odniesienia
///
/// Niezmiennik: `min_x <= max_x` oraz `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub crs: Crs,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64, crs: Crs) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Środek prostokąta (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Czy `other` zawiera się w tym prostokącie (nieściśle)
    pub fn contains(&self, other: &BBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Konwersja do `geo::Rect`
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }

    /// Zamknięty pierścień prostokąta jako `geo::Polygon` (CCW od SW)
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}
