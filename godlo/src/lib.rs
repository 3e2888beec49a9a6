//! # godlo
//!
//! Parser godeł polskich map topograficznych (układy 1992 i 2000).
//!
//! ## Features
//!
//! - Parsowanie godeł we wszystkich siedmiu skalach, od 1:1 000 000 do 1:10 000
//! - Nawigacja po hierarchii arkuszy: rodzic, dzieci, przodkowie, potomkowie
//! - Obliczanie zasięgu arkusza w WGS84 (EPSG:4326) i PL-1992 (EPSG:2180)
//! - Czyste wartości bez stanu współdzielonego, bezpieczne między wątkami
//!
//! ## Usage
//!
//! ```rust
//! use godlo::{Crs, Scale};
//!
//! let arkusz = godlo::parse("n-34-130-d-D-2-4")?;
//! assert_eq!(arkusz.godlo(), "N-34-130-D-d-2-4");
//! assert_eq!(arkusz.scale(), Scale::S10k);
//!
//! let bbox = arkusz.bbox(Crs::Epsg4326);
//! assert!(bbox.min_x < bbox.max_x);
//!
//! let rodzic = arkusz.parent()?;
//! assert!(rodzic.is_some());
//! # Ok::<(), godlo::GodloError>(())
//! ```

pub mod bbox;
pub mod error;
pub mod godlo;
pub mod reproject;
pub mod types;

pub use error::GodloError;
pub use godlo::Godlo;
pub use types::{Arkusz200k, BBox, Components, Crs, Scale, Uklad};

/// Parsuje godło arkusza w domyślnym układzie 1992.
///
/// # Errors
///
/// Zwraca `GodloError` gdy godło jest puste lub nie pasuje do żadnego
/// wzorca skali.
pub fn parse(code: &str) -> Result<Godlo, GodloError> {
    Godlo::parse(code)
}

/// Parsuje godło arkusza w podanym układzie współrzędnych.
pub fn parse_with_uklad(code: &str, uklad: Uklad) -> Result<Godlo, GodloError> {
    Godlo::parse_with_uklad(code, uklad)
}
