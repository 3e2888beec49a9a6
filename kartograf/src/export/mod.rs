//! Eksport siatek arkuszy

pub mod geojson;
