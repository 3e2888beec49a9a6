//! Typy błędów dla crate'a godlo

use thiserror::Error;

use crate::types::Scale;

/// Błędy zgłaszane przy parsowaniu i nawigacji po godłach
#[derive(Debug, Error)]
pub enum GodloError {
    /// Puste godło (lub same białe znaki)
    #[error("Godlo must not be empty")]
    Empty,

    /// Godło nie pasuje do żadnego wzorca skali
    #[error("Invalid godlo: '{0}'")]
    InvalidGodlo(String),

    /// Składowa godła poza dozwolonym zakresem
    #[error("Invalid godlo component in '{godlo}': {reason}")]
    InvalidComponent { godlo: String, reason: String },

    /// Nieznany układ współrzędnych
    #[error("Invalid uklad: '{0}'. Supported: 1992, 2000")]
    InvalidUklad(String),

    /// Nieznana skala
    #[error("Invalid scale: '{0}'. Supported: 1:1000000 .. 1:10000")]
    InvalidScale(String),

    /// Nieznany docelowy układ odniesienia
    #[error("Unsupported CRS: '{0}'. Supported: EPSG:4326, EPSG:2180")]
    InvalidCrs(String),

    /// Skala docelowa nie jest drobniejsza od bieżącej
    #[error("Target scale {target} must be finer than current {current}")]
    ScaleNotFiner { current: Scale, target: Scale },
}

impl GodloError {
    /// Tworzy błąd składowej z kontekstem
    pub fn invalid_component(godlo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidComponent {
            godlo: godlo.into(),
            reason: reason.into(),
        }
    }
}
