//! Eksport siatki arkuszy do GeoJSON (streaming z geozero)
//!
//! Każdy arkusz staje się Feature z prostokątem zasięgu i właściwościami
//! godła. Plik pisany jest strumieniowo, więc duże siatki (np. pełne
//! rozwinięcie do 1:10000) nie budują dokumentu w pamięci.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use godlo::{BBox, Crs, Godlo};

/// Eksportuje arkusze z zasięgami jako FeatureCollection
pub fn export_grid(sheets: &[(Godlo, BBox)], crs: Crs, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    // Nagłówek FeatureCollection z CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        crs.epsg()
    )?;

    for (i, (arkusz, bbox)) in sheets.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_sheet_feature(&mut writer, arkusz, bbox)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

/// Zapisuje jeden arkusz jako Feature
fn write_sheet_feature<W: Write>(writer: &mut W, arkusz: &Godlo, bbox: &BBox) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(arkusz.godlo())
    )?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    Geometry::Polygon(bbox.to_polygon()).process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(
        writer,
        r#","properties":{{"godlo":"{}","skala":"{}","uklad":"{}"}}}}"#,
        escape_json(arkusz.godlo()),
        arkusz.scale(),
        arkusz.uklad()
    )?;

    Ok(())
}

/// Escapuje łańcuch do JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
