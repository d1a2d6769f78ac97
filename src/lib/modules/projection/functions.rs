use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::constants::{EARTH_RADIUS_KM, RADOLAN_LAMBDA0, RADOLAN_PHI0};
use crate::errors::RadprocError;

/// Projects geographic coordinates [°] to the RADOLAN polar stereographic
/// plane [km]
pub fn coordinates_degree_to_stereographic(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let phi = lat_deg.to_radians();
    let lambda = lon_deg.to_radians();
    let phi0 = RADOLAN_PHI0.to_radians();
    let lambda0 = RADOLAN_LAMBDA0.to_radians();

    let m = (1.0 + phi0.sin()) / (1.0 + phi.sin());
    let x = EARTH_RADIUS_KM * m * phi.cos() * (lambda - lambda0).sin();
    let y = -EARTH_RADIUS_KM * m * phi.cos() * (lambda - lambda0).cos();
    (x, y)
}

/// Writes one ID per line
pub fn save_idarray_to_txt(ids: &[i32], path: &Path) -> Result<(), RadprocError> {
    let file = fs::File::create(path)
        .map_err(|err| format!("cannot create {}: {}", path.display(), err))?;
    let mut writer = BufWriter::new(file);
    for id in ids {
        writeln!(writer, "{id}")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn import_idarray_from_txt(path: &Path) -> Result<Vec<i32>, RadprocError> {
    let content = fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            line.trim().parse::<i32>().map_err(|_| {
                RadprocError::from(format!(
                    "invalid ID '{}' at line {} of {}",
                    line,
                    n + 1,
                    path.display()
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_meridian_is_vertical() {
        let (x, y) = coordinates_degree_to_stereographic(10.0, 60.0);
        assert!(x.abs() < 1e-9);
        assert!((y + 6370.04 * 60f64.to_radians().cos()).abs() < 1e-6);

        let (x, _) = coordinates_degree_to_stereographic(12.0, 51.0);
        assert!(x > 0.0);
    }

    #[test]
    fn radolan_grid_corner() {
        // lower left corner of the 900 x 900 km RADOLAN grid
        let (x, y) = coordinates_degree_to_stereographic(3.5889, 46.9526);
        assert!((x + 523.46).abs() < 0.5);
        assert!((y + 4658.64).abs() < 0.5);
    }

    #[test]
    fn idarray_roundtrip_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        save_idarray_to_txt(&[1, 42, 810000], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n42\n810000\n");
        assert_eq!(import_idarray_from_txt(&path).unwrap(), vec![1, 42, 810000]);

        fs::write(&path, "1\nx\n").unwrap();
        let err = import_idarray_from_txt(&path).unwrap_err();
        assert!(err.message().contains("line 2"));
    }
}
