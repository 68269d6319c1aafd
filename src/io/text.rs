//! Plain-text point interchange: one whitespace-separated `x y z`
//! triple per line.

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::map::PointCloud;

/// Save a point cloud to a text file.
pub fn save_points_text(cloud: &PointCloud, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_points(cloud, &mut BufWriter::new(file))
}

/// Write a point cloud to a writer in text format.
pub fn write_points<W: Write>(cloud: &PointCloud, writer: &mut W) -> Result<()> {
    for p in cloud.points() {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    Ok(())
}

/// Load a point cloud from a text file.
pub fn load_points_text(path: &Path) -> Result<PointCloud> {
    let file = std::fs::File::open(path)?;
    read_points(&mut BufReader::new(file))
}

/// Read a point cloud from a reader in text format.
///
/// Empty lines are skipped; any other line must hold exactly three
/// numbers.
pub fn read_points<R: Read>(reader: &mut R) -> Result<PointCloud> {
    let mut cloud = PointCloud::new();
    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(Error::Format(format!(
                "line {}: expected 3 values, found {}",
                number + 1,
                fields.len()
            )));
        }
        let mut coords = [0.0f64; 3];
        for (coord, field) in coords.iter_mut().zip(&fields) {
            *coord = field.parse().map_err(|_| {
                Error::Format(format!("line {}: invalid number \"{}\"", number + 1, field))
            })?;
        }
        cloud.push(Point3::new(coords[0], coords[1], coords[2]));
    }
    Ok(cloud)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cloud = PointCloud::from_points(vec![
            Point3::new(0.5, -1.25, 3.0),
            Point3::new(1e-3, 2.0, -0.75),
        ]);

        let mut buffer = Vec::new();
        write_points(&cloud, &mut buffer).unwrap();
        let restored = read_points(&mut buffer.as_slice()).unwrap();

        assert_eq!(restored.len(), 2);
        for (a, b) in cloud.points().iter().zip(restored.points()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = "1 2 3\n\n  \n4 5 6\n";
        let cloud = read_points(&mut text.as_bytes()).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.points()[1], Point3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_malformed_line_reported() {
        let text = "1 2 3\n4 5\n";
        let err = read_points(&mut text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("line 2"));

        let text = "1 2 x\n";
        assert!(matches!(
            read_points(&mut text.as_bytes()),
            Err(Error::Format(_))
        ));
    }
}
