use pointalign_core::PointCloud;
use std::fs;
use std::io;
use std::path::Path;

/// Reads a plain-text XYZ point set.
///
/// The format is a point count on the first line followed by one
/// whitespace-separated `x y z` triple per line. Extra tokens on a point
/// line are ignored; extra lines past the declared count are ignored.
pub fn read_xyz(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines();

    let header = lines
        .next()
        .ok_or_else(|| invalid("XYZ file is empty; expected a point count header"))?;
    let count: usize = header
        .trim()
        .parse()
        .map_err(|_| invalid(format!("invalid point count header: {:?}", header.trim())))?;

    let mut x = Vec::with_capacity(count);
    let mut y = Vec::with_capacity(count);
    let mut z = Vec::with_capacity(count);

    for i in 0..count {
        let line = lines.next().ok_or_else(|| {
            invalid(format!("expected {} points but file ends after {}", count, i))
        })?;
        let mut fields = line.split_whitespace();
        x.push(parse_coord(fields.next(), i, "x")?);
        y.push(parse_coord(fields.next(), i, "y")?);
        z.push(parse_coord(fields.next(), i, "z")?);
    }

    Ok(PointCloud::from_xyz(x, y, z))
}

/// Writes a point set in the plain-text XYZ format read by [`read_xyz`].
pub fn write_xyz(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let mut out = String::new();
    out.push_str(&format!("{}\n", cloud.len()));
    for i in 0..cloud.len() {
        out.push_str(&format!("{} {} {}\n", cloud.x[i], cloud.y[i], cloud.z[i]));
    }
    fs::write(path, out)
}

fn parse_coord(field: Option<&str>, line: usize, axis: &str) -> io::Result<f32> {
    let token =
        field.ok_or_else(|| invalid(format!("point {} is missing its {} value", line, axis)))?;
    token
        .parse()
        .map_err(|_| invalid(format!("point {} has a non-numeric {} value: {:?}", line, axis, token)))
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
