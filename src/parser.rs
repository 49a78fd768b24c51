//! ESRI ASCII grid (`.asc`) reader.
//!
//! RGE ALTI tiles start with six `<key> <value>` header lines followed by
//! `nrows` lines of `ncols` whitespace separated elevations, northernmost row
//! first:
//!
//! ```text
//! ncols        1000
//! nrows        1000
//! xllcorner    643999.500000
//! yllcorner    6857000.500000
//! cellsize     1.000000
//! NODATA_value  -99999.00
//!  35.41 35.40 35.39 ...
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, RgeAltiError};
use crate::model::{GridHeader, GridTile};

const HEADER_LINES: usize = 6;
const HEADER_KEYS: [&str; HEADER_LINES] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "cellsize",
    "nodata_value",
];

/// Parse a tile from disk.
pub fn parse_asc_file(path: &Path) -> Result<GridTile> {
    let file = File::open(path).map_err(|source| RgeAltiError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let tile = parse_asc(BufReader::new(file)).map_err(|err| match err {
        RgeAltiError::Io(source) => RgeAltiError::ReadFile {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;

    debug!(
        "Parsed {:?}: {}x{} cells, {} valid",
        path,
        tile.header.nrows,
        tile.header.ncols,
        tile.valid_count()
    );
    Ok(tile)
}

/// Parse a tile from any buffered reader.
pub fn parse_asc<R: BufRead>(mut reader: R) -> Result<GridTile> {
    let header = parse_header(&mut reader)?;

    let mut body = String::new();
    reader.read_to_string(&mut body).map_err(read_error)?;

    let expected = header.cell_count().ok_or_else(|| {
        RgeAltiError::InvalidHeader(format!(
            "{} rows x {} cols overflows the cell count",
            header.nrows, header.ncols
        ))
    })?;
    // every value takes at least two bytes with its separator
    let mut values = Vec::with_capacity(expected.min(body.len() / 2 + 1));
    for token in body.split_whitespace() {
        let value: f32 = token.parse().map_err(|_| {
            RgeAltiError::InvalidData(format!(
                "non-numeric value '{}' at cell {}",
                token,
                values.len()
            ))
        })?;
        if !value.is_finite() {
            return Err(RgeAltiError::InvalidData(format!(
                "non-finite value '{}' at cell {}",
                token,
                values.len()
            )));
        }
        values.push(value);
    }

    if values.len() != expected {
        return Err(RgeAltiError::InvalidData(format!(
            "expected {} values ({} rows x {} cols), found {}",
            expected,
            header.nrows,
            header.ncols,
            values.len()
        )));
    }

    Ok(GridTile::new(header, values))
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<GridHeader> {
    let mut fields: [Option<f64>; HEADER_LINES] = [None; HEADER_LINES];
    let mut line = String::new();

    for line_no in 1..=HEADER_LINES {
        line.clear();
        if reader.read_line(&mut line).map_err(read_error)? == 0 {
            return Err(RgeAltiError::InvalidHeader(format!(
                "expected {} header lines, found {}",
                HEADER_LINES,
                line_no - 1
            )));
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let [key, value] = parts[..] else {
            return Err(RgeAltiError::InvalidHeader(format!(
                "line {}: expected '<key> <value>', got '{}'",
                line_no,
                line.trim_end()
            )));
        };

        let key = key.to_ascii_lowercase();
        let slot = HEADER_KEYS
            .iter()
            .position(|&k| k == key)
            .ok_or_else(|| {
                RgeAltiError::InvalidHeader(format!("line {}: unknown key '{}'", line_no, key))
            })?;
        if fields[slot].is_some() {
            return Err(RgeAltiError::InvalidHeader(format!(
                "line {}: duplicate key '{}'",
                line_no, key
            )));
        }

        let value: f64 = value.parse().map_err(|_| {
            RgeAltiError::InvalidHeader(format!(
                "line {}: value '{}' for '{}' is not numeric",
                line_no, value, key
            ))
        })?;
        fields[slot] = Some(value);
    }

    // six distinct known keys were read, so every slot is filled
    let field = |i: usize| {
        fields[i].ok_or_else(|| {
            RgeAltiError::InvalidHeader(format!("missing key '{}'", HEADER_KEYS[i]))
        })
    };

    let cellsize = field(4)?;
    if !(cellsize > 0.0) {
        return Err(RgeAltiError::InvalidHeader(format!(
            "cellsize must be positive, got {}",
            cellsize
        )));
    }

    Ok(GridHeader {
        ncols: dimension("ncols", field(0)?)?,
        nrows: dimension("nrows", field(1)?)?,
        xllcorner: field(2)?,
        yllcorner: field(3)?,
        cellsize,
        nodata_value: field(5)?,
    })
}

/// Undecodable text is a format defect, not an I/O failure.
fn read_error(err: io::Error) -> RgeAltiError {
    if err.kind() == io::ErrorKind::InvalidData {
        RgeAltiError::InvalidData(format!("tile is not valid UTF-8: {}", err))
    } else {
        RgeAltiError::Io(err)
    }
}

fn dimension(key: &str, value: f64) -> Result<usize> {
    if value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(RgeAltiError::InvalidHeader(format!(
            "{} must be a positive integer, got {}",
            key, value
        )))
    }
}
