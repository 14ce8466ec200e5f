//! Binary PGM (P5) reading and writing, plus the `.meapoint` sidecar.

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{MeaPointError, PgmError};
use crate::geom::{Span, Spot};
use crate::grid::ops::full_span_for;
use crate::grid::{Grid, SizeHW};

/// Byte codes of the stretch mapping.
pub const U8_NULL: u8 = 0;
pub const U8_UNDER: u8 = 1;
pub const U8_DARK: u8 = 2;
pub const U8_LITE: u8 = 254;
pub const U8_OVER: u8 = 255;

/// Byte value for a real pixel relative to `span`:
///
/// * NaN (null) maps to 0
/// * below `span.min()` maps to 1 (under-exposed)
/// * `span.min()` maps to 2; values inside the span map linearly onto
///   [2, 255) and floor to at most 254
/// * at or above `span.max()` maps to 255 (over-exposed)
pub fn u8_pix_for(real_pix: f32, span: &Span) -> u8 {
    if !real_pix.is_finite() {
        return U8_NULL;
    }
    let value = real_pix as f64;
    if value < span.min() {
        U8_UNDER
    } else if value < span.max() {
        let u8_span = Span::new(U8_DARK as f64, U8_OVER as f64);
        let frac = span.fraction_at_value(value);
        u8_span.value_at_fraction(frac).floor() as u8
    } else {
        U8_OVER
    }
}

fn next_header_token<R: BufRead>(reader: &mut R) -> Result<String, PgmError> {
    let mut token = String::new();
    let mut in_comment = false;
    loop {
        let mut byte = [0u8; 1];
        let got = reader.read(&mut byte)?;
        if got == 0 {
            if token.is_empty() {
                return Err(PgmError::BadHeader("unexpected end of header".into()));
            }
            return Ok(token);
        }
        let ch = byte[0] as char;
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if ch == '#' {
            in_comment = true;
            continue;
        }
        if ch.is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            return Ok(token);
        }
        token.push(ch);
    }
}

/// Read a binary PGM file into a byte grid (`high` = image height, `wide`
/// = image width).
pub fn read_pgm(path: &Path) -> Result<Grid<u8>, PgmError> {
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);

    let magic = next_header_token(&mut reader)?;
    if magic != "P5" {
        return Err(PgmError::BadMagic(magic));
    }
    let parse = |token: String| -> Result<usize, PgmError> {
        token
            .parse::<usize>()
            .map_err(|_| PgmError::BadHeader(format!("bad numeric field '{token}'")))
    };
    let wide = parse(next_header_token(&mut reader)?)?;
    let high = parse(next_header_token(&mut reader)?)?;
    let max_val = parse(next_header_token(&mut reader)?)?;
    if max_val != 255 {
        return Err(PgmError::BadMaxValue(max_val as u32));
    }
    // the single whitespace byte after max-value was consumed by the
    // tokenizer; the payload follows immediately

    let expected = high * wide;
    let mut data = vec![0u8; expected];
    let mut got = 0usize;
    while got < expected {
        let read = reader.read(&mut data[got..])?;
        if read == 0 {
            return Err(PgmError::Truncated { expected, got });
        }
        got += read;
    }
    Ok(Grid::from_vec(SizeHW::new(high, wide), data))
}

/// Write a byte grid as binary PGM.
pub fn write_pgm(path: &Path, grid: &Grid<u8>) -> Result<(), PgmError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write!(writer, "P5\n{} {}\n255\n", grid.wide(), grid.high())?;
    writer.write_all(grid.as_slice())?;
    writer.flush()?;
    Ok(())
}

/// Write a float grid as PGM with its dynamic range stretched onto the
/// informative byte range (see [`u8_pix_for`]).
pub fn write_stretch_pgm(path: &Path, grid: &Grid<f32>) -> Result<(), PgmError> {
    let span = full_span_for(grid);
    let bytes: Vec<u8> = grid.iter().map(|&v| u8_pix_for(v, &span)).collect();
    write_pgm(path, &Grid::from_vec(grid.hw(), bytes))
}

/// Read a `.meapoint` sidecar: one expected center as "row col" decimals.
pub fn read_meapoint(path: &Path) -> Result<Spot, MeaPointError> {
    let text = std::fs::read_to_string(path)?;
    let mut fields = text.split_whitespace();
    let mut next_value = || -> Result<f64, MeaPointError> {
        let field = fields
            .next()
            .ok_or_else(|| MeaPointError::BadRecord("missing coordinate".into()))?;
        field
            .parse::<f64>()
            .map_err(|_| MeaPointError::BadRecord(format!("bad coordinate '{field}'")))
    };
    let row = next_value()?;
    let col = next_value()?;
    if !(row.is_finite() && col.is_finite()) {
        return Err(MeaPointError::BadRecord("non-finite coordinate".into()));
    }
    Ok(Spot::new(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SizeHW;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = tempfile::tempdir().unwrap();
        // keep the dir alive by leaking it; tests are short-lived
        let path = dir.path().join(name);
        std::mem::forget(dir);
        path
    }

    #[test]
    fn byte_grid_round_trips_exactly() {
        let mut grid = Grid::filled(SizeHW::new(3, 5), 0u8);
        for (ndx, cell) in grid.iter_mut().enumerate() {
            *cell = (ndx * 17 % 256) as u8;
        }
        let path = temp_path("round.pgm");
        write_pgm(&path, &grid).unwrap();
        let back = read_pgm(&path).unwrap();
        assert_eq!(back.hw(), grid.hw());
        assert_eq!(back.as_slice(), grid.as_slice());
    }

    #[test]
    fn header_comments_are_skipped() {
        let path = temp_path("comment.pgm");
        std::fs::write(&path, b"P5\n# a comment line\n2 2\n255\n\x00\x40\x80\xff").unwrap();
        let grid = read_pgm(&path).unwrap();
        assert_eq!(grid.hw(), SizeHW::new(2, 2));
        assert_eq!(grid.as_slice(), &[0x00, 0x40, 0x80, 0xff]);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let path = temp_path("bad.pgm");
        std::fs::write(&path, b"P2\n2 2\n255\n....").unwrap();
        assert!(matches!(read_pgm(&path), Err(PgmError::BadMagic(_))));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let path = temp_path("short.pgm");
        std::fs::write(&path, b"P5\n4 4\n255\nabc").unwrap();
        assert!(matches!(
            read_pgm(&path),
            Err(PgmError::Truncated { expected: 16, .. })
        ));
    }

    #[test]
    fn stretch_mapping_is_contractual() {
        let span = Span::new(10., 20.);
        assert_eq!(u8_pix_for(f32::NAN, &span), U8_NULL);
        assert_eq!(u8_pix_for(5., &span), U8_UNDER);
        assert_eq!(u8_pix_for(10., &span), U8_DARK);
        assert_eq!(u8_pix_for(25., &span), U8_OVER);
        assert_eq!(u8_pix_for(20., &span), U8_OVER);
        // just below max maps to the brightest informative value
        assert_eq!(u8_pix_for(19.999, &span), U8_LITE);
    }

    #[test]
    fn stretch_writer_covers_observed_range() {
        let mut grid = Grid::filled(SizeHW::new(1, 4), 0.0f32);
        *grid.get_mut(0, 0) = -3.;
        *grid.get_mut(0, 1) = 7.;
        *grid.get_mut(0, 2) = 2.;
        *grid.get_mut(0, 3) = f32::NAN;
        let path = temp_path("stretch.pgm");
        write_stretch_pgm(&path, &grid).unwrap();
        let back = read_pgm(&path).unwrap();
        // min -> darkest informative, max -> brightest informative, NaN -> 0
        assert_eq!(*back.get(0, 0), U8_DARK);
        assert_eq!(*back.get(0, 1), U8_LITE);
        assert!(U8_DARK < *back.get(0, 2) && *back.get(0, 2) < U8_LITE);
        assert_eq!(*back.get(0, 3), U8_NULL);
    }

    #[test]
    fn meapoint_parses_row_col() {
        let path = temp_path("sample.meapoint");
        std::fs::write(&path, "24.39  25.05\n").unwrap();
        let spot = read_meapoint(&path).unwrap();
        assert!((spot.row - 24.39).abs() < 1e-12);
        assert!((spot.col - 25.05).abs() < 1e-12);

        let bad = temp_path("bad.meapoint");
        std::fs::write(&bad, "24.39\n").unwrap();
        assert!(read_meapoint(&bad).is_err());
    }
}
