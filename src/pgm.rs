//! PGM (P5, binary greyscale) snapshot I/O — the controller's I/O
//! collaborator, kept deliberately small since grid rendering and image
//! tooling live outside this crate. Filenames: `<W>x<H>x<Turn>` for
//! outputs and `<W>x<H>` for the input.

use crate::wire::World;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PgmError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("not a binary PGM (P5) file")]
    BadMagic,
    #[error("malformed PGM header")]
    BadHeader,
    #[error("PGM body has {found} bytes, expected {expected}")]
    ShortBody { found: usize, expected: usize },
}

/// `<W>x<H>` input filename.
pub fn input_filename(width: usize, height: usize) -> PathBuf {
    PathBuf::from(format!("{width}x{height}"))
}

/// `<W>x<H>x<Turn>` output filename.
pub fn output_filename(width: usize, height: usize, turn: u64) -> PathBuf {
    PathBuf::from(format!("{width}x{height}x{turn}"))
}

/// Writes `world` as a binary PGM (P5) file at `path`.
pub fn save_pgm(path: impl AsRef<Path>, world: &World) -> Result<(), PgmError> {
    let mut file = std::fs::File::create(path)?;
    write!(file, "P5\n{} {}\n255\n", world.width, world.height)?;
    file.write_all(&world.cells)?;
    Ok(())
}

/// Reads a binary PGM (P5) file at `path` into a `World`.
pub fn load_pgm(path: impl AsRef<Path>) -> Result<World, PgmError> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    parse_pgm(&buf)
}

fn parse_pgm(buf: &[u8]) -> Result<World, PgmError> {
    // Minimal whitespace-tolerant P5 parser: magic, width, height, maxval,
    // each separated by ASCII whitespace, then exactly width*height raw bytes.
    let mut pos = 0usize;
    let magic = take_token(buf, &mut pos).ok_or(PgmError::BadHeader)?;
    if magic != b"P5" {
        return Err(PgmError::BadMagic);
    }
    let width: usize = parse_usize_token(buf, &mut pos)?;
    let height: usize = parse_usize_token(buf, &mut pos)?;
    let _maxval: usize = parse_usize_token(buf, &mut pos)?;
    // Exactly one whitespace byte separates the header from the raster.
    if pos >= buf.len() {
        return Err(PgmError::BadHeader);
    }
    pos += 1;

    let expected = width * height;
    let body = &buf[pos..];
    if body.len() != expected {
        return Err(PgmError::ShortBody { found: body.len(), expected });
    }
    Ok(World { height, width, cells: body.to_vec() })
}

fn take_token<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    while *pos < buf.len() && buf[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    let start = *pos;
    while *pos < buf.len() && !buf[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        None
    } else {
        Some(&buf[start..*pos])
    }
}

fn parse_usize_token(buf: &[u8], pos: &mut usize) -> Result<usize, PgmError> {
    let tok = take_token(buf, pos).ok_or(PgmError::BadHeader)?;
    std::str::from_utf8(tok)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(PgmError::BadHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ALIVE;

    #[test]
    fn round_trips_through_disk() {
        let mut w = World::new_dead(3, 4);
        w.set(1, 2, ALIVE);
        let path = std::env::temp_dir().join(format!("gol-pgm-test-{}.pgm", std::process::id()));
        save_pgm(&path, &w).unwrap();
        let back = load_pgm(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(w, back);
    }

    #[test]
    fn filenames_follow_naming_convention() {
        assert_eq!(input_filename(16, 16).to_str().unwrap(), "16x16");
        assert_eq!(output_filename(16, 16, 10).to_str().unwrap(), "16x16x10");
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = parse_pgm(b"P4\n1 1\n255\n\x00").unwrap_err();
        assert!(matches!(err, PgmError::BadMagic));
    }
}
