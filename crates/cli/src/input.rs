//! Profile input files.
//!
//! Line based, keywords case-insensitive:
//!
//! ```text
//! IMAGE img_01.tif
//! PROFILE_ID 12
//! COMMENT free text
//! PIXELWIDTH 2.27 nm
//! POSLOC 120.5, 88.0        (or NEGLOC)
//! PATH                      (also HOLE, PARTICLES, RANDOM_POINTS, GRID)
//! 100.0, 50.0
//! ...
//! END
//! # comment
//! ```
//!
//! Consecutive duplicate coordinates (any duplicate for particles) are dropped,
//! as is a closing node equal to the first. Unknown lines become warnings.

use std::path::Path;

use anyhow::{Context, Result};
use pathdist::classify::Polarity;
use pathdist::geom2::Point;
use pathdist::profile::ProfileInput;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("line {line}: PIXELWIDTH needs a number and a metric unit")]
    InvalidPixelWidth { line: usize },

    #[error("line {line}: {keyword} needs coordinates as 'x, y'")]
    InvalidLocation { line: usize, keyword: &'static str },

    #[error("line {line}: POSLOC and NEGLOC are mutually exclusive")]
    ConflictingPolarity { line: usize },

    #[error("{block} block starting at line {line} has no END")]
    UnterminatedBlock { block: &'static str, line: usize },

    #[error("no valid pixel width found")]
    MissingPixelWidth,

    #[error("no path coordinates found")]
    MissingPath,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block {
    Path,
    Hole,
    Particles,
    Random,
    Grid,
}

impl Block {
    fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PATH" => Some(Self::Path),
            "HOLE" => Some(Self::Hole),
            "PARTICLES" => Some(Self::Particles),
            "RANDOM_POINTS" => Some(Self::Random),
            "GRID" => Some(Self::Grid),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Path => "PATH",
            Self::Hole => "HOLE",
            Self::Particles => "PARTICLES",
            Self::Random => "RANDOM_POINTS",
            Self::Grid => "GRID",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Hole => "hole",
            Self::Particles => "particle",
            Self::Random => "random point",
            Self::Grid => "grid point",
        }
    }
}

/// `"x, y"` (spaces optional) as a point.
fn parse_point(s: &str) -> Option<Point> {
    let (x, y) = s.split_once(',')?;
    let x: f64 = x.trim().parse().ok()?;
    let y: f64 = y.trim().parse().ok()?;
    Some(Point::new(x, y))
}

fn warn(warnings: &mut Vec<String>, msg: String) {
    tracing::warn!("{msg}");
    warnings.push(msg);
}

/// Read coordinates up to the next `END`; returns the points and the index of
/// the line after `END`.
fn read_block(
    lines: &[&str],
    start: usize,
    block: Block,
    warnings: &mut Vec<String>,
) -> Result<(Vec<Point>, usize), ParseError> {
    let mut points: Vec<Point> = Vec::new();
    for (i, raw) in lines.iter().enumerate().skip(start) {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("END") {
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            return Ok((points, i + 1));
        }
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some(p) = parse_point(s) else {
            warn(
                warnings,
                format!("line {}: '{}' not valid {} coordinates", i + 1, s, block.label()),
            );
            continue;
        };
        let duplicate = points.last() == Some(&p)
            || (block == Block::Particles && points.contains(&p));
        if duplicate {
            tracing::info!(
                "duplicate {} coordinates ({}, {}): skipping 2nd instance",
                block.label(),
                p.x,
                p.y
            );
            continue;
        }
        points.push(p);
    }
    Err(ParseError::UnterminatedBlock {
        block: block.keyword(),
        line: start,
    })
}

/// Parse the text of one profile file.
pub fn parse_profile(text: &str) -> Result<ProfileInput, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut input = ProfileInput::new(Vec::new(), f64::NAN, "");
    let mut pixel_width: Option<(f64, String)> = None;
    let mut warnings = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let s = lines[i].trim();
        let line = i + 1;
        i += 1;
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if let Some(block) = Block::from_keyword(s) {
            let (points, next) = read_block(&lines, i, block, &mut warnings)?;
            i = next;
            match block {
                Block::Path => input.path = points,
                Block::Hole => input.holes.push(points),
                Block::Particles => input.particles.extend(points),
                Block::Random => input.random_points.extend(points),
                Block::Grid => input.grid_points.extend(points),
            }
            continue;
        }
        let (keyword, rest) = match s.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (s, ""),
        };
        match keyword.to_ascii_uppercase().as_str() {
            "IMAGE" => {
                if let Some(img) = rest.split_whitespace().next() {
                    input.src_img = img.to_string();
                }
            }
            "PROFILE_ID" => match rest.split_whitespace().next() {
                Some(id) => input.id = id.to_string(),
                None => warn(&mut warnings, format!("line {line}: profile id not defined")),
            },
            "COMMENT" => input.comment = rest.to_string(),
            "PIXELWIDTH" => {
                let mut it = rest.split_whitespace();
                let w = it.next().and_then(|w| w.parse::<f64>().ok());
                match (w, it.next()) {
                    (Some(w), Some(unit)) => pixel_width = Some((w, unit.to_string())),
                    _ => return Err(ParseError::InvalidPixelWidth { line }),
                }
            }
            kw @ ("POSLOC" | "NEGLOC") => {
                let keyword = if kw == "POSLOC" { "POSLOC" } else { "NEGLOC" };
                let p = parse_point(rest).ok_or(ParseError::InvalidLocation { line, keyword })?;
                let polarity = if keyword == "POSLOC" {
                    Polarity::Positive(p)
                } else {
                    Polarity::Negative(p)
                };
                match input.polarity {
                    Some(prev) if std::mem::discriminant(&prev) != std::mem::discriminant(&polarity) => {
                        return Err(ParseError::ConflictingPolarity { line });
                    }
                    _ => input.polarity = Some(polarity),
                }
            }
            _ => warn(
                &mut warnings,
                format!("line {line}: unrecognized string '{s}' in input file"),
            ),
        }
    }
    let (w, unit) = pixel_width.ok_or(ParseError::MissingPixelWidth)?;
    if input.path.is_empty() {
        return Err(ParseError::MissingPath);
    }
    input.pixel_width = w;
    input.metric_unit = unit;
    input.warnings = warnings;
    Ok(input)
}

/// Read and parse a profile file; the file name becomes the input label.
pub fn read_profile(path: &Path) -> Result<ProfileInput> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut input = parse_profile(&text).with_context(|| format!("parsing {}", path.display()))?;
    input.input_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    tracing::debug!(
        file = %input.input_file,
        id = %input.id,
        nodes = input.path.len(),
        holes = input.holes.len(),
        particles = input.particles.len(),
        "parsed"
    );
    Ok(input)
}
