//! SVG path documents
//!
//! The intermediate artifact between extraction and planning: one unfilled
//! `<path>` per polyline inside an `<svg>` whose `viewBox` matches the mask.
//! Only straight-line commands are written or accepted.

use crate::error::{CamToolError, CamToolResult, FileFormatError};
use penplot_core::{CoordinateSpace, PathSet, Point, Polyline, POINT_EPSILON};
use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

fn viewbox_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"viewBox\s*=\s*["']([^"']+)["']"#).expect("invalid viewbox regex")
    })
}

fn svg_size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<svg\b[^>]*?\bwidth\s*=\s*["']([\d.]+)[^"']*["'][^>]*?\bheight\s*=\s*["']([\d.]+)[^"']*["']"#)
            .expect("invalid svg size regex")
    })
}

fn path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<path\s+([^>]+)>"#).expect("invalid path regex"))
}

fn d_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bd\s*=\s*["']([^"']*)["']"#).expect("invalid d regex"))
}

/// Model-space path set together with the canvas it was traced from
#[derive(Debug, Clone, PartialEq)]
pub struct PathSetDocument {
    width: f64,
    height: f64,
    paths: PathSet,
}

impl PathSetDocument {
    /// Wrap a model-space path set traced from a `width` x `height` mask
    pub fn new(width: f64, height: f64, paths: PathSet) -> Self {
        Self {
            width,
            height,
            paths,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn into_paths(self) -> PathSet {
        self.paths
    }

    /// Serialize to SVG text
    pub fn to_svg(&self) -> String {
        let w = format_number(self.width);
        let h = format_number(self.height);
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        for polyline in &self.paths {
            let _ = writeln!(
                svg,
                r#"<path d="{}" fill="none" stroke="black" stroke-width="1"/>"#,
                path_data(polyline)
            );
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Parse SVG text produced by [`Self::to_svg`] or any SVG restricted to
    /// `M`, `L`, `H`, `V` and `Z` path commands
    pub fn parse(content: &str) -> CamToolResult<Self> {
        if content.trim().is_empty() {
            return Err(FileFormatError::EmptyFile("SVG document is empty".to_string()).into());
        }
        if !content.contains("<svg") {
            return Err(FileFormatError::SvgParseError("missing <svg> element".to_string()).into());
        }

        let mut paths = PathSet::new(CoordinateSpace::Model);
        for cap in path_regex().captures_iter(content) {
            let Some(d) = d_regex().captures(&cap[1]) else {
                continue;
            };
            for polyline in parse_path_data(&d[1])? {
                paths.push(polyline);
            }
        }

        let (width, height) = match canvas_size(content)? {
            Some(size) => size,
            None => paths
                .bounding_box()
                .map(|b| (b.max_x.max(0.0), b.max_y.max(0.0)))
                .unwrap_or((0.0, 0.0)),
        };

        debug!(
            "Parsed SVG document {}x{} with {} paths",
            width,
            height,
            paths.len()
        );
        Ok(Self::new(width, height, paths))
    }

    /// Read and parse an SVG file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CamToolResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CamToolError::invalid_input(format!(
                "SVG file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Write the document to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CamToolResult<()> {
        std::fs::write(path.as_ref(), self.to_svg())?;
        debug!("Saved SVG to {}", path.as_ref().display());
        Ok(())
    }
}

/// `d` attribute for one polyline; closed polylines end in `Z`
fn path_data(polyline: &Polyline) -> String {
    let points = polyline.points();
    let closed = polyline.is_closed(POINT_EPSILON);
    let body = if closed {
        &points[..points.len() - 1]
    } else {
        points
    };

    let mut d = String::new();
    for (i, p) in body.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{} {} {}", cmd, format_number(p.x), format_number(p.y));
    }
    if closed {
        d.push_str(" Z");
    }
    d
}

/// Shortest decimal form with at most three fractional digits
fn format_number(value: f64) -> String {
    let mut s = format!("{:.3}", value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn canvas_size(content: &str) -> CamToolResult<Option<(f64, f64)>> {
    if let Some(caps) = viewbox_regex().captures(content) {
        let parts: Vec<&str> = caps[1]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() != 4 {
            return Err(FileFormatError::SvgParseError(format!(
                "viewBox needs four numbers: '{}'",
                &caps[1]
            ))
            .into());
        }
        let width = parse_number(parts[2])?;
        let height = parse_number(parts[3])?;
        return Ok(Some((width, height)));
    }
    if let Some(caps) = svg_size_regex().captures(content) {
        return Ok(Some((parse_number(&caps[1])?, parse_number(&caps[2])?)));
    }
    Ok(None)
}

fn parse_number(token: &str) -> CamToolResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FileFormatError::SvgParseError(format!("invalid number '{}'", token)).into())
}

/// Split path data into command letters and numbers
///
/// Separators are whitespace and commas; a `-` that does not follow an
/// exponent marker also starts a new number.
pub fn tokenize_path_data(data: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in data.chars() {
        match ch {
            c if c.is_ascii_alphabetic() && c != 'e' && c != 'E' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            ' ' | ',' | '\n' | '\r' | '\t' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '-' if !current.is_empty() && !current.ends_with(['e', 'E']) => {
                tokens.push(std::mem::take(&mut current));
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a `d` attribute into model-space polylines, one per subpath
fn parse_path_data(data: &str) -> CamToolResult<Vec<Polyline>> {
    let tokens = tokenize_path_data(data);
    let mut polylines = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut pos = Point::ORIGIN;
    let mut start = Point::ORIGIN;
    let mut command: Option<char> = None;
    let mut i = 0;

    let number_at = |i: usize| -> CamToolResult<f64> {
        let token = tokens.get(i).ok_or_else(|| {
            CamToolError::from(FileFormatError::SvgParseError(
                "path data ends inside a command".to_string(),
            ))
        })?;
        parse_number(token)
    };

    while i < tokens.len() {
        let token = &tokens[i];
        let cmd = match token.chars().next() {
            Some(c) if token.len() == 1 && c.is_ascii_alphabetic() => {
                i += 1;
                c
            }
            // Repeated parameters reuse the previous command; after a moveto
            // they are implicit linetos
            _ => match command {
                Some('M') => 'L',
                Some('m') => 'l',
                Some(c) if c != 'Z' && c != 'z' => c,
                _ => {
                    return Err(FileFormatError::SvgParseError(format!(
                        "unexpected token '{}'",
                        token
                    ))
                    .into())
                }
            },
        };

        match cmd {
            'M' | 'm' => {
                let (x, y) = (number_at(i)?, number_at(i + 1)?);
                i += 2;
                if current.len() >= 2 {
                    polylines.push(Polyline::model(std::mem::take(&mut current)));
                }
                current.clear();
                pos = if cmd == 'm' {
                    Point::new(pos.x + x, pos.y + y)
                } else {
                    Point::new(x, y)
                };
                start = pos;
                current.push(pos);
            }
            'L' | 'l' => {
                let (x, y) = (number_at(i)?, number_at(i + 1)?);
                i += 2;
                pos = if cmd == 'l' {
                    Point::new(pos.x + x, pos.y + y)
                } else {
                    Point::new(x, y)
                };
                current.push(pos);
            }
            'H' | 'h' => {
                let x = number_at(i)?;
                i += 1;
                pos.x = if cmd == 'h' { pos.x + x } else { x };
                current.push(pos);
            }
            'V' | 'v' => {
                let y = number_at(i)?;
                i += 1;
                pos.y = if cmd == 'v' { pos.y + y } else { y };
                current.push(pos);
            }
            'Z' | 'z' => {
                if !current.is_empty() {
                    current.push(start);
                }
                if current.len() >= 2 {
                    polylines.push(Polyline::model(std::mem::take(&mut current)));
                }
                current.clear();
                pos = start;
            }
            other => {
                return Err(FileFormatError::SvgParseError(format!(
                    "unsupported path command '{}'",
                    other
                ))
                .into())
            }
        }
        command = Some(cmd);
    }

    if current.len() >= 2 {
        polylines.push(Polyline::model(current));
    }
    Ok(polylines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn sample() -> PathSetDocument {
        let paths = PathSet::from_polylines(
            CoordinateSpace::Model,
            vec![
                Polyline::model(vec![p(1.0, 1.0), p(4.0, 1.0), p(4.0, 3.0), p(1.0, 1.0)]),
                Polyline::model(vec![p(0.0, 0.0), p(2.5, 7.125)]),
            ],
        );
        PathSetDocument::new(10.0, 8.0, paths)
    }

    #[test]
    fn test_to_svg_format() {
        let svg = sample().to_svg();
        assert!(svg.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="8" viewBox="0 0 10 8">"#
        ));
        assert!(svg.contains(
            r#"<path d="M 1 1 L 4 1 L 4 3 Z" fill="none" stroke="black" stroke-width="1"/>"#
        ));
        assert!(svg.contains(r#"d="M 0 0 L 2.5 7.125""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_parse_restores_closure() {
        let doc = PathSetDocument::parse(&sample().to_svg()).unwrap();
        assert_eq!(doc, sample());
        assert!(doc.paths().polylines()[0].is_closed(POINT_EPSILON));
    }

    #[test]
    fn test_parse_relative_and_axis_commands() {
        let svg = r#"<svg viewBox="0 0 50 50"><path d="m10,10 h5 v5 l-5-5 M20 20 30 20 V25 H20 z"/></svg>"#;
        let doc = PathSetDocument::parse(svg).unwrap();
        let lines = doc.paths().polylines();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].points(),
            &[p(10.0, 10.0), p(15.0, 10.0), p(15.0, 15.0), p(10.0, 10.0)]
        );
        assert_eq!(
            lines[1].points(),
            &[p(20.0, 20.0), p(30.0, 20.0), p(30.0, 25.0), p(20.0, 25.0), p(20.0, 20.0)]
        );
        assert_eq!((doc.width(), doc.height()), (50.0, 50.0));
    }

    #[test]
    fn test_tokenizer_splits_signs() {
        assert_eq!(
            tokenize_path_data("M1.5-2L3e-1,4"),
            vec!["M", "1.5", "-2", "L", "3e-1", "4"]
        );
    }

    #[test]
    fn test_malformed_number_is_invalid_input() {
        let err = PathSetDocument::parse(r#"<svg><path d="M 1 abc.d L 2 2"/></svg>"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = PathSetDocument::parse(r#"<svg><path d="M 1 1 L 2"/></svg>"#).unwrap_err();
        assert!(matches!(err, CamToolError::FileFormat(_)));
    }

    #[test]
    fn test_curves_are_rejected() {
        let err = PathSetDocument::parse(r#"<svg><path d="M 0 0 C 1 1 2 2 3 3"/></svg>"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_empty_document() {
        assert!(PathSetDocument::parse("   ").is_err());

        let blank = PathSetDocument::new(64.0, 32.0, PathSet::new(CoordinateSpace::Model));
        let parsed = PathSetDocument::parse(&blank.to_svg()).unwrap();
        assert!(parsed.paths().is_empty());
        assert_eq!((parsed.width(), parsed.height()), (64.0, 32.0));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(12.3456), "12.346");
        assert_eq!(format_number(0.5), "0.5");
    }
}
