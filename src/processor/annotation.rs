//! Annotation channel
//!
//! Slicers smuggle per-move metadata through comments as `<tag> = <value>`
//! pairs. Each recognized tag overwrites one sticky field; anything that does
//! not parse is ignored and the previous value stays in effect.

use regex::Regex;
use std::sync::LazyLock;

use crate::moves::ExtrusionRole;

pub const EXTRUSION_ROLE_TAG: &str = "_EXTRUSION_ROLE";
pub const WIDTH_TAG: &str = "_WIDTH";
pub const HEIGHT_TAG: &str = "_HEIGHT";
pub const MM3_PER_MM_TAG: &str = "_MM3_PER_MM";

static TAG_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9])(_EXTRUSION_ROLE|_WIDTH|_HEIGHT|_MM3_PER_MM)\s*[=:]\s*([^\s;()]+)")
});

/// Sticky annotation state applied to every subsequent move
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Annotations {
    pub extrusion_role: ExtrusionRole,
    /// mm
    pub width: f32,
    /// mm
    pub height: f32,
    pub mm3_per_mm: f32,
}

impl Annotations {
    /// Apply every tag found in a comment; returns how many were applied
    pub fn apply_comment(&mut self, comment: &str) -> usize {
        let Ok(pattern) = TAG_PATTERN.as_ref() else {
            return 0;
        };

        let mut applied = 0;
        for captures in pattern.captures_iter(comment) {
            let (Some(tag), Some(value)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            match self.apply_tag(tag.as_str(), value.as_str()) {
                Ok(()) => applied += 1,
                Err(e) => log::debug!("Ignoring annotation {}: {}", tag.as_str(), e),
            }
        }
        applied
    }

    fn apply_tag(&mut self, tag: &str, value: &str) -> Result<(), String> {
        match tag {
            EXTRUSION_ROLE_TAG => self.extrusion_role = value.parse()?,
            WIDTH_TAG => self.width = parse_dimension(value)?,
            HEIGHT_TAG => self.height = parse_dimension(value)?,
            MM3_PER_MM_TAG => self.mm3_per_mm = parse_dimension(value)?,
            _ => return Err(format!("unknown tag '{}'", tag)),
        }
        Ok(())
    }
}

fn parse_dimension(value: &str) -> Result<f32, String> {
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("invalid value '{}'", value)),
    }
}
