//! Page entries: the unit of the document under construction

use crate::source::{MediaType, SourceFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque identifier of a page entry
///
/// Random, never derived from content, stable for the entry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Clockwise page rotation, always one of 0, 90, 180 or 270 degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "i64")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);
    pub const QUARTER: Rotation = Rotation(90);
    pub const HALF: Rotation = Rotation(180);
    pub const THREE_QUARTERS: Rotation = Rotation(270);

    /// Build a rotation from any multiple of 90, normalising into 0..360
    ///
    /// Returns `None` for angles that are not quarter turns.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self(degrees.rem_euclid(360) as u16))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    /// One quarter turn clockwise
    pub fn rotate_cw(self) -> Self {
        self + Rotation::QUARTER
    }

    /// True when the page's width and height swap on screen
    pub fn is_sideways(self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl std::ops::Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        Rotation((self.0 + rhs.0) % 360)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        rotation.0
    }
}

impl TryFrom<i64> for Rotation {
    type Error = String;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("{} is not a multiple of 90 degrees", degrees))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// One page of the working document
///
/// Entries derived from the same upload share its [`SourceFile`]; the file
/// (and its preview handle) lives as long as any entry still points at it.
#[derive(Debug, Clone)]
pub struct PageEntry {
    id: PageId,
    source: Arc<SourceFile>,
    source_page_index: u32,
    rotation: Rotation,
}

impl PageEntry {
    pub fn new(source: Arc<SourceFile>, source_page_index: u32) -> Self {
        Self {
            id: PageId::new(),
            source,
            source_page_index,
            rotation: Rotation::NONE,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    /// Zero-based page index inside the source file (0 for images)
    pub fn source_page_index(&self) -> u32 {
        self.source_page_index
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn media_type(&self) -> MediaType {
        self.source.media_type()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.source.preview_url()
    }

    pub(crate) fn rotate_cw(&mut self) -> Rotation {
        self.rotation = self.rotation.rotate_cw();
        self.rotation
    }
}
