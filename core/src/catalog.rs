//! Static shape catalog consumed by the palette and the spawner.

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::{ShapeColor, ShapeId, ShapeMatrix};

/// Immutable catalog entry describing a shape that can be placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDefinition {
    /// Stable catalog key.
    pub id: ShapeId,
    /// Human readable name shown in the palette.
    pub name: String,
    /// Footprint of the shape.
    pub matrix: ShapeMatrix,
    /// Fill color used when presenting the shape.
    pub color: ShapeColor,
}

impl ShapeDefinition {
    /// Creates a new catalog entry.
    #[must_use]
    pub fn new(
        id: impl Into<ShapeId>,
        name: impl Into<String>,
        matrix: ShapeMatrix,
        color: ShapeColor,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            matrix,
            color,
        }
    }
}

/// Ordered, read-only collection of shape definitions keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeCatalog {
    entries: Vec<ShapeDefinition>,
}

impl ShapeCatalog {
    /// Creates a catalog, rejecting duplicate ids.
    pub fn new(entries: Vec<ShapeDefinition>) -> Result<Self, CatalogError> {
        for (index, entry) in entries.iter().enumerate() {
            if entries[..index].iter().any(|other| other.id == entry.id) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Looks up a definition by its catalog key.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ShapeDefinition> {
        self.entries.iter().find(|entry| entry.id.as_str() == id)
    }

    /// Iterator over the definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ShapeDefinition> {
        self.entries.iter()
    }

    /// Number of definitions in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the catalog has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Built-in palette used when no configuration overrides it.
#[must_use]
pub fn default_catalog() -> ShapeCatalog {
    let entry = |id: &str, name: &str, rows: &[&[u8]], rgb: (u8, u8, u8)| {
        ShapeDefinition::new(
            id,
            name,
            ShapeMatrix::from_static(rows),
            ShapeColor::from_rgb(rgb.0, rgb.1, rgb.2),
        )
    };

    ShapeCatalog {
        entries: vec![
            entry("I", "Gems", &[&[1, 1, 1, 1]], (0x00, 0xf0, 0xf0)),
            entry("F", "Oscar", &[&[1], &[1]], (0x00, 0xff, 0x00)),
            entry(
                "Q",
                "Potion",
                &[&[0, 1, 0], &[1, 1, 1], &[1, 1, 1]],
                (0xf5, 0xd2, 0xf2),
            ),
            entry("G", "G-Shape", &[&[1]], (0x00, 0x00, 0xff)),
            entry("L", "L-Shape", &[&[1, 1, 1], &[1, 0, 0]], (0xf0, 0xa0, 0x00)),
            entry("O", "O-Shape", &[&[1, 1], &[1, 1]], (0xf0, 0xf0, 0x00)),
            entry("Z", "Z-Shape", &[&[1, 1], &[0, 1]], (0xf0, 0x00, 0x00)),
            entry("J", "J-Shape", &[&[1, 0, 0], &[1, 1, 1]], (0x00, 0x00, 0xf0)),
        ],
    }
}

/// Reasons a catalog cannot be assembled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// Two definitions share the same id.
    DuplicateId(ShapeId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "shape id '{id}' appears more than once"),
        }
    }
}

impl Error for CatalogError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_preserves_palette_order() {
        let catalog = default_catalog();
        let ids: Vec<_> = catalog.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["I", "F", "Q", "G", "L", "O", "Z", "J"]);
    }

    #[test]
    fn default_catalog_matrices_are_well_formed() {
        for entry in default_catalog().iter() {
            let rebuilt = ShapeMatrix::new(entry.matrix.rows().to_vec());
            assert_eq!(rebuilt.as_ref(), Ok(&entry.matrix), "entry {}", entry.id);
        }
    }

    #[test]
    fn lookup_by_id() {
        let catalog = default_catalog();
        let bar = catalog.get("I").expect("bar is in the catalog");
        assert_eq!(bar.name, "Gems");
        assert_eq!(bar.matrix.width(), 4);
        assert!(catalog.get("T").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let single = ShapeDefinition::new(
            "G",
            "Dot",
            ShapeMatrix::unit(),
            ShapeColor::from_rgb(0, 0, 0),
        );
        let result = ShapeCatalog::new(vec![single.clone(), single]);
        assert_eq!(result, Err(CatalogError::DuplicateId(ShapeId::new("G"))));
    }
}
