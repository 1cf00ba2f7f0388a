use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shape_grid_core::{
    default_catalog, GridGeometry, ShapeCatalog, ShapeColor, ShapeDefinition, ShapeMatrix,
};

const SUPPORTED_CONFIG_VERSION: u32 = 1;
const DEFAULT_ROWS: u32 = 8;
const DEFAULT_COLS: u32 = 5;
const DEFAULT_CELL_SIZE: f32 = 50.0;
const DEFAULT_CELL_GAP: f32 = 5.0;

/// Grid dimensions, pixel geometry and palette used by an editor session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EditorConfig {
    pub(crate) rows: u32,
    pub(crate) cols: u32,
    pub(crate) geometry: GridGeometry,
    pub(crate) catalog: ShapeCatalog,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            geometry: GridGeometry::new(DEFAULT_CELL_SIZE, DEFAULT_CELL_GAP),
            catalog: default_catalog(),
        }
    }
}

impl EditorConfig {
    /// Loads the configuration at `path`, or the built-in one when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).context("failed to parse config toml contents")?;
        if file.version != SUPPORTED_CONFIG_VERSION {
            bail!(
                "unsupported config version {}; expected {}",
                file.version,
                SUPPORTED_CONFIG_VERSION
            );
        }

        let mut config = Self::default();
        if let Some(grid) = file.grid {
            if grid.rows == 0 || grid.cols == 0 {
                bail!("grid must have at least one row and one column");
            }
            if !grid.cell_size.is_finite() || grid.cell_size <= 0.0 {
                bail!("cell_size must be positive, got {}", grid.cell_size);
            }
            if !grid.cell_gap.is_finite() || grid.cell_gap < 0.0 {
                bail!("cell_gap must not be negative, got {}", grid.cell_gap);
            }
            config.rows = grid.rows;
            config.cols = grid.cols;
            config.geometry = GridGeometry::new(grid.cell_size, grid.cell_gap);
        }

        if !file.shapes.is_empty() {
            let definitions = file
                .shapes
                .into_iter()
                .map(ShapeEntry::into_definition)
                .collect::<Result<Vec<_>>>()?;
            config.catalog = ShapeCatalog::new(definitions).context("invalid shape catalog")?;
        }

        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    version: u32,
    grid: Option<GridSection>,
    #[serde(default)]
    shapes: Vec<ShapeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GridSection {
    rows: u32,
    cols: u32,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
    #[serde(default = "default_cell_gap")]
    cell_gap: f32,
}

fn default_cell_size() -> f32 {
    DEFAULT_CELL_SIZE
}

fn default_cell_gap() -> f32 {
    DEFAULT_CELL_GAP
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShapeEntry {
    id: String,
    name: String,
    matrix: Vec<Vec<u8>>,
    color: String,
}

impl ShapeEntry {
    fn into_definition(self) -> Result<ShapeDefinition> {
        let matrix = ShapeMatrix::new(self.matrix)
            .with_context(|| format!("invalid matrix for shape `{}`", self.id))?;
        let color = ShapeColor::from_hex(&self.color)
            .with_context(|| format!("invalid color for shape `{}`", self.id))?;
        Ok(ShapeDefinition::new(self.id.as_str(), self.name, matrix, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_built_in_config() {
        let config = EditorConfig::load(None).expect("default config");
        assert_eq!(config.rows, 8);
        assert_eq!(config.cols, 5);
        assert_eq!(config.geometry.pitch(), 55.0);
        assert_eq!(config.catalog.len(), 8);
    }

    #[test]
    fn grid_and_shapes_override_defaults() {
        let config = EditorConfig::parse(
            r##"
            version = 1

            [grid]
            rows = 4
            cols = 6
            cell_size = 32.0

            [[shapes]]
            id = "T"
            name = "Tee"
            matrix = [[1, 1, 1], [0, 1, 0]]
            color = "#a000f0"
        "##,
        )
        .expect("valid config");

        assert_eq!((config.rows, config.cols), (4, 6));
        assert_eq!(config.geometry, GridGeometry::new(32.0, 5.0));
        assert_eq!(config.catalog.len(), 1);
        let tee = config.catalog.get("T").expect("tee defined");
        assert_eq!(tee.matrix.occupied_count(), 4);
        assert_eq!(tee.color, ShapeColor::from_rgb(0xa0, 0x00, 0xf0));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let error = EditorConfig::parse("version = 2").expect_err("version 2 unsupported");
        assert!(error.to_string().contains("unsupported config version 2"));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let error = EditorConfig::parse("version = 1\n[grid]\nrows = 0\ncols = 5")
            .expect_err("zero rows");
        assert!(error.to_string().contains("at least one row"));
    }

    #[test]
    fn ragged_matrix_is_rejected_with_shape_context() {
        let error = EditorConfig::parse(
            r##"
            version = 1
            [[shapes]]
            id = "X"
            name = "Broken"
            matrix = [[1, 1], [1]]
            color = "#ffffff"
        "##,
        )
        .expect_err("ragged matrix");
        assert!(format!("{error:#}").contains("invalid matrix for shape `X`"));
    }

    #[test]
    fn duplicate_shape_ids_are_rejected() {
        let entry = r##"
            [[shapes]]
            id = "A"
            name = "First"
            matrix = [[1]]
            color = "#000000"
        "##;
        let contents = format!("version = 1\n{entry}{entry}");
        let error = EditorConfig::parse(&contents).expect_err("duplicate ids");
        assert!(format!("{error:#}").contains("appears more than once"));
    }

    #[test]
    fn bad_color_is_rejected() {
        let error = EditorConfig::parse(
            r##"
            version = 1
            [[shapes]]
            id = "A"
            name = "First"
            matrix = [[1]]
            color = "teal"
        "##,
        )
        .expect_err("bad color");
        assert!(format!("{error:#}").contains("invalid color for shape `A`"));
    }
}
