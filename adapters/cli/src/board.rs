use std::fmt::Write as _;

use shape_grid_core::{GridGeometry, Position, ShapeCatalog, ShapeMatrix};
use shape_grid_occupancy::OccupancyGrid;
use shape_grid_session::PlacementSession;

const EMPTY_CELL: char = '.';
const SHARED_CELL: char = '*';

/// Renders the grid as ASCII followed by the ordered shape list.
///
/// Cells show the first letter of the owning shape's catalog id. Cells
/// covered by more than one instance show `*`.
pub(crate) fn render(session: &PlacementSession, geometry: GridGeometry) -> String {
    let grid = session.grid();
    let (rows, cols) = grid.dimensions();
    let mut coverage = vec![0u32; rows as usize * cols as usize];
    for cell in session.shapes().iter().flat_map(|shape| shape.cells()) {
        if !grid.is_out_of_bounds(cell) {
            coverage[cell.row() as usize * cols as usize + cell.col() as usize] += 1;
        }
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{rows}x{cols} grid, {} px wide, {} px tall",
        geometry.extent(cols),
        geometry.extent(rows)
    );
    out.push_str("   ");
    for col in 0..cols {
        out.push(digit(col));
    }
    out.push('\n');

    for row in 0..rows {
        let _ = write!(out, "{row:>2} ");
        for col in 0..cols {
            let position = Position::new(row as i32, col as i32);
            let shared = coverage[row as usize * cols as usize + col as usize] > 1;
            out.push(if shared {
                SHARED_CELL
            } else {
                owner_glyph(session, position)
            });
        }
        out.push('\n');
    }

    if session.shapes().is_empty() {
        out.push_str("no shapes placed\n");
    }
    for (index, shape) in session.shapes().iter().enumerate() {
        let pixel = OccupancyGrid::grid_to_pixel(shape.position, geometry.pitch());
        let _ = write!(
            out,
            "{}. {} ({}) at {} px ({}, {}) {}",
            index + 1,
            shape.instance_id,
            shape.shape_id,
            shape.position,
            pixel.x,
            pixel.y,
            shape.color
        );
        if session.dragging() == Some(&shape.instance_id) {
            out.push_str(" dragging");
        }
        if shape.has_overlap {
            out.push_str(" overlapping");
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} shapes, {} overlapping",
        session.shapes().len(),
        session.overlapping_count()
    );
    out
}

/// Lists the palette with each footprint drawn beneath its entry.
pub(crate) fn render_catalog(catalog: &ShapeCatalog) -> String {
    let mut out = String::new();
    for definition in catalog.iter() {
        let _ = writeln!(
            out,
            "{} {} {} ({} cells)",
            definition.id,
            definition.name,
            definition.color,
            definition.matrix.occupied_count()
        );
        out.push_str(&render_matrix(&definition.matrix));
    }
    out
}

fn render_matrix(matrix: &ShapeMatrix) -> String {
    let mut out = String::new();
    for row in 0..matrix.height() {
        out.push_str("  ");
        for col in 0..matrix.width() {
            out.push(if matrix.is_occupied(row, col) {
                '#'
            } else {
                EMPTY_CELL
            });
        }
        out.push('\n');
    }
    out
}

fn owner_glyph(session: &PlacementSession, position: Position) -> char {
    session
        .grid()
        .cell(position)
        .and_then(|owner| session.shape(owner))
        .and_then(|shape| shape.shape_id.as_str().chars().next())
        .unwrap_or(EMPTY_CELL)
}

fn digit(value: u32) -> char {
    char::from_digit(value % 10, 10).unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use shape_grid_core::{default_catalog, InstanceId, PlacedShape};

    use super::*;

    fn session_with(placements: &[(&str, u64, i32, i32)]) -> PlacementSession {
        let catalog = default_catalog();
        let mut session = PlacementSession::new(3, 4);
        for &(shape, suffix, row, col) in placements {
            let definition = catalog.get(shape).expect("shape in catalog");
            let instance = PlacedShape::from_definition(
                InstanceId::from_parts(&definition.id, suffix),
                definition,
                Position::new(row, col),
            );
            session.add_shape(instance).expect("fits");
        }
        session
    }

    #[test]
    fn board_shows_owners_and_empty_cells() {
        let session = session_with(&[("I", 1, 0, 0), ("O", 2, 1, 2)]);
        let board = render(&session, GridGeometry::new(50.0, 5.0));

        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines[0], "3x4 grid, 215 px wide, 160 px tall");
        assert_eq!(lines[1], "   0123");
        assert_eq!(lines[2], " 0 IIII");
        assert_eq!(lines[3], " 1 ..OO");
        assert_eq!(lines[4], " 2 ..OO");
        assert_eq!(lines[5], "1. I-1 (I) at (0, 0) px (0, 0) #00f0f0");
        assert_eq!(lines[6], "2. O-2 (O) at (1, 2) px (110, 55) #f0f000");
        assert_eq!(lines[7], "2 shapes, 0 overlapping");
    }

    #[test]
    fn shared_cells_are_marked() {
        let mut session = session_with(&[("I", 1, 0, 0), ("O", 2, 1, 0)]);
        let square = InstanceId::new("O-2");
        let _ = session.drag_start(&square);
        let _ = session.drag_end(&square, Position::new(0, 1));

        let board = render(&session, GridGeometry::new(50.0, 5.0));
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines[2], " 0 I**I");
        assert_eq!(lines[3], " 1 .OO.");
        assert!(lines[6].ends_with("overlapping"));
        assert_eq!(lines[7], "2 shapes, 2 overlapping");
    }

    #[test]
    fn catalog_listing_draws_footprints() {
        let listing = render_catalog(&default_catalog());
        assert!(listing.starts_with("I Gems #00f0f0 (4 cells)\n  ####\n"));
        assert!(listing.contains("Q Potion #f5d2f2 (7 cells)\n  .#.\n  ###\n  ###\n"));
    }
}
