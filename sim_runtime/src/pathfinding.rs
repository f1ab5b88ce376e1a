use crate::{Cell, OccupancyGrid};

/// How a unit traverses the map, which decides what the pathfinder may cross.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementDomain {
    /// Routes around obstructed cells of the passable grid.
    Ground,
    /// Ignores ground obstructions entirely.
    Air,
}

/// Contract for the external grid-search pathfinder.
///
/// The simulation treats path search as a black box: given the current
/// occupancy, a start and a goal, it expects an ordered sequence of cell
/// waypoints ending at the goal, or `None` when the goal is unreachable.
pub trait Pathfinder: Send + Sync + 'static {
    fn find_path(
        &self,
        grid: &OccupancyGrid,
        start: Cell,
        goal: Cell,
        domain: MovementDomain,
    ) -> Option<Vec<Cell>>;
}

/// Straight-line stand-in used by tests and the headless demo.
///
/// Walks the segment between start and goal at one-cell resolution and
/// refuses ground routes that would cross an obstructed cell. Not a real
/// planner; production wires in the project's grid-search implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectPathfinder;

impl Pathfinder for DirectPathfinder {
    fn find_path(
        &self,
        grid: &OccupancyGrid,
        start: Cell,
        goal: Cell,
        domain: MovementDomain,
    ) -> Option<Vec<Cell>> {
        if start == goal {
            return Some(Vec::new());
        }
        if !grid.in_bounds(goal.x, goal.y) {
            return None;
        }

        let (x0, y0) = (start.x as f32, start.y as f32);
        let (x1, y1) = (goal.x as f32, goal.y as f32);
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;

        let mut path = Vec::with_capacity(steps as usize);
        let mut previous = start;
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            let cell = Cell::new((x0 + dx * t).round() as u32, (y0 + dy * t).round() as u32);
            if cell == previous {
                continue;
            }
            if domain == MovementDomain::Ground && grid.is_obstructed(cell.x, cell.y) {
                return None;
            }
            path.push(cell);
            previous = cell;
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_path_reaches_goal_on_open_ground() {
        let grid = OccupancyGrid::new(5, 5);
        let path = DirectPathfinder
            .find_path(&grid, Cell::new(0, 0), Cell::new(4, 4), MovementDomain::Ground)
            .expect("open map has a path");
        assert_eq!(path.last(), Some(&Cell::new(4, 4)));
    }

    #[test]
    fn ground_route_refuses_obstruction() {
        let mut grid = OccupancyGrid::new(5, 1);
        grid.set_obstructed(2, 0, true);
        let blocked = DirectPathfinder.find_path(
            &grid,
            Cell::new(0, 0),
            Cell::new(4, 0),
            MovementDomain::Ground,
        );
        assert!(blocked.is_none());

        let airborne = DirectPathfinder.find_path(
            &grid,
            Cell::new(0, 0),
            Cell::new(4, 0),
            MovementDomain::Air,
        );
        assert!(airborne.is_some());
    }

    #[test]
    fn zero_length_request_is_empty() {
        let grid = OccupancyGrid::new(3, 3);
        let path = DirectPathfinder
            .find_path(&grid, Cell::new(1, 1), Cell::new(1, 1), MovementDomain::Ground)
            .unwrap();
        assert!(path.is_empty());
    }
}
