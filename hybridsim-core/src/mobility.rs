use rand_core::Rng;
use std::{fmt, time::Duration};

/// A position in the scenario plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// An axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Rectangle {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.y >= self.min_y
            && position.y <= self.max_y
    }
}

/// Deterministic grid placement: origin `(min_x, min_y)`, fixed spacing,
/// row-major fill order with `width` positions per row.
///
/// The position of an index is a pure function of the layout parameters,
/// so rebuilding a scenario always reproduces the same initial placement.
///
/// # Example
///
/// ```
/// # use hybridsim_core::mobility::{GridLayout, Position};
/// let grid = GridLayout::new(0.0, 0.0, 5.0, 10.0, 3);
/// assert_eq!(grid.position(0), Position::new(0.0, 0.0));
/// assert_eq!(grid.position(2), Position::new(10.0, 0.0));
/// assert_eq!(grid.position(3), Position::new(0.0, 10.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub min_x: f64,
    pub min_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    pub width: u32,
}

impl GridLayout {
    pub const fn new(min_x: f64, min_y: f64, delta_x: f64, delta_y: f64, width: u32) -> Self {
        Self {
            min_x,
            min_y,
            delta_x,
            delta_y,
            width,
        }
    }

    /// A `width` of zero is treated as a single-column layout.
    pub fn position(&self, index: u32) -> Position {
        let width = self.width.max(1);
        let column = index % width;
        let row = index / width;
        Position::new(
            self.min_x + column as f64 * self.delta_x,
            self.min_y + row as f64 * self.delta_y,
        )
    }
}

/// The mobility behaviour attached to a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MobilityModel {
    /// The node never moves (access points, wired routers).
    ConstantPosition,
    /// The node performs a random walk confined to `bounds`: at each step a
    /// fresh heading and speed are drawn, and the node reflects off the
    /// rectangle's edges.
    RandomWalk2d { bounds: Rectangle },
}

/// Walking speed range in m/s, drawn uniformly per step.
const WALK_SPEED_MIN: f64 = 2.0;
const WALK_SPEED_MAX: f64 = 4.0;

impl MobilityModel {
    /// Advance `position` by one step of `elapsed` simulated time.
    ///
    /// [`MobilityModel::ConstantPosition`] returns the position unchanged.
    /// The random walk draws its heading and speed from `rng`, which the
    /// caller provides so that all simulation randomness flows from a
    /// single seedable source.
    pub fn step<R: Rng>(
        &self,
        position: Position,
        elapsed: Duration,
        rng: &mut R,
    ) -> Position {
        match self {
            MobilityModel::ConstantPosition => position,
            MobilityModel::RandomWalk2d { bounds } => {
                let heading = sample_unit(rng) * std::f64::consts::TAU;
                let speed = WALK_SPEED_MIN + sample_unit(rng) * (WALK_SPEED_MAX - WALK_SPEED_MIN);
                let distance = speed * elapsed.as_secs_f64();

                let next = Position::new(
                    reflect(
                        position.x + distance * heading.cos(),
                        bounds.min_x,
                        bounds.max_x,
                    ),
                    reflect(
                        position.y + distance * heading.sin(),
                        bounds.min_y,
                        bounds.max_y,
                    ),
                );
                debug_assert!(bounds.contains(next));
                next
            }
        }
    }
}

/// Uniform sample in `[0, 1)`.
fn sample_unit<R: Rng>(rng: &mut R) -> f64 {
    (rng.next_u64() as f64) * (1.0 / (u64::MAX as f64 + 1.0))
}

/// Reflect `value` back inside `[min, max]`.
fn reflect(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        (2.0 * min - value).min(max)
    } else if value > max {
        (2.0 * max - value).max(min)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng;

    #[test]
    fn grid_is_row_major() {
        let grid = GridLayout::new(0.0, 0.0, 5.0, 10.0, 3);

        assert_eq!(grid.position(0), Position::new(0.0, 0.0));
        assert_eq!(grid.position(1), Position::new(5.0, 0.0));
        assert_eq!(grid.position(2), Position::new(10.0, 0.0));
        // fourth node wraps to the second row
        assert_eq!(grid.position(3), Position::new(0.0, 10.0));
        assert_eq!(grid.position(17), Position::new(10.0, 50.0));
    }

    #[test]
    fn zero_width_grid_stacks_a_single_column() {
        let grid = GridLayout::new(0.0, 0.0, 5.0, 10.0, 0);

        assert_eq!(grid.position(0), Position::new(0.0, 0.0));
        assert_eq!(grid.position(4), Position::new(0.0, 40.0));
    }

    #[test]
    fn grid_is_deterministic() {
        let grid = GridLayout::new(0.0, 0.0, 5.0, 10.0, 3);
        for index in 0..18 {
            assert_eq!(grid.position(index), grid.position(index));
        }
    }

    #[test]
    fn constant_position_never_moves() {
        let mut rng = ChaChaRng::seed_from_u64(1);
        let start = Position::new(1.0, 2.0);
        let next = MobilityModel::ConstantPosition.step(start, Duration::from_secs(10), &mut rng);
        assert_eq!(next, start);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        let bounds = Rectangle::new(-50.0, 50.0, -50.0, 50.0);
        let model = MobilityModel::RandomWalk2d { bounds };
        let mut rng = ChaChaRng::seed_from_u64(42);

        let mut position = Position::new(0.0, 0.0);
        for _ in 0..1_000 {
            position = model.step(position, Duration::from_secs(1), &mut rng);
            assert!(bounds.contains(position), "escaped bounds at {position}");
        }
    }

    #[test]
    fn random_walk_is_reproducible() {
        let bounds = Rectangle::new(-50.0, 50.0, -50.0, 50.0);
        let model = MobilityModel::RandomWalk2d { bounds };

        let walk = |seed: u64| {
            let mut rng = ChaChaRng::seed_from_u64(seed);
            let mut position = Position::new(0.0, 0.0);
            for _ in 0..10 {
                position = model.step(position, Duration::from_secs(1), &mut rng);
            }
            position
        };

        assert_eq!(walk(7), walk(7));
    }

    #[test]
    fn reflect_clamps_overshoot() {
        assert_eq!(reflect(55.0, -50.0, 50.0), 45.0);
        assert_eq!(reflect(-55.0, -50.0, 50.0), -45.0);
        assert_eq!(reflect(10.0, -50.0, 50.0), 10.0);
    }
}
