//! Terrain classification from slope, step and force layers.
//!
//! Produces a discrete class raster from up to three optional scalar
//! inputs. Class 0 is unknown, class 1 is obstacle, and classes from
//! [`CUSTOM_CLASSES`] upward are equal-width speed bins. A post-pass
//! closes every traversable corridor narrower than the configured
//! minimum width by growing obstacle regions along precomputed radial
//! rays.

use serde::{Deserialize, Serialize};

use crate::environment::{Environment, MapId};
use crate::error::{Error, Result};
use crate::map::{BandRef, GridGeometry};

/// Class id for cells without enough input data.
pub const CLASS_UNKNOWN: u8 = 0;
/// Class id for untraversable cells.
pub const CLASS_OBSTACLE: u8 = 1;
/// First speed-class id; class `CUSTOM_CLASSES + k` is the k-th of the
/// configured equal-width speed bins.
pub const CUSTOM_CLASSES: u8 = 2;

/// In-progress marker used by the closing pass. Reserved outside the
/// admissible class range; see [`MAX_CLASS_COUNT`].
const MARK: u8 = 255;

/// Upper bound on the configurable class count, keeping every speed
/// class id strictly below the closing-pass marker.
pub const MAX_CLASS_COUNT: usize = 250;

/// Classification thresholds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TraversabilityConfig {
    /// Tractive force spent fighting gravity per unit of |sin(slope)|.
    /// Default: 1.0
    pub weight_force: f64,

    /// Available force at (or above) which a cell gets full speed.
    /// Default: 1.0
    pub force_threshold: f64,

    /// Number of discrete speed classes.
    /// Default: 10
    pub class_count: usize,

    /// Narrowest corridor left traversable by the closing pass
    /// (world units).
    /// Default: 0.5
    pub min_width: f64,

    /// Largest vertical step the chassis clears; taller steps are
    /// obstacles (world units). Must be positive whenever a max-step
    /// band is wired.
    /// Default: 0.1
    pub ground_clearance: f64,
}

impl Default for TraversabilityConfig {
    fn default() -> Self {
        Self {
            weight_force: 1.0,
            force_threshold: 1.0,
            class_count: 10,
            min_width: 0.5,
            ground_clearance: 0.1,
        }
    }
}

/// Scalar terrain layers → discrete traversability classes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraversabilityClassifier {
    /// Classification thresholds; may be retuned between runs.
    pub config: TraversabilityConfig,
    slope: Option<BandRef>,
    max_step: Option<BandRef>,
    max_force: Option<BandRef>,
    output: Option<BandRef>,
}

impl TraversabilityClassifier {
    /// Create an unwired classifier.
    pub fn new(config: TraversabilityConfig) -> Self {
        Self {
            config,
            slope: None,
            max_step: None,
            max_force: None,
            output: None,
        }
    }

    /// Wire the slope input band (radians per cell).
    pub fn set_slope(&mut self, map: MapId, band: impl Into<String>) {
        self.slope = Some(BandRef::new(map, band));
    }

    /// Wire the max-step input band.
    pub fn set_max_step(&mut self, map: MapId, band: impl Into<String>) {
        self.max_step = Some(BandRef::new(map, band));
    }

    /// Wire the max-force input band.
    pub fn set_max_force(&mut self, map: MapId, band: impl Into<String>) {
        self.max_force = Some(BandRef::new(map, band));
    }

    /// Wire the output class band.
    pub fn set_output(&mut self, map: MapId, band: impl Into<String>) {
        self.output = Some(BandRef::new(map, band));
    }

    /// The wired slope band
    #[inline]
    pub fn slope(&self) -> Option<&BandRef> {
        self.slope.as_ref()
    }

    /// The wired max-step band
    #[inline]
    pub fn max_step(&self) -> Option<&BandRef> {
        self.max_step.as_ref()
    }

    /// The wired max-force band
    #[inline]
    pub fn max_force(&self) -> Option<&BandRef> {
        self.max_force.as_ref()
    }

    /// The wired output band
    #[inline]
    pub fn output(&self) -> Option<&BandRef> {
        self.output.as_ref()
    }

    pub(crate) fn input_maps(&self) -> Vec<MapId> {
        let mut maps = Vec::new();
        for band in [&self.slope, &self.max_step, &self.max_force]
            .into_iter()
            .flatten()
        {
            if !maps.contains(&band.map) {
                maps.push(band.map);
            }
        }
        maps
    }

    pub(crate) fn output_maps(&self) -> Vec<MapId> {
        self.output.iter().map(|band| band.map).collect()
    }
}

impl Default for TraversabilityClassifier {
    fn default() -> Self {
        Self::new(TraversabilityConfig::default())
    }
}

/// One resolved input layer: dense data plus the value standing for
/// "no measurement".
struct InputBand<'a> {
    data: &'a [f32],
    no_data: f32,
}

impl InputBand<'_> {
    #[inline]
    fn value(&self, index: usize) -> Option<f64> {
        let v = self.data[index];
        (v != self.no_data).then_some(v as f64)
    }
}

fn resolve_input<'a>(
    env: &'a Environment,
    band: Option<&BandRef>,
    output_geometry: &GridGeometry,
) -> Result<Option<InputBand<'a>>> {
    let Some(band_ref) = band else {
        return Ok(None);
    };
    let grid = env.grid_f32(band_ref.map)?;
    if grid.geometry().width() != output_geometry.width()
        || grid.geometry().height() != output_geometry.height()
    {
        return Err(Error::Configuration(format!(
            "input band \"{}\" does not match the output grid dimensions",
            band_ref.band
        )));
    }
    let data = grid.band(&band_ref.band).ok_or_else(|| Error::BandMissing {
        map: band_ref.map,
        band: band_ref.band.clone(),
    })?;
    // a band without a sentinel has no unknown cells; -inf can never
    // equal a stored value
    let no_data = grid.no_data(&band_ref.band).unwrap_or(f32::NEG_INFINITY);
    Ok(Some(InputBand { data, no_data }))
}

pub(crate) fn update(env: &mut Environment, op: &TraversabilityClassifier) -> Result<()> {
    let output = op
        .output
        .as_ref()
        .ok_or_else(|| Error::Configuration("no output band set".into()))?;
    let config = &op.config;
    if config.class_count == 0 || config.class_count > MAX_CLASS_COUNT {
        return Err(Error::Configuration(format!(
            "class_count must be within 1..={}",
            MAX_CLASS_COUNT
        )));
    }

    let geometry = *env.grid_u8(output.map)?.geometry();

    let mut result = {
        let slope = resolve_input(env, op.slope.as_ref(), &geometry)?;
        let max_step = resolve_input(env, op.max_step.as_ref(), &geometry)?;
        let max_force = resolve_input(env, op.max_force.as_ref(), &geometry)?;

        if slope.is_none() && max_step.is_none() && max_force.is_none() {
            return Err(Error::Configuration("no input band configured".into()));
        }
        if max_step.is_some() && config.ground_clearance == 0.0 {
            return Err(Error::Configuration(
                "a max_step band is wired but ground_clearance is zero".into(),
            ));
        }

        classify(&slope, &max_step, &max_force, config, &geometry)
    };

    close_narrow_passages(&mut result, &geometry, config.min_width);

    let obstacles = result.iter().filter(|&&v| v == CLASS_OBSTACLE).count();
    let grid = env.grid_u8_mut(output.map)?;
    grid.set_no_data(&output.band, CLASS_UNKNOWN);
    grid.band_mut(&output.band).copy_from_slice(&result);
    log::debug!(
        "traversability: classified {} cells, {} obstacles after closing",
        result.len(),
        obstacles
    );
    Ok(())
}

fn classify(
    slope: &Option<InputBand<'_>>,
    max_step: &Option<InputBand<'_>>,
    max_force: &Option<InputBand<'_>>,
    config: &TraversabilityConfig,
    geometry: &GridGeometry,
) -> Vec<u8> {
    let mut result = vec![CLASS_UNKNOWN; geometry.cell_count()];
    for (index, cell) in result.iter_mut().enumerate() {
        let slope_value = slope.as_ref().and_then(|band| band.value(index));
        let step_value = max_step.as_ref().and_then(|band| band.value(index));
        let force_value = max_force.as_ref().and_then(|band| band.value(index));

        // max_step is an on/off threshold against the chassis clearance
        if let Some(step) = step_value {
            if step > config.ground_clearance {
                *cell = CLASS_OBSTACLE;
                continue;
            }
        }
        // a configured force or slope layer without a measurement here
        // leaves the cell unknown
        if (max_force.is_some() && force_value.is_none())
            || (slope.is_some() && slope_value.is_none())
        {
            *cell = CLASS_UNKNOWN;
            continue;
        }

        // estimate the force left for propulsion and map the ratio to
        // the threshold linearly onto the speed classes
        let mut available = config.force_threshold;
        if let Some(force) = force_value {
            available = force;
        }
        if let Some(slope) = slope_value {
            available -= config.weight_force * slope.sin().abs();
        }

        if available <= 0.0 {
            *cell = CLASS_OBSTACLE;
        } else {
            let mut speed = 1.0;
            if available < config.force_threshold {
                speed = available / config.force_threshold;
            }
            let class = (speed * config.class_count as f64).round_ties_even() as u8;
            *cell = CUSTOM_CLASSES + class;
        }
    }
    result
}

/// Grow obstacle regions so that no traversable corridor narrower than
/// `min_width` survives: every cell on a straight approach shorter
/// than `min_width` between two obstacle cells becomes an obstacle.
fn close_narrow_passages(data: &mut [u8], geometry: &GridGeometry, min_width: f64) {
    let lut = RadialLut::new(min_width, geometry.scale_x(), geometry.scale_y());
    let width = geometry.width();
    let height = geometry.height();

    for row in 0..height {
        for col in 0..width {
            if data[row * width + col] == CLASS_OBSTACLE {
                lut.mark_all_radius(data, width, height, col, row, CLASS_OBSTACLE, MARK);
            }
        }
    }
    for value in data.iter_mut() {
        if *value == MARK {
            *value = CLASS_OBSTACLE;
        }
    }
}

/// Precomputed disk overlay. For every offset cell within `distance`
/// of the center, `parents` holds the next offset one step closer to
/// the center along a coarse digital ray: a unit step on the dominant
/// axis, a rounded proportional step on the minor axis.
struct RadialLut {
    width: usize,
    height: usize,
    center_col: i32,
    center_row: i32,
    parents: Vec<Option<(i32, i32)>>,
    in_disk: Vec<bool>,
}

impl RadialLut {
    fn new(distance: f64, scale_x: f64, scale_y: f64) -> Self {
        let width = 2 * (distance / scale_x).ceil() as usize + 1;
        let height = 2 * (distance / scale_y).ceil() as usize + 1;
        let center_col = (width / 2) as i32;
        let center_row = (height / 2) as i32;
        let radius_sq = distance * distance;

        let mut parents = vec![None; width * height];
        let mut in_disk = vec![false; width * height];
        for row in 0..height as i32 {
            for col in 0..width as i32 {
                let dx = center_col - col;
                let dy = center_row - row;
                if dx == 0 && dy == 0 {
                    continue;
                }
                let index = row as usize * width + col as usize;
                let d_sq =
                    (dx as f64 * scale_x).powi(2) + (dy as f64 * scale_y).powi(2);
                in_disk[index] = d_sq < radius_sq;
                parents[index] = Some(if dx.abs() > dy.abs() {
                    (
                        col + dx.signum(),
                        row + (dy as f64 / dx.abs() as f64).round_ties_even() as i32,
                    )
                } else {
                    (
                        col + (dx as f64 / dy.abs() as f64).round_ties_even() as i32,
                        row + dy.signum(),
                    )
                });
            }
        }
        Self {
            width,
            height,
            center_col,
            center_row,
            parents,
            in_disk,
        }
    }

    /// Overlay the disk on `data` centered at the given grid cell and
    /// trace a ray back to the center from every in-disk cell whose
    /// value equals `expected`.
    fn mark_all_radius(
        &self,
        data: &mut [u8],
        grid_width: usize,
        grid_height: usize,
        center_col: usize,
        center_row: usize,
        expected: u8,
        mark: u8,
    ) {
        let base_col = center_col as i32 - self.center_col;
        let base_row = center_row as i32 - self.center_row;
        for row in 0..self.height {
            let grid_row = base_row + row as i32;
            if grid_row < 0 || grid_row >= grid_height as i32 {
                continue;
            }
            for col in 0..self.width {
                let grid_col = base_col + col as i32;
                if grid_col < 0 || grid_col >= grid_width as i32 {
                    continue;
                }
                let grid_index = grid_row as usize * grid_width + grid_col as usize;
                if self.in_disk[row * self.width + col] && data[grid_index] == expected {
                    log::trace!(
                        "closing pass: obstacle pair ({}, {}) and ({}, {})",
                        center_col,
                        center_row,
                        grid_col,
                        grid_row
                    );
                    self.mark_single_radius(
                        data, grid_width, center_col, center_row, col, row, expected, mark,
                    );
                }
            }
        }
    }

    /// Walk the parent chain from one LUT cell to the center, marking
    /// every traversed grid cell that does not carry `expected`.
    #[allow(clippy::too_many_arguments)]
    fn mark_single_radius(
        &self,
        data: &mut [u8],
        grid_width: usize,
        center_col: usize,
        center_row: usize,
        col: usize,
        row: usize,
        expected: u8,
        mark: u8,
    ) {
        let mut cursor = self.parents[row * self.width + col];
        while let Some((c, r)) = cursor {
            let grid_col = center_col as i32 + c - self.center_col;
            let grid_row = center_row as i32 + r - self.center_row;
            // chain cells lie in the rectangle spanned by the start
            // cell and the center, both inside the grid
            debug_assert!(grid_col >= 0 && (grid_col as usize) < grid_width);
            debug_assert!(grid_row >= 0);
            let index = grid_row as usize * grid_width + grid_col as usize;
            if data[index] != expected {
                data[index] = mark;
            }
            cursor = self.parents[r as usize * self.width + c as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{bands, BandGrid, CellIndex, GridGeometry, MapData};

    #[test]
    fn test_lut_geometry() {
        let lut = RadialLut::new(1.0, 0.5, 0.5);
        assert_eq!(lut.width, 5);
        assert_eq!(lut.height, 5);
        assert_eq!((lut.center_col, lut.center_row), (2, 2));

        // the center itself has no parent and is not in the disk
        let center = 2 * lut.width + 2;
        assert!(lut.parents[center].is_none());
        assert!(!lut.in_disk[center]);

        // direct neighbors are within the radius, the far corner is not
        assert!(lut.in_disk[2 * lut.width + 1]);
        assert!(!lut.in_disk[0]);
    }

    #[test]
    fn test_lut_chains_reach_center() {
        let lut = RadialLut::new(0.7, 0.1, 0.2);
        for row in 0..lut.height {
            for col in 0..lut.width {
                let mut cursor = Some((col as i32, row as i32));
                let mut steps = 0;
                while let Some((c, r)) = cursor {
                    cursor = lut.parents[r as usize * lut.width + c as usize];
                    steps += 1;
                    assert!(steps <= lut.width + lut.height, "chain must terminate");
                }
            }
        }
    }

    /// Builds an environment with one f32 input grid, one u8 output
    /// grid (both on the root frame) and a wired classifier.
    fn setup(
        width: usize,
        height: usize,
        scale: f64,
        config: TraversabilityConfig,
        fill_step: impl Fn(&mut BandGrid<f32>),
    ) -> (Environment, crate::environment::MapId, crate::environment::OperatorId) {
        let mut env = Environment::new();
        let geometry = GridGeometry::new(width, height, scale, scale);

        let mut step_grid: BandGrid<f32> = BandGrid::new(geometry);
        fill_step(&mut step_grid);
        let input = env.attach_map(MapData::GridF32(step_grid));
        env.set_frame(input, env.root()).unwrap();

        let output = env.attach_map(bands::traversability_grid(geometry));
        env.set_frame(output, env.root()).unwrap();

        let mut classifier = TraversabilityClassifier::new(config);
        classifier.set_max_step(input, bands::MAX_STEP);
        classifier.set_output(output, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());
        (env, output, op)
    }

    fn class_at(env: &Environment, map: crate::environment::MapId, col: usize, row: usize) -> u8 {
        env.grid_u8(map)
            .unwrap()
            .get(bands::TRAVERSABILITY, crate::map::CellIndex::new(col, row))
            .unwrap()
    }

    #[test]
    fn test_isolated_step_becomes_obstacle() {
        let config = TraversabilityConfig {
            min_width: 0.05,
            ..TraversabilityConfig::default()
        };
        let (mut env, output, op) = setup(5, 5, 0.1, config, |grid| {
            grid.set(bands::MAX_STEP, crate::map::CellIndex::new(2, 2), 0.5);
        });
        env.update_all(op).unwrap();

        assert_eq!(class_at(&env, output, 2, 2), CLASS_OBSTACLE);
        // flat cells with no force/slope layers get full speed
        assert_eq!(class_at(&env, output, 0, 0), CUSTOM_CLASSES + 10);
    }

    #[test]
    fn test_missing_inputs_stay_unknown() {
        let mut env = Environment::new();
        let geometry = GridGeometry::new(4, 4, 0.1, 0.1);

        let mut slope_grid: BandGrid<f32> = BandGrid::new(geometry);
        slope_grid.set_no_data(bands::SLOPE, -1.0);
        slope_grid.fill(bands::SLOPE, -1.0);
        let input = env.attach_map(MapData::GridF32(slope_grid));
        env.set_frame(input, env.root()).unwrap();

        let output = env.attach_map(bands::traversability_grid(geometry));
        env.set_frame(output, env.root()).unwrap();

        let mut classifier = TraversabilityClassifier::default();
        classifier.set_slope(input, bands::SLOPE);
        classifier.set_output(output, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());
        env.update_all(op).unwrap();

        let grid = env.grid_u8(output).unwrap();
        assert!(grid
            .band(bands::TRAVERSABILITY)
            .unwrap()
            .iter()
            .all(|&v| v == CLASS_UNKNOWN));
        assert_eq!(grid.no_data(bands::TRAVERSABILITY), Some(CLASS_UNKNOWN));
    }

    #[test]
    fn test_steep_slope_becomes_obstacle() {
        let mut env = Environment::new();
        let geometry = GridGeometry::new(2, 2, 0.1, 0.1);

        let mut slope_grid: BandGrid<f32> = BandGrid::new(geometry);
        slope_grid.set_no_data(bands::SLOPE, -1.0);
        // ~72 degrees: weight_force * sin exceeds the force threshold
        slope_grid.fill(bands::SLOPE, 1.26);
        let input = env.attach_map(MapData::GridF32(slope_grid));
        env.set_frame(input, env.root()).unwrap();

        let output = env.attach_map(bands::traversability_grid(geometry));
        env.set_frame(output, env.root()).unwrap();

        let config = TraversabilityConfig {
            weight_force: 2.0,
            force_threshold: 1.0,
            min_width: 0.05,
            ..TraversabilityConfig::default()
        };
        let mut classifier = TraversabilityClassifier::new(config);
        classifier.set_slope(input, bands::SLOPE);
        classifier.set_output(output, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());
        env.update_all(op).unwrap();

        assert_eq!(class_at(&env, output, 0, 0), CLASS_OBSTACLE);
    }

    #[test]
    fn test_narrow_corridor_collapses() {
        // two obstacle walls 3 cells apart (0.3 m), corridor rows 4-5
        let config = TraversabilityConfig {
            min_width: 0.35,
            ..TraversabilityConfig::default()
        };
        let (mut env, output, op) = setup(21, 10, 0.1, config, |grid| {
            for col in 2..19 {
                grid.set(bands::MAX_STEP, crate::map::CellIndex::new(col, 3), 0.5);
                grid.set(bands::MAX_STEP, crate::map::CellIndex::new(col, 6), 0.5);
            }
        });
        env.update_all(op).unwrap();

        for col in 2..19 {
            assert_eq!(class_at(&env, output, col, 4), CLASS_OBSTACLE);
            assert_eq!(class_at(&env, output, col, 5), CLASS_OBSTACLE);
        }
        // outside the walls stays traversable
        assert_eq!(class_at(&env, output, 10, 1), CUSTOM_CLASSES + 10);
        assert_eq!(class_at(&env, output, 10, 8), CUSTOM_CLASSES + 10);
    }

    #[test]
    fn test_wide_corridor_keeps_center() {
        // walls 6 cells apart (0.6 m) with min_width 0.35
        let config = TraversabilityConfig {
            min_width: 0.35,
            ..TraversabilityConfig::default()
        };
        let (mut env, output, op) = setup(21, 13, 0.1, config, |grid| {
            for col in 2..19 {
                grid.set(bands::MAX_STEP, crate::map::CellIndex::new(col, 3), 0.5);
                grid.set(bands::MAX_STEP, crate::map::CellIndex::new(col, 9), 0.5);
            }
        });
        env.update_all(op).unwrap();

        // the corridor center line survives the closing pass
        for col in 2..19 {
            assert_eq!(class_at(&env, output, col, 6), CUSTOM_CLASSES + 10);
        }
    }

    #[test]
    fn test_configuration_errors() {
        let geometry = GridGeometry::new(2, 2, 0.1, 0.1);
        let mut env = Environment::new();
        let output = env.attach_map(bands::traversability_grid(geometry));
        env.set_frame(output, env.root()).unwrap();

        // no output wired
        let op = env.attach_operator(TraversabilityClassifier::default().into());
        assert!(matches!(env.update_all(op), Err(Error::Configuration(_))));

        // output but no input band
        let mut classifier = TraversabilityClassifier::default();
        classifier.set_output(output, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());
        assert!(matches!(env.update_all(op), Err(Error::Configuration(_))));

        // step band with degenerate clearance
        let input = env.attach_map(MapData::GridF32({
            let mut g: BandGrid<f32> = BandGrid::new(geometry);
            g.band_mut(bands::MAX_STEP);
            g
        }));
        let mut classifier = TraversabilityClassifier::new(TraversabilityConfig {
            ground_clearance: 0.0,
            ..TraversabilityConfig::default()
        });
        classifier.set_max_step(input, bands::MAX_STEP);
        classifier.set_output(output, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());
        assert!(matches!(env.update_all(op), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_reconfigure_between_runs() {
        let (mut env, output, op) = setup(
            5,
            5,
            0.1,
            TraversabilityConfig {
                min_width: 0.05,
                ..TraversabilityConfig::default()
            },
            |grid| {
                grid.set(bands::MAX_STEP, crate::map::CellIndex::new(2, 2), 0.15);
            },
        );
        env.update_all(op).unwrap();
        assert_eq!(class_at(&env, output, 2, 2), CLASS_OBSTACLE);

        // a taller clearance clears the same step on the next run
        env.reconfigure_operator(op, |kind| {
            if let crate::operators::OperatorKind::Traversability(c) = kind {
                c.config.ground_clearance = 0.2;
            }
        })
        .unwrap();
        env.update_all(op).unwrap();
        assert_eq!(class_at(&env, output, 2, 2), CUSTOM_CLASSES + 10);
    }

    #[test]
    fn test_input_edges_recorded() {
        let geometry = GridGeometry::new(2, 2, 0.1, 0.1);
        let mut env = Environment::new();
        let slope = env.attach_map(MapData::GridF32(BandGrid::new(geometry)));
        let force = env.attach_map(MapData::GridF32(BandGrid::new(geometry)));
        let output = env.attach_map(bands::traversability_grid(geometry));

        let mut classifier = TraversabilityClassifier::default();
        classifier.set_slope(slope, bands::SLOPE);
        classifier.set_max_force(force, bands::MAX_FORCE);
        classifier.set_output(output, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());

        assert_eq!(env.operator_inputs(op).unwrap(), &[slope, force]);
        assert_eq!(env.operator_outputs(op).unwrap(), &[output]);
    }
}
