//! Environment persistence: one JSON document plus an explicit class
//! registry for map payloads.
//!
//! Every item is stored under its stable id; map payloads are keyed by
//! their class name and reconstructed through a [`PluginRegistry`]
//! passed into loading. The registry is built explicitly at startup
//! (usually via [`PluginRegistry::with_builtin_types`]) instead of
//! living in process-global state, so embedders can add their own map
//! classes without initialization-order concerns.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::{Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Transform;
use crate::environment::frame::FrameNode;
use crate::environment::{Environment, FrameId, MapId, MapNode, OperatorId};
use crate::error::{Error, Result};
use crate::map::{BandGrid, MapData, PointCloud, SurfaceGrid};
use crate::operators::{OperatorKind, OperatorNode};

/// Loader turning a persisted payload back into map data.
pub type MapLoader = fn(Value) -> Result<MapData>;

/// Class-name-keyed factory for map payloads.
pub struct PluginRegistry {
    loaders: HashMap<String, MapLoader>,
}

impl PluginRegistry {
    /// Create a registry with no loaders.
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Create a registry covering the map classes shipped with this
    /// crate.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register("grid.f32", |value| {
            Ok(MapData::GridF32(serde_json::from_value::<BandGrid<f32>>(
                value,
            )?))
        });
        registry.register("grid.u8", |value| {
            Ok(MapData::GridU8(serde_json::from_value::<BandGrid<u8>>(
                value,
            )?))
        });
        registry.register("surface", |value| {
            Ok(MapData::Surface(serde_json::from_value::<SurfaceGrid>(
                value,
            )?))
        });
        registry.register("cloud", |value| {
            Ok(MapData::Cloud(serde_json::from_value::<PointCloud>(value)?))
        });
        registry
    }

    /// Register a loader for a map class.
    pub fn register(&mut self, class: impl Into<String>, loader: MapLoader) {
        self.loaders.insert(class.into(), loader);
    }

    fn load(&self, class: &str, data: Value) -> Result<MapData> {
        match self.loaders.get(class) {
            Some(loader) => loader(data),
            None => Err(Error::UnknownClass(class.to_owned())),
        }
    }
}

impl Default for PluginRegistry {
    /// The built-in registry.
    fn default() -> Self {
        Self::with_builtin_types()
    }
}

#[derive(Serialize, Deserialize)]
struct FrameRecord {
    id: FrameId,
    parent: Option<FrameId>,
    translation: [f64; 3],
    /// Rotation quaternion as (x, y, z, w).
    rotation: [f64; 4],
}

#[derive(Serialize, Deserialize)]
struct MapRecord {
    id: MapId,
    class: String,
    frame: Option<FrameId>,
    data: Value,
}

#[derive(Serialize, Deserialize)]
struct OperatorRecord {
    id: OperatorId,
    inputs: Vec<MapId>,
    outputs: Vec<MapId>,
    kind: Value,
}

#[derive(Serialize, Deserialize)]
struct EnvironmentRecord {
    next_id: u64,
    root: FrameId,
    frames: Vec<FrameRecord>,
    maps: Vec<MapRecord>,
    operators: Vec<OperatorRecord>,
}

/// Save an environment to a JSON file.
pub fn save_environment(env: &Environment, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_environment(env, &mut BufWriter::new(file))
}

/// Write an environment as JSON.
pub fn write_environment<W: Write>(env: &Environment, writer: &mut W) -> Result<()> {
    let record = to_record(env)?;
    serde_json::to_writer_pretty(writer, &record)?;
    Ok(())
}

/// Load an environment from a JSON file.
pub fn load_environment(path: &Path, registry: &PluginRegistry) -> Result<Environment> {
    let file = std::fs::File::open(path)?;
    read_environment(&mut BufReader::new(file), registry)
}

/// Read an environment from JSON.
pub fn read_environment<R: Read>(reader: &mut R, registry: &PluginRegistry) -> Result<Environment> {
    let record: EnvironmentRecord = serde_json::from_reader(reader)?;
    from_record(record, registry)
}

fn to_record(env: &Environment) -> Result<EnvironmentRecord> {
    let mut frames = Vec::new();
    for id in env.frame_ids() {
        let node = env.frame(id)?;
        let transform = node.transform();
        let v = transform.translation.vector;
        let q = transform.rotation;
        frames.push(FrameRecord {
            id,
            parent: node.parent(),
            translation: [v.x, v.y, v.z],
            rotation: [q.i, q.j, q.k, q.w],
        });
    }

    let mut maps = Vec::new();
    for id in env.map_ids() {
        let data = env.map(id)?;
        let payload = match data {
            MapData::GridF32(grid) => serde_json::to_value(grid)?,
            MapData::GridU8(grid) => serde_json::to_value(grid)?,
            MapData::Surface(surface) => serde_json::to_value(surface)?,
            MapData::Cloud(cloud) => serde_json::to_value(cloud)?,
        };
        maps.push(MapRecord {
            id,
            class: data.class_name().to_owned(),
            frame: env.map_frame(id)?,
            data: payload,
        });
    }

    let mut operators = Vec::new();
    for id in env.operator_ids() {
        let node = env.operator(id)?;
        operators.push(OperatorRecord {
            id,
            inputs: node.inputs().to_vec(),
            outputs: node.outputs().to_vec(),
            kind: serde_json::to_value(node.kind())?,
        });
    }

    Ok(EnvironmentRecord {
        next_id: env.next_id,
        root: env.root(),
        frames,
        maps,
        operators,
    })
}

fn from_record(record: EnvironmentRecord, registry: &PluginRegistry) -> Result<Environment> {
    let EnvironmentRecord {
        next_id,
        root,
        frames: frame_records,
        maps: map_records,
        operators: operator_records,
    } = record;

    let mut frames = HashMap::new();
    for frame in &frame_records {
        let [x, y, z, w] = frame.rotation;
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
        let [tx, ty, tz] = frame.translation;
        let transform = Transform::from_parts(Translation3::new(tx, ty, tz), rotation);
        frames.insert(frame.id, FrameNode::new(transform, frame.parent));
    }
    // child lists are rebuilt in record (id) order
    for frame in &frame_records {
        if let Some(parent) = frame.parent {
            match frames.get_mut(&parent) {
                Some(node) => node.children.push(frame.id),
                None => {
                    return Err(Error::Format(format!(
                        "frame {} references missing parent {}",
                        frame.id, parent
                    )))
                }
            }
        }
    }
    if !frames.contains_key(&root) {
        return Err(Error::Format("root frame missing from document".into()));
    }

    let mut maps = HashMap::new();
    for map in map_records {
        if let Some(frame) = map.frame {
            if !frames.contains_key(&frame) {
                return Err(Error::Format(format!(
                    "map {} references missing frame {}",
                    map.id, frame
                )));
            }
        }
        let data = registry.load(&map.class, map.data)?;
        maps.insert(
            map.id,
            MapNode {
                data,
                frame: map.frame,
            },
        );
    }

    let mut operators = HashMap::new();
    for operator in operator_records {
        let kind: OperatorKind = serde_json::from_value(operator.kind)?;
        operators.insert(
            operator.id,
            OperatorNode {
                kind,
                inputs: operator.inputs,
                outputs: operator.outputs,
            },
        );
    }

    Ok(Environment {
        next_id,
        root,
        frames,
        maps,
        operators,
        listeners: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform;
    use crate::map::{bands, CellIndex, GridGeometry};
    use crate::operators::TraversabilityClassifier;
    use nalgebra::Point3;

    fn round_trip(env: &Environment) -> Environment {
        let mut buffer = Vec::new();
        write_environment(env, &mut buffer).unwrap();
        read_environment(&mut buffer.as_slice(), &PluginRegistry::with_builtin_types()).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_structure_and_data() {
        let mut env = Environment::new();
        let f1 = env.create_frame(transform::translation(0.0, 0.0, 0.5));
        let f2 = env.create_frame(transform::from_parts(
            nalgebra::Vector3::new(1.0, 2.0, 3.0),
            nalgebra::UnitQuaternion::from_euler_angles(0.0, 0.0, 1.2),
        ));
        env.set_parent(f2, f1).unwrap();

        let map = env.attach_map(bands::elevation_grid(GridGeometry::new(3, 2, 0.5, 0.5)));
        env.set_frame(map, f2).unwrap();
        let grid = env.grid_f32_mut(map).unwrap();
        grid.set(bands::ELEVATION_MAX, CellIndex::new(2, 1), 7.25);
        grid.set_no_data(bands::ELEVATION_MAX, -1000.0);

        let cloud_map = env.attach_map(MapData::Cloud(PointCloud::from_points(vec![
            Point3::new(0.1, 0.2, 0.3),
        ])));
        env.set_frame(cloud_map, f1).unwrap();

        let mut classifier = TraversabilityClassifier::default();
        classifier.set_max_step(map, bands::ELEVATION_MAX);
        let out = env.attach_map(bands::traversability_grid(GridGeometry::new(3, 2, 0.5, 0.5)));
        classifier.set_output(out, bands::TRAVERSABILITY);
        let op = env.attach_operator(classifier.into());

        let restored = round_trip(&env);

        // tree shape
        assert_eq!(restored.root(), env.root());
        assert_eq!(restored.parent(f2).unwrap(), Some(f1));
        assert_eq!(restored.children(f1).unwrap(), &[f2]);
        // transforms
        let t = restored.transform_to_parent(f2).unwrap();
        assert!((t.translation.vector - nalgebra::Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
        assert!((t.rotation.angle() - 1.2).abs() < 1e-12);
        // map binding and contents
        assert_eq!(restored.map_frame(map).unwrap(), Some(f2));
        let grid = restored.grid_f32(map).unwrap();
        assert_eq!(grid.get(bands::ELEVATION_MAX, CellIndex::new(2, 1)), Some(7.25));
        assert_eq!(grid.no_data(bands::ELEVATION_MAX), Some(-1000.0));
        // cloud contents
        assert_eq!(restored.cloud(cloud_map).unwrap().len(), 1);
        // operator wiring
        assert_eq!(restored.operator_inputs(op).unwrap(), &[map]);
        assert_eq!(restored.operator_outputs(op).unwrap(), &[out]);

        // ids keep flowing from where they stopped
        let mut restored = restored;
        let next = restored.create_frame(Transform::identity());
        assert!(next.raw() > op.raw());
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut env = Environment::new();
        env.attach_map(bands::occupancy_grid(GridGeometry::new(2, 2, 1.0, 1.0)));

        let mut buffer = Vec::new();
        write_environment(&env, &mut buffer).unwrap();

        let empty = PluginRegistry::new();
        assert!(matches!(
            read_environment(&mut buffer.as_slice(), &empty),
            Err(Error::UnknownClass(_))
        ));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let json = r#"{
            "next_id": 3,
            "root": 1,
            "frames": [
                {"id": 1, "parent": null, "translation": [0,0,0], "rotation": [0,0,0,1]},
                {"id": 2, "parent": 99, "translation": [0,0,0], "rotation": [0,0,0,1]}
            ],
            "maps": [],
            "operators": []
        }"#;
        let result = read_environment(
            &mut json.as_bytes(),
            &PluginRegistry::with_builtin_types(),
        );
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
