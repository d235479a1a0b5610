//! Declarative tunnel networks loaded from TOML.
//!
//! A scenario lists named tunnels with their placement, optional control
//! points and a sequence of edits, followed by junctions hung off tunnel
//! ends. Junction children are named `<parent>.<exit>` (for example
//! `main.left`) and may carry edits of their own.
//!
//! ```toml
//! [config]
//! noise_seed = 7
//!
//! [[tunnels]]
//! name = "main"
//! edits = [{ op = "drag", to = [1600.0, 0.0, 0.0] }]
//!
//! [[junctions]]
//! tunnel = "main"
//! kind = "right_left"
//!
//! [[junctions.children]]
//! exit = "left"
//! edits = [{ op = "drag", to = [900.0, 300.0, 0.0] }]
//! ```

use std::collections::BTreeMap;

use burrow_junction::{ExitDirection, JunctionKind};
use burrow_math::{Point3, Transform, Vec3};
use burrow_network::{
    MeshBuilder, MeshCollector, MeshTarget, Network, NetworkConfig, PathEdit, TunnelId,
};
use burrow_path::Path;
use burrow_section::SectionShape;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{BurrowError, Result};

/// A complete scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Network configuration.
    pub config: NetworkConfig,
    /// Root tunnels, built in order.
    pub tunnels: Vec<TunnelEntry>,
    /// Junctions, attached after every tunnel edit has run.
    pub junctions: Vec<JunctionEntry>,
}

/// A root tunnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelEntry {
    /// Unique name.
    pub name: String,
    /// World position of the path start.
    #[serde(default)]
    pub origin: [f64; 3],
    /// Heading of the local +X axis, degrees about +Z.
    #[serde(default)]
    pub yaw_degrees: f64,
    /// Local control points; the starter path when absent.
    #[serde(default)]
    pub points: Option<Vec<[f64; 3]>>,
    /// Edits applied after the first build.
    #[serde(default)]
    pub edits: Vec<EditEntry>,
}

/// One edit of a tunnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditEntry {
    /// Drag the free end to a local position, snapping if in range.
    Drag {
        /// Target position.
        to: [f64; 3],
    },
    /// Drag the free end by a local offset, snapping if in range.
    DragBy {
        /// Offset.
        by: [f64; 3],
    },
    /// Remove the last segment.
    Undo,
    /// Rebuild the whole tunnel.
    Reset,
    /// Change the cross-section of one segment.
    Resize {
        /// Segment index from the path start.
        segment: usize,
        /// New shape.
        shape: SectionShape,
    },
}

/// A junction on the free end of a tunnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionEntry {
    /// Name of the parent tunnel.
    pub tunnel: String,
    /// Exits to open.
    pub kind: JunctionKind,
    /// Edits of the spawned child tunnels.
    #[serde(default)]
    pub children: Vec<ChildEntry>,
}

/// Edits for the child tunnel leaving through one exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    /// Exit the child leaves through.
    pub exit: ExitDirection,
    /// Edits applied to the child.
    #[serde(default)]
    pub edits: Vec<EditEntry>,
}

/// A built scenario.
#[derive(Debug)]
pub struct ScenarioRun {
    /// The network.
    pub network: Network,
    /// World-space meshes of every section.
    pub meshes: MeshCollector,
    names: BTreeMap<String, TunnelId>,
}

/// Summary of one tunnel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunnelSummary {
    /// Tunnel name.
    pub name: String,
    /// Control points.
    pub points: usize,
    /// Segments.
    pub segments: usize,
    /// Arc length of the path.
    pub length: f64,
    /// Name of the tunnel the free end is snapped to.
    pub snapped_to: Option<String>,
    /// Kind of the junction on the free end.
    pub junction: Option<JunctionKind>,
}

/// Summary of one junction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JunctionSummary {
    /// Parent tunnel name.
    pub parent: Option<String>,
    /// Exits.
    pub kind: JunctionKind,
    /// Child tunnel names.
    pub children: Vec<String>,
}

/// Summary of a built scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Tunnels by name.
    pub tunnels: Vec<TunnelSummary>,
    /// Junctions in creation order of their parents.
    pub junctions: Vec<JunctionSummary>,
    /// Committed section meshes.
    pub meshes: usize,
    /// Triangles across all meshes.
    pub triangles: usize,
    /// Vertices across all meshes.
    pub vertices: usize,
}

fn point(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

fn exit_name(exit: ExitDirection) -> &'static str {
    match exit {
        ExitDirection::Straight => "straight",
        ExitDirection::Right => "right",
        ExitDirection::Left => "left",
    }
}

impl Scenario {
    /// Parse a scenario from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Build every tunnel, apply the edits and attach the junctions.
    pub fn run(&self) -> Result<ScenarioRun> {
        let network = Network::new(self.config.clone())?;
        let mut run = ScenarioRun {
            network,
            meshes: MeshCollector::new(),
            names: BTreeMap::new(),
        };

        for entry in &self.tunnels {
            if run.names.contains_key(&entry.name) {
                return Err(BurrowError::DuplicateName(entry.name.clone()));
            }
            let transform = Transform::placement(&point(entry.origin), entry.yaw_degrees.to_radians());
            let path = match &entry.points {
                Some(points) => {
                    Path::from_positions(&points.iter().copied().map(point).collect::<Vec<_>>())
                }
                None => Path::starter(),
            };
            let id = run.network.add_tunnel(transform, path);
            run.network.regenerate_all(id, &mut run.meshes)?;
            run.names.insert(entry.name.clone(), id);
        }

        for entry in &self.tunnels {
            let id = run.tunnel_id(&entry.name)?;
            for edit in &entry.edits {
                run.apply(id, edit)?;
            }
        }

        for entry in &self.junctions {
            let parent = run.tunnel_id(&entry.tunnel)?;
            let junction = run
                .network
                .add_junction(parent, entry.kind, &mut run.meshes)?;
            let children = run
                .network
                .junction(junction)
                .map(|j| j.children().to_vec())
                .unwrap_or_default();
            for (exit, child) in children {
                let name = format!("{}.{}", entry.tunnel, exit_name(exit));
                if run.names.insert(name.clone(), child).is_some() {
                    return Err(BurrowError::DuplicateName(name));
                }
            }
            for child in &entry.children {
                let name = format!("{}.{}", entry.tunnel, exit_name(child.exit));
                let id = run.tunnel_id(&name)?;
                for edit in &child.edits {
                    run.apply(id, edit)?;
                }
            }
        }

        info!(
            tunnels = run.names.len(),
            meshes = run.meshes.len(),
            "scenario built"
        );
        Ok(run)
    }
}

impl ScenarioRun {
    /// Handle of a named tunnel.
    pub fn tunnel_id(&self, name: &str) -> Result<TunnelId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| BurrowError::UnknownName(name.to_string()))
    }

    /// Names of all tunnels, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    fn apply(&mut self, id: TunnelId, edit: &EditEntry) -> Result<()> {
        debug!(?id, ?edit, "scenario edit");
        match edit {
            EditEntry::Drag { to } => {
                self.network.drag_end(id, point(*to), &mut self.meshes)?;
            }
            EditEntry::DragBy { by } => {
                let end = self
                    .network
                    .tunnel(id)
                    .and_then(|t| t.path().last_point())
                    .map(|p| p.position)
                    .unwrap_or_else(Point3::origin);
                let to = end + Vec3::new(by[0], by[1], by[2]);
                self.network.drag_end(id, to, &mut self.meshes)?;
            }
            EditEntry::Undo | EditEntry::Reset => {
                let edit = if matches!(edit, EditEntry::Undo) {
                    PathEdit::Undo
                } else {
                    PathEdit::Reset
                };
                let outcome = self.network.edit_path(id, edit)?;
                for &segment in &outcome.discarded {
                    self.meshes
                        .discard(MeshTarget::TunnelSegment { tunnel: id, segment });
                }
                if let Some(range) = outcome.rebuild {
                    self.network
                        .regenerate(id, range, Default::default(), &mut self.meshes)?;
                }
            }
            EditEntry::Resize { segment, shape } => {
                self.network
                    .resize(id, *segment, *shape, &mut self.meshes)?;
            }
        }
        Ok(())
    }

    /// Summarize the network.
    pub fn report(&self) -> ScenarioReport {
        let by_id: BTreeMap<TunnelId, &str> = self
            .names
            .iter()
            .map(|(name, &id)| (id, name.as_str()))
            .collect();
        let name_of = |id: TunnelId| by_id.get(&id).map(|n| n.to_string());

        let mut tunnels = Vec::new();
        let mut junctions = Vec::new();
        for (name, &id) in &self.names {
            let Some(tunnel) = self.network.tunnel(id) else {
                continue;
            };
            let junction = tunnel.junction().and_then(|j| self.network.junction(j));
            tunnels.push(TunnelSummary {
                name: name.clone(),
                points: tunnel.path().len(),
                segments: tunnel.path().segment_count(),
                length: tunnel.path().total_length(),
                snapped_to: tunnel.end_connection().and_then(|c| name_of(c.other)),
                junction: junction.map(|j| j.kind()),
            });
            if let Some(junction) = junction {
                junctions.push(JunctionSummary {
                    parent: junction.parent().and_then(&name_of),
                    kind: junction.kind(),
                    children: junction
                        .children()
                        .iter()
                        .filter_map(|&(_, child)| name_of(child))
                        .collect(),
                });
            }
        }

        let combined = self.meshes.combined();
        ScenarioReport {
            tunnels,
            junctions,
            meshes: self.meshes.len(),
            triangles: combined.num_triangles(),
            vertices: combined.num_vertices(),
        }
    }
}
