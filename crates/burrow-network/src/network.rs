//! The tunnel registry and its edit pipeline.

use burrow_junction::{ExitDirection, ExitRings, JunctionGenerator, JunctionKind, JunctionRequest};
use burrow_math::{normalize_or_zero, rotate_yaw, yaw_of, Point3, Transform, Vec3};
use burrow_path::{DragOutcome, Path, UndoOutcome};
use burrow_section::{
    seam, DeformationSource, KeyedProfiles, NoiseField, Ring, SectionGenerator, SectionShape,
    SeamQuery, SegmentRequest, SideMask, TaperPlan,
};
use slotmap::SlotMap;
use tracing::{debug, info, trace};

use crate::{
    Connection, EditOutcome, GeneratedSegment, Junction, JunctionId, MeshBuilder, MeshTarget,
    NetworkConfig, NetworkError, PathEdit, PathEnd, RebuildRange, RegenerateOptions, Result,
    Tunnel, TunnelId, TunnelOrigin,
};

/// Result of [`Network::drag_end`].
#[derive(Debug, Clone)]
pub struct DragReport {
    /// What the edit did.
    pub outcome: EditOutcome,
    /// The pairing made by snapping, if any.
    pub connection: Option<Connection>,
    /// Segments regenerated.
    pub generated: Vec<GeneratedSegment>,
}

/// A set of tunnels and junctions sharing one configuration.
///
/// Tunnels and junctions refer to each other through [`TunnelId`] and
/// [`JunctionId`] handles; all mutation goes through `&mut self`.
pub struct Network {
    pub(crate) config: NetworkConfig,
    pub(crate) deformation: Box<dyn DeformationSource>,
    pub(crate) profiles: KeyedProfiles,
    pub(crate) tunnels: SlotMap<TunnelId, Tunnel>,
    pub(crate) junctions: SlotMap<JunctionId, Junction>,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("config", &self.config)
            .field("tunnels", &self.tunnels.len())
            .field("junctions", &self.junctions.len())
            .finish()
    }
}

impl Network {
    /// Create an empty network deformed by seeded Perlin noise.
    pub fn new(config: NetworkConfig) -> Result<Self> {
        let noise = NoiseField::new(config.noise_seed);
        Self::with_deformation(config, Box::new(noise))
    }

    /// Create an empty network with a custom deformation source.
    pub fn with_deformation(
        config: NetworkConfig,
        deformation: Box<dyn DeformationSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            deformation,
            profiles: KeyedProfiles::default(),
            tunnels: SlotMap::with_key(),
            junctions: SlotMap::with_key(),
        })
    }

    /// Replace the roundness and rotation-blend curves.
    pub fn set_profiles(&mut self, profiles: KeyedProfiles) {
        self.profiles = profiles;
    }

    /// Active configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Look up a tunnel.
    pub fn tunnel(&self, id: TunnelId) -> Option<&Tunnel> {
        self.tunnels.get(id)
    }

    /// Look up a junction.
    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junctions.get(id)
    }

    /// All tunnels.
    pub fn tunnels(&self) -> impl Iterator<Item = (TunnelId, &Tunnel)> {
        self.tunnels.iter()
    }

    /// All junctions.
    pub fn junctions(&self) -> impl Iterator<Item = (JunctionId, &Junction)> {
        self.junctions.iter()
    }

    pub(crate) fn get(&self, id: TunnelId) -> Result<&Tunnel> {
        self.tunnels.get(id).ok_or(NetworkError::UnknownTunnel(id))
    }

    pub(crate) fn get_mut(&mut self, id: TunnelId) -> Result<&mut Tunnel> {
        self.tunnels.get_mut(id).ok_or(NetworkError::UnknownTunnel(id))
    }

    /// Register a free-standing tunnel. Nothing is generated yet.
    pub fn add_tunnel(&mut self, transform: Transform, path: Path) -> TunnelId {
        let shape = self.config.shape;
        let id = self
            .tunnels
            .insert(Tunnel::new(TunnelOrigin::Root, transform, path, shape));
        debug!(?id, "tunnel added");
        id
    }

    /// Rebuild every segment of a tunnel.
    pub fn regenerate_all(
        &mut self,
        id: TunnelId,
        builder: &mut dyn MeshBuilder,
    ) -> Result<Vec<GeneratedSegment>> {
        let count = self.get(id)?.path.segment_count();
        self.regenerate(id, RebuildRange::all(count), RegenerateOptions::default(), builder)
    }

    /// Rebuild a range of a tunnel's segments and hand them to `builder`.
    ///
    /// Segments run from the path start towards the free end so each one can
    /// replay the end ring its predecessor just cached. Missing ends before
    /// the range are recomputed first. Degenerate segments are skipped.
    pub fn regenerate(
        &mut self,
        id: TunnelId,
        range: RebuildRange,
        options: RegenerateOptions,
        builder: &mut dyn MeshBuilder,
    ) -> Result<Vec<GeneratedSegment>> {
        let tunnel = self.get(id)?;
        if tunnel.path.is_degenerate() {
            return Err(NetworkError::DegeneratePath(id));
        }
        let count = tunnel.path.segment_count();
        let segments = range.segments(count);
        let start_seed = self.start_seed(id);
        let end_seed = self.end_seed(id);
        let start_taper = self.start_taper(id);
        let end_taper = self.end_taper(id);
        trace!(?id, ?segments, "regenerating tunnel");

        let layout = self.config.layout;
        let generator = SectionGenerator::new(
            layout,
            &self.config.generation,
            self.deformation.as_ref(),
            &self.profiles,
        );
        let tunnel = self
            .tunnels
            .get_mut(id)
            .ok_or(NetworkError::UnknownTunnel(id))?;

        // Recompute missing ends ahead of the range without emitting meshes.
        let mut warm = segments.start;
        while warm > 0 && tunnel.ends.get(warm - 1).is_none() {
            warm -= 1;
        }
        if warm < segments.start {
            debug!(?id, from = warm, to = segments.start, "recomputing missing segment ends");
        }
        for segment in warm..segments.start {
            let plan = seam::plan(
                &tunnel.ends,
                SeamQuery {
                    segment,
                    junction_at_end: tunnel.junction.is_some(),
                    start_seed: if segment == 0 { start_seed.clone() } else { None },
                    ..Default::default()
                },
            );
            let request = SegmentRequest {
                path: &tunnel.path,
                segment,
                shape: tunnel.shape_for(segment),
                taper: TaperPlan {
                    start: if segment == 0 { start_taper } else { SideMask::NONE },
                    end: SideMask::NONE,
                },
                start: plan.start,
                end: plan.end,
            };
            if let Some(section) = generator.generate(&request) {
                tunnel.ends.store(segment, section.end(&layout));
            }
        }

        let mut generated = Vec::new();
        for segment in segments.clone() {
            let is_tunnel_last = segment + 1 == count;
            let query = SeamQuery {
                segment,
                is_tunnel_last,
                is_last_in_range: segment + 1 == segments.end,
                single_point_update: options.single_point_update,
                junction_at_end: tunnel.junction.is_some(),
                start_seed: if segment == 0 { start_seed.clone() } else { None },
                end_seed: if is_tunnel_last { end_seed.clone() } else { None },
            };
            let plan = seam::plan(&tunnel.ends, query);
            let request = SegmentRequest {
                path: &tunnel.path,
                segment,
                shape: tunnel.shape_for(segment),
                taper: TaperPlan {
                    start: if segment == 0 { start_taper } else { SideMask::NONE },
                    end: if is_tunnel_last { end_taper } else { SideMask::NONE },
                },
                start: plan.start,
                end: plan.end,
            };
            let Some(section) = generator.generate(&request) else {
                debug!(?id, segment, "segment skipped");
                continue;
            };

            tunnel.ends.store(segment, section.end(&layout));
            if segment == 0 {
                tunnel.start_ring = Some(section.first_ring.clone());
            }

            let target = MeshTarget::TunnelSegment { tunnel: id, segment };
            let triangles = builder.triangulate(target, &section.mesh);
            let shading = builder.shade(target, &section.mesh, &triangles);
            let triangle_count = triangles.len();
            builder.commit(target, &tunnel.transform, &section.mesh, triangles, shading);

            generated.push(GeneratedSegment {
                tunnel: id,
                segment,
                mesh: section.mesh,
                rings: section.rings,
                triangles: triangle_count,
            });
        }
        debug!(?id, segments = generated.len(), "tunnel regenerated");
        Ok(generated)
    }

    /// Apply an edit to a tunnel path and report what must be rebuilt.
    ///
    /// The free end of a tunnel carrying a junction cannot be moved or
    /// undone.
    pub fn edit_path(&mut self, id: TunnelId, edit: PathEdit) -> Result<EditOutcome> {
        let policy = self.config.editing;
        let tunnel = self.get(id)?;
        if tunnel.junction.is_some() && !matches!(edit, PathEdit::Reset) {
            return Err(NetworkError::JunctionAlreadyAttached(id));
        }

        match edit {
            PathEdit::MoveEnd(position) => self.move_end(id, |_| position),
            PathEdit::DragEnd(delta) => self.move_end(id, |current| current + delta),
            PathEdit::Undo => {
                self.clear_end_link(id);
                let tunnel = self.get_mut(id)?;
                let outcome = match policy.undo(&mut tunnel.path) {
                    UndoOutcome::RemovedLast => EditOutcome {
                        rebuild: None,
                        discarded: tunnel.truncate(),
                    },
                    UndoOutcome::ResetEnd => {
                        let discarded = tunnel.ends.segments().collect();
                        tunnel.ends.clear();
                        tunnel.start_ring = None;
                        EditOutcome {
                            rebuild: Some(RebuildRange::all(tunnel.path.segment_count())),
                            discarded,
                        }
                    }
                    UndoOutcome::Unchanged => EditOutcome::default(),
                };
                debug!(?id, discarded = ?outcome.discarded, "undo");
                Ok(outcome)
            }
            PathEdit::Reset => {
                let tunnel = self.get_mut(id)?;
                let discarded = (0..tunnel.path.segment_count()).collect();
                tunnel.ends.clear();
                tunnel.start_ring = None;
                let rebuild = (!tunnel.path.is_degenerate())
                    .then(|| RebuildRange::all(tunnel.path.segment_count()));
                debug!(?id, "reset");
                Ok(EditOutcome { rebuild, discarded })
            }
        }
    }

    fn move_end(
        &mut self,
        id: TunnelId,
        to: impl FnOnce(Point3) -> Point3,
    ) -> Result<EditOutcome> {
        let policy = self.config.editing;
        let tunnel = self.get_mut(id)?;
        let Some(last) = tunnel.path.last_point().map(|p| p.position) else {
            return Err(NetworkError::DegeneratePath(id));
        };
        let index = tunnel.path.len() - 1;
        tunnel.path.set_position(index, to(last));
        let drag = policy.apply(&mut tunnel.path);
        let discarded = match drag {
            DragOutcome::RemovedPenultimate { .. } => tunnel.truncate(),
            DragOutcome::Inserted { .. } | DragOutcome::Unchanged => Vec::new(),
        };
        let rebuild = (!tunnel.path.is_degenerate())
            .then(|| RebuildRange::after_drag(tunnel.path.segment_count(), tunnel.ends.len()));
        debug!(?id, ?drag, ?rebuild, "end moved");
        Ok(EditOutcome { rebuild, discarded })
    }

    /// Move the free end, snap it, drop removed meshes and rebuild.
    pub fn drag_end(
        &mut self,
        id: TunnelId,
        position: Point3,
        builder: &mut dyn MeshBuilder,
    ) -> Result<DragReport> {
        let outcome = self.edit_path(id, PathEdit::MoveEnd(position))?;
        for &segment in &outcome.discarded {
            builder.discard(MeshTarget::TunnelSegment { tunnel: id, segment });
        }
        let connection = self.try_snap_end(id)?;
        let generated = match outcome.rebuild {
            Some(range) => self.regenerate(id, range, RegenerateOptions::default(), builder)?,
            None => Vec::new(),
        };
        Ok(DragReport {
            outcome,
            connection,
            generated,
        })
    }

    /// Change the cross-section of one segment and rebuild it in place.
    ///
    /// Both boundary rings are replayed from the cache, so the neighbours on
    /// either side stay welded. `segment` counts from the path start and is
    /// clamped to the last segment.
    pub fn resize(
        &mut self,
        id: TunnelId,
        segment: usize,
        shape: SectionShape,
        builder: &mut dyn MeshBuilder,
    ) -> Result<Vec<GeneratedSegment>> {
        let tunnel = self.get_mut(id)?;
        let Some(last) = tunnel.path.segment_count().checked_sub(1) else {
            return Err(NetworkError::DegeneratePath(id));
        };
        let segment = segment.min(last);
        tunnel.segment_shapes.insert(segment, shape);
        debug!(?id, segment, width = shape.width(), "segment resized");
        self.regenerate(
            id,
            RebuildRange::single(last - segment),
            RegenerateOptions {
                single_point_update: true,
            },
            builder,
        )
    }

    /// Remove a tunnel, its meshes and every link pointing at it.
    ///
    /// A junction on its end stays in place without a parent; a junction it
    /// was spawned from forgets it.
    pub fn remove_tunnel(&mut self, id: TunnelId, builder: &mut dyn MeshBuilder) -> Result<()> {
        self.clear_start_link(id);
        self.clear_end_link(id);
        let tunnel = self
            .tunnels
            .remove(id)
            .ok_or(NetworkError::UnknownTunnel(id))?;
        for segment in 0..tunnel.path.segment_count() {
            builder.discard(MeshTarget::TunnelSegment { tunnel: id, segment });
        }
        if let Some(junction) = tunnel.junction.and_then(|j| self.junctions.get_mut(j)) {
            junction.parent = None;
        }
        if let TunnelOrigin::Junction { junction, .. } = tunnel.origin {
            if let Some(junction) = self.junctions.get_mut(junction) {
                junction.children.retain(|(_, child)| *child != id);
            }
        }
        info!(?id, "tunnel removed");
        Ok(())
    }

    /// Attach a junction to a tunnel end and spawn one child tunnel per exit.
    ///
    /// The parent's last segment is rebuilt with its end tapered into the
    /// junction, the junction is walked from that end ring, and every child
    /// starts on its exit ring.
    pub fn add_junction(
        &mut self,
        parent: TunnelId,
        kind: JunctionKind,
        builder: &mut dyn MeshBuilder,
    ) -> Result<JunctionId> {
        let tunnel = self.get(parent)?;
        if tunnel.junction.is_some() {
            return Err(NetworkError::JunctionAlreadyAttached(parent));
        }
        if tunnel.path.is_degenerate() {
            return Err(NetworkError::DegeneratePath(parent));
        }
        let end = tunnel.path.total_length();
        let origin = tunnel
            .transform
            .apply_point(&tunnel.path.position_at_distance(end));
        let heading = tunnel
            .transform
            .apply_vec(&tunnel.path.forward_at_distance(end));
        let transform = Transform::placement(&origin, yaw_of(&heading));
        let shape = tunnel.shape;

        self.clear_end_link(parent);
        let id = self.junctions.insert(Junction {
            kind,
            shape,
            transform,
            parent: Some(parent),
            children: Vec::new(),
            entry: None,
            exits: ExitRings::default(),
        });
        self.get_mut(parent)?.junction = Some(id);
        info!(?parent, junction = ?id, ?kind, "junction attached");

        self.regenerate(
            parent,
            RebuildRange::last(),
            RegenerateOptions::default(),
            builder,
        )?;
        self.regenerate_junction(id, builder)?;

        for exit in kind.exits() {
            let child = self.spawn_child(id, exit)?;
            self.regenerate_all(child, builder)?;
        }
        Ok(id)
    }

    /// Walk a junction again from its parent's current end ring and
    /// republish its exits. Children are not spawned or rebuilt.
    pub fn regenerate_junction(
        &mut self,
        id: JunctionId,
        builder: &mut dyn MeshBuilder,
    ) -> Result<()> {
        let junction = self
            .junctions
            .get(id)
            .ok_or(NetworkError::UnknownJunction(id))?;
        let seed = junction
            .parent
            .and_then(|parent| self.tunnels.get(parent))
            .and_then(|tunnel| {
                let last = tunnel.path.segment_count().checked_sub(1)?;
                let ring = tunnel.ends.get(last)?.to_ring();
                Some(ring.transformed(&Transform::between(&tunnel.transform, &junction.transform)))
            });
        if seed.is_none() {
            debug!(junction = ?id, "no parent end ring, walking from a computed entry");
        }

        let generator = JunctionGenerator::new(
            self.config.layout,
            &self.config.generation,
            self.deformation.as_ref(),
            &self.profiles,
        );
        let Some(output) = generator.generate(&JunctionRequest {
            kind: junction.kind,
            shape: junction.shape,
            seed: seed.as_ref(),
        }) else {
            return Ok(());
        };

        let target = MeshTarget::Junction(id);
        let triangles = builder.triangulate(target, &output.mesh);
        let shading = builder.shade(target, &output.mesh, &triangles);
        builder.commit(target, &junction.transform, &output.mesh, triangles, shading);

        if let Some(junction) = self.junctions.get_mut(id) {
            junction.entry = Some(output.entry);
            junction.exits = output.exits;
        }
        Ok(())
    }

    /// Register a child tunnel leaving a junction through `exit`.
    fn spawn_child(&mut self, id: JunctionId, exit: ExitDirection) -> Result<TunnelId> {
        let junction = self
            .junctions
            .get(id)
            .ok_or(NetworkError::UnknownJunction(id))?;
        let local = junction
            .exits
            .get(exit)
            .and_then(|ring| ring.floor_center())
            .unwrap_or_else(Point3::origin);
        let origin = junction.transform.apply_point(&local);
        let heading = junction
            .transform
            .apply_vec(&rotate_yaw(&Vec3::x(), exit.yaw()));
        let transform = Transform::placement(&origin, yaw_of(&normalize_or_zero(&heading)));
        let child = self.tunnels.insert(Tunnel::new(
            TunnelOrigin::Junction { junction: id, exit },
            transform,
            Path::starter(),
            junction.shape,
        ));
        if let Some(junction) = self.junctions.get_mut(id) {
            junction.children.push((exit, child));
        }
        debug!(junction = ?id, ?exit, ?child, "child tunnel spawned");
        Ok(child)
    }

    /// Ring at one end of a tunnel, in the tunnel's local space.
    pub fn end_ring(&self, id: TunnelId, end: PathEnd) -> Option<Ring> {
        let tunnel = self.tunnels.get(id)?;
        match end {
            PathEnd::Start => tunnel.start_ring.clone(),
            PathEnd::End => {
                let last = tunnel.path.segment_count().checked_sub(1)?;
                tunnel.ends.get(last).map(|end| end.to_ring())
            }
        }
    }
}
