#![warn(missing_docs)]

//! Cross-section generation for burrow tunnels.
//!
//! A tunnel segment is meshed by walking its path in fixed steps and, at
//! every step, walking once around a ring of floor, right wall, roof and left
//! wall vertices. [`SectionGenerator`] does the walk; [`seam::plan`] and
//! [`SegmentEndCache`] decide when a boundary ring is replayed from an earlier
//! segment or borrowed from a neighbour so that neighbouring meshes share
//! their boundary vertices exactly.
//!
//! # Example
//!
//! ```
//! use burrow_math::Point3;
//! use burrow_path::Path;
//! use burrow_section::{
//!     FlatField, GenerationSettings, KeyedProfiles, RingLayout, RingSource, SectionGenerator,
//!     SectionShape, SegmentRequest, TaperPlan,
//! };
//!
//! let path = Path::from_positions(&[Point3::origin(), Point3::new(200.0, 0.0, 0.0)]);
//! let settings = GenerationSettings::default();
//! let profiles = KeyedProfiles::default();
//! let generator = SectionGenerator::new(RingLayout::new(9, 6), &settings, &FlatField, &profiles);
//! let section = generator
//!     .generate(&SegmentRequest {
//!         path: &path,
//!         segment: 0,
//!         shape: SectionShape::default(),
//!         taper: TaperPlan::default(),
//!         start: RingSource::Fresh,
//!         end: RingSource::Fresh,
//!     })
//!     .unwrap();
//! assert_eq!(section.rings, 5);
//! assert!(section.last_ring.is_closed());
//! ```

mod cache;
mod context;
mod deform;
mod generator;
mod layout;
mod ring;
pub mod seam;
mod settings;

pub use cache::SegmentEndCache;
pub use context::floor_sign;
pub use deform::{
    noise_column, DeformationSource, FlatField, KeyedCurve, KeyedProfiles, NoiseField,
    ProfileCurve, ProfileSource,
};
pub use generator::{GeneratedSection, SectionGenerator, SegmentRequest};
pub use layout::{RingLayout, Surface};
pub use ring::{ExitRing, GridPatch, Ring, SectionMesh, SegmentEnd};
pub use seam::{RingSource, SeamPlan, SeamQuery};
pub use settings::{
    GenerationSettings, SectionShape, SideMask, SignMode, TaperPlan, UNITS_PER_SCALE,
};
