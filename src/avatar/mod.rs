//! Avatar entities: instancing, clip state, steering, procedural motion and
//! accessory slots.

pub mod entity;
pub mod motion;
pub mod options;
pub mod oscillator;
pub mod pivots;
pub mod slots;
pub mod state;

pub use entity::{AnimatedEntity, DisposedAvatar, TextureMode};
pub use motion::{MotionController, MotionStep, shortest_angle, smooth_step};
pub use options::{AvatarOptions, MotionTuning};
pub use oscillator::Oscillator;
pub use pivots::{BoneMap, BonePivots, collect_bones, resolve_bone};
pub use slots::{Slot, SlotTable, flutter_rotation};
pub use state::{AnimationStateMachine, AvatarState, CROSSFADE_SECONDS};
