//! Scene graph
//!
//! A minimal hierarchical scene used by the avatar runtime:
//! - [`Node`]: hierarchy, transform, optional mesh and skin
//! - [`Transform`]: position / rotation / scale with cached matrices
//! - [`Skeleton`]: bone list and joint matrices
//! - [`Scene`]: slot-map storage for nodes, meshes and skeletons
//!
//! Avatar instances live inside a caller-owned [`Scene`]; every entity owns
//! exactly the subtree it instantiated.

pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use node::{Node, NodeFlags};
pub use scene::{PrefabInstance, RemovedSubtree, Scene};
pub use skeleton::Skeleton;
pub use transform::{Transform, TransformChannel};

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct SkeletonKey;
}
