mod ids;
mod quad;

pub use ids::{Horizon, NODE_ID_LEN, NodeId, QUAD_KEY_LEN, QuadKey, Ref};
pub use quad::{Direction, Quad};
