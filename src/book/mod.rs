//! Order book derived from the exchange's raw price-volume nodes.

pub mod index;
pub mod projection;

pub use index::find_or_create;
pub use projection::{ActiveOrderRow, Ladder, LadderRow, project, project_active_order};
