pub mod axis;
pub mod grid;
pub mod interaction;
pub mod item;
pub mod push;
pub mod rows;
pub mod store;

pub use axis::DateAxis;
pub use grid::{GridIndex, GridIntersection};
pub use interaction::{GesturePreview, InputEvent, InteractionController, KeyCommand, PointerTarget};
pub use item::{Badge, Block, ItemId, Milestone};
pub use push::PushPlan;
pub use rows::RowLayout;
pub use store::{ItemPatch, ItemStore};
