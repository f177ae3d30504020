pub mod dispatch;
pub mod registry;

pub use dispatch::{DispatchError, Dispatcher, UpstreamCall};
pub use registry::{descriptors, ToolAccess, ToolRegistry, ToolSpec, CATALOG};
