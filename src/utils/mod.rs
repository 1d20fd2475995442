pub mod collection_ext;
pub mod error;
pub mod scheduled_executor;
pub mod string_ext;

pub use collection_ext::{group_ordered, unique_ordered, vec_to_map};
pub use error::{ApiError, ApiResult};
pub use scheduled_executor::{ScheduledExecutor, ScheduledTask};
pub use string_ext::{StringExt, clean_optional_string};
