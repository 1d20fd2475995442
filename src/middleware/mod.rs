pub mod context;

pub use context::{COMPANY_ID_HEADER, RequestContext, USER_ID_HEADER};
