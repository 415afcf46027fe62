//! API 서버용 HTTP middleware.
//!
//! 요청 처리 파이프라인에 적용되는 middleware 모듈.

mod execution_time;
mod panic;
mod validate_json;

pub use execution_time::log_execution_time;
pub use panic::handle_panic;
pub use validate_json::{
    check_required_fields, validate_json, ApiPath, ApiQuery, JsonBody, RequiredFields,
};
