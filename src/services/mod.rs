pub mod execution_service;
pub mod grading_service;
pub mod question_service;
pub mod selector_service;
pub mod stats_service;
