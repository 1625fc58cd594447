pub mod face_tracker;
pub mod pipeline_logger;
pub mod track_face_use_case;
