pub mod face_detector;
pub mod target_annotator;
pub mod target_selector;
