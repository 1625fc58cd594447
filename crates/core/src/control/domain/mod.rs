pub mod rc_command;
pub mod tracking_config;
pub mod tracking_controller;
