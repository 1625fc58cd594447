pub mod drone_link;
pub mod flight_session;
