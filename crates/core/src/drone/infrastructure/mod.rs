pub mod dry_run_link;
pub mod tello_udp_link;
