//! Logistics and route planning.
//!
//! Turns the assignments of a planning pass into executable move commands:
//! plain routes per unit class, amphibious convoys, bombardment moves,
//! transport loading and carrier ordering.

pub mod amphib;
pub mod batch;
pub mod carrier;
pub mod command;
pub mod routes;
pub mod transport;

pub use amphib::calculate_amphib_routes;
pub use batch::{do_move, merge_moves, MoveBatcher};
pub use carrier::{
    air_that_cant_land_on_carrier, carrier_capacity, carrier_must_move_with,
    interleave_carriers_and_planes, unused_carrier_capacity, unused_local_carrier_capacity,
    validate_carrier_capacity,
};
pub use command::{MoveCommand, MovePlan, Unroutable};
pub use routes::{calculate_bombard_routes, calculate_move_routes, sea_route};
pub use transport::{
    check_transport_defense, select_units_to_transport, units_to_transport_from_territories,
};
