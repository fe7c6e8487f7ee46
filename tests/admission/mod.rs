mod builder;
mod vehicle_entry;
mod venue_reservation;
