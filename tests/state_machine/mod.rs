mod equipment;
mod store_and_retail;
mod transitions;
mod venue_event;
