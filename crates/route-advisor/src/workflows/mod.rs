pub mod reroute;
