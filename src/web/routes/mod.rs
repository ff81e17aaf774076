pub mod catalog_routes;
pub mod container_routes;
