pub mod list_drugs_route;
pub mod match_drugs_request;
pub mod match_drugs_route;
