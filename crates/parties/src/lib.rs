//! Customers of the print shop (event-sourced).
//!
//! Deterministic domain logic only; persistence and transport live in infra.

pub mod customer;

pub use customer::{
    ContactInfo, Customer, CustomerCommand, CustomerDetailsUpdated, CustomerEvent, CustomerId,
    CustomerRegistered, RegisterCustomer, UpdateCustomerDetails,
};
