pub mod customer;
pub mod integration;
pub mod message;
pub mod phone_call;
pub mod tag;
pub mod tenant;
pub mod ticket;
pub mod user;

pub use customer::Customer;
pub use integration::Integration;
pub use message::Message;
pub use phone_call::PhoneCall;
pub use tag::Tag;
pub use tenant::Tenant;
pub use ticket::Ticket;
pub use user::User;
