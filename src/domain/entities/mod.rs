pub mod api_key;
pub mod attachment;
pub mod comment;
pub mod contact;
pub mod organization;
pub mod team;
pub mod ticket;
pub mod user;

pub use api_key::*;
pub use attachment::*;
pub use comment::*;
pub use contact::*;
pub use organization::*;
pub use team::*;
pub use ticket::*;
pub use user::*;
