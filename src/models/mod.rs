pub mod user;
pub mod hall;
pub mod movie;
pub mod showtime;

pub use user::{Role, User};
pub use hall::{Hall, NewHall};
pub use movie::{Movie, NewMovie};
pub use showtime::{MovieShowtime, NewShowtime, Showtime, ShowtimeListing, MAX_PRICE};
