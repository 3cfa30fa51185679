pub mod club;
pub mod discussion;
pub mod leaderboard;
pub mod problem;
pub mod user;

pub use club::*;
pub use discussion::*;
pub use leaderboard::*;
pub use problem::*;
pub use user::*;
