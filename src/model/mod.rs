pub mod attachment;
pub mod card;
pub mod checklist;
pub mod comment;

pub use attachment::CardFile;
pub use card::{Board, Card, CardStatus, CardType, Column, Lane, Member, Space, User};
pub use checklist::{Checklist, ChecklistItem};
pub use comment::Comment;
