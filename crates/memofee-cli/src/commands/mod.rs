pub mod list;
pub mod note;
pub mod notes;
pub mod serve;
pub mod subscribe;
pub mod unsubscribe;
