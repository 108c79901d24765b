pub mod generated_contents;
pub mod plans;
pub mod users;
