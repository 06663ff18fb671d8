pub mod due_check;
pub mod health;
pub mod history;
pub mod scheduler;
