pub mod notifier;
pub mod telegram;
